//! HTTP request handlers, grouped by resource.

pub mod conversations;
pub mod health;
pub mod messages;
pub mod profiles;
pub mod reactions;
pub mod websocket;
