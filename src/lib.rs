//! mirage: a local social-messaging simulator.
//!
//! A persistent conversation store with a scripted counterparty: messages
//! are marked seen on a timer, and AI-enabled conversations answer back
//! through a pluggable reply generator.

pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod reply;
pub mod repository;
pub mod seed;
pub mod store;
pub mod web;
