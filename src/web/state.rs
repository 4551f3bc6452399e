//! Shared application state for the web boundary.

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::lifecycle::SharedEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: SharedEngine,
    pub ws_connection_count: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(engine: SharedEngine) -> Self {
        Self {
            engine,
            ws_connection_count: Arc::new(AtomicUsize::new(0)),
        }
    }
}
