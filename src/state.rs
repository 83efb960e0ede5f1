//! Shared application state.

use crate::metrics::Exporter;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Collector and registry, serialized behind a lock.
    pub exporter: Arc<Exporter>,
}

impl AppState {
    pub fn new(exporter: Exporter) -> Self {
        AppState {
            exporter: Arc::new(exporter),
        }
    }
}
