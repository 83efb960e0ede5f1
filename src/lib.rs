//! Library exports for hostmetrics, shared between the binary and tests.

pub mod config;
pub mod metrics;
pub mod platform;
pub mod probe;
pub mod routes;
pub mod startup;
pub mod state;
pub mod utils;
