// This module re-exports important pieces for convenience,
// so we can "use crate::config::*" easily.
pub mod collector;
pub mod config;
pub mod logging;

pub use collector::*;
pub use config::*;
pub use logging::*;
