//! Host platform capabilities.
//!
//! Everything that differs between POSIX and Windows hosts sits behind the
//! [`Platform`] trait: how mount paths become metric name fragments, which
//! mount is the system root, and what extra session telemetry gets logged.
//! The implementation is picked once at startup by [`detect`].

mod posix;
mod windows;

pub use posix::Posix;
pub use windows::{BatteryReading, Windows, read_batteries};

use std::path::Path;
use std::sync::Arc;

/// OS-specific behavior selected once per process.
pub trait Platform: Send + Sync + 'static {
    /// Short name used in startup logs.
    fn name(&self) -> &'static str;

    /// Maps a raw mount path to a token usable inside a metric name.
    fn sanitize(&self, raw_path: &str) -> String;

    /// Whether `mount_point` is the root/system volume of this host.
    fn is_root_mount(&self, mount_point: &Path) -> bool;

    /// Logs platform-only telemetry (user sessions). Never touches gauges.
    fn log_session_telemetry(&self) {}
}

/// Returns the platform implementation matching the running host.
pub fn detect() -> Arc<dyn Platform> {
    if cfg!(windows) {
        Arc::new(Windows::from_env())
    } else {
        Arc::new(Posix)
    }
}

/// Drops trailing separators so `C:\` and `C:` compare equal. A bare root
/// (`/` or `\`) is kept as is.
pub(crate) fn trim_trailing_separators(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() && !path.is_empty() {
        &path[..1]
    } else {
        trimmed
    }
}
