//! Host counter sampling.
//!
//! [`HostProbe`] is the single seam through which OS counters are read. The
//! production implementation is [`SysinfoProbe`]; [`fake::ScriptedProbe`]
//! stands in for it in tests.

pub mod fake;
pub mod procfs;
mod sysinfo_probe;

pub use sysinfo_probe::SysinfoProbe;

use std::path::PathBuf;
use std::time::Duration;

/// Errors raised while querying the host.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },
    #[error("{0} is not available on this host")]
    Unavailable(String),
}

/// One CPU reading taken over a real interval.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CpuSample {
    pub per_core: Vec<f64>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemorySample {
    pub used_percent: f64,
    pub total_bytes: u64,
    pub swap_used_percent: f64,
}

/// Usage of one mounted filesystem.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionSample {
    pub mount_point: PathBuf,
    pub total_bytes: u64,
    pub used_percent: f64,
}

impl PartitionSample {
    pub fn new(mount_point: impl Into<PathBuf>, total_bytes: u64, used_percent: f64) -> Self {
        PartitionSample {
            mount_point: mount_point.into(),
            total_bytes,
            used_percent,
        }
    }

    /// Mount point as text, lossy for non UTF-8 paths.
    pub fn mount_str(&self) -> String {
        self.mount_point.to_string_lossy().into_owned()
    }
}

/// Cumulative disk counters since boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiskIoSample {
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub read_count: u64,
    pub write_count: u64,
}

/// Cumulative network counters since boot, summed over all interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkIoSample {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub errin: u64,
    pub errout: u64,
    pub dropin: u64,
    pub dropout: u64,
}

/// Source of raw OS readings.
pub trait HostProbe: Send + 'static {
    /// Number of logical cores currently visible.
    fn core_count(&mut self) -> Result<usize, ProbeError>;

    /// Samples CPU usage. Blocks for `interval` so the reading spans a real
    /// window instead of an instantaneous value.
    fn cpu(&mut self, interval: Duration) -> Result<CpuSample, ProbeError>;

    fn memory(&mut self) -> Result<MemorySample, ProbeError>;

    /// Currently mounted partitions, enumerated fresh on every call.
    fn partitions(&mut self) -> Result<Vec<PartitionSample>, ProbeError>;

    fn disk_io(&mut self) -> Result<DiskIoSample, ProbeError>;

    fn network_io(&mut self) -> Result<NetworkIoSample, ProbeError>;
}

/// `used / total * 100`, rounded to one decimal. A zero total reads as 0.
pub fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = used as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}
