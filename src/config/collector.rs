use serde::{Deserialize, Serialize};

/// How the per-partition readings fold into `total_disk_size` and
/// `total_disk_usage`. One policy holds for the whole process lifetime.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiskAggregation {
    /// Totals come from the root/system mount only.
    #[default]
    Root,
    /// Sizes are summed; usage is the mean over mounts, capped at 100.
    Averaged,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CollectorConfig {
    /// Length of the CPU measurement window. Must be non-zero.
    #[serde(default = "default_cpu_sample_interval_ms")]
    pub cpu_sample_interval_ms: u64,
    #[serde(default)]
    pub disk_aggregation: DiskAggregation,
}

fn default_cpu_sample_interval_ms() -> u64 {
    1000
}

impl Default for CollectorConfig {
    fn default() -> Self {
        CollectorConfig {
            cpu_sample_interval_ms: default_cpu_sample_interval_ms(),
            disk_aggregation: DiskAggregation::default(),
        }
    }
}
