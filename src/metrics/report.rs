use std::fmt;
use std::time::Duration;

use crate::probe::ProbeError;

/// The groups of gauges refreshed by one collection step, in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricFamily {
    Cpu,
    Memory,
    Disk,
    DiskIo,
    Network,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 5] = [
        MetricFamily::Cpu,
        MetricFamily::Memory,
        MetricFamily::Disk,
        MetricFamily::DiskIo,
        MetricFamily::Network,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricFamily::Cpu => "cpu",
            MetricFamily::Memory => "memory",
            MetricFamily::Disk => "disk",
            MetricFamily::DiskIo => "disk_io",
            MetricFamily::Network => "network",
        }
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct FamilyFailure {
    pub family: MetricFamily,
    pub error: ProbeError,
}

/// Outcome of one collection cycle. A cycle stops at its first failing
/// family, so at most one failure is ever reported.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub completed: Vec<MetricFamily>,
    pub failure: Option<FamilyFailure>,
    pub duration: Duration,
}

impl CycleReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Families that were not attempted because an earlier one failed. The
    /// failed family itself is not included.
    pub fn skipped(&self) -> Vec<MetricFamily> {
        let Some(failure) = &self.failure else {
            return Vec::new();
        };
        MetricFamily::ALL
            .iter()
            .skip_while(|f| **f != failure.family)
            .skip(1)
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_lists_families_after_the_failure() {
        let report = CycleReport {
            completed: vec![MetricFamily::Cpu, MetricFamily::Memory],
            failure: Some(FamilyFailure {
                family: MetricFamily::Disk,
                error: ProbeError::Unavailable("disks".to_string()),
            }),
            duration: Duration::ZERO,
        };

        assert!(!report.is_success());
        assert_eq!(
            report.skipped(),
            vec![MetricFamily::DiskIo, MetricFamily::Network]
        );
    }

    #[test]
    fn successful_cycle_skips_nothing() {
        let report = CycleReport {
            completed: MetricFamily::ALL.to_vec(),
            ..CycleReport::default()
        };
        assert!(report.is_success());
        assert!(report.skipped().is_empty());
    }
}
