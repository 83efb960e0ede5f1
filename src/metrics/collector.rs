//! Per-scrape collection cycle.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use super::registry::{HostRegistry, RegistryError};
use super::report::{CycleReport, FamilyFailure, MetricFamily};
use crate::config::{CollectorConfig, DiskAggregation};
use crate::platform::Platform;
use crate::probe::{HostProbe, PartitionSample, ProbeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorSettings {
    pub cpu_sample_interval: Duration,
    pub disk_aggregation: DiskAggregation,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        CollectorSettings::from(&CollectorConfig::default())
    }
}

impl From<&CollectorConfig> for CollectorSettings {
    fn from(config: &CollectorConfig) -> Self {
        CollectorSettings {
            cpu_sample_interval: Duration::from_millis(config.cpu_sample_interval_ms),
            disk_aggregation: config.disk_aggregation,
        }
    }
}

/// Aggregate disk figures for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DiskTotals {
    pub size_bytes: u64,
    pub usage_percent: f64,
}

/// Folds per-partition readings into the two total gauges.
///
/// `Root` reports the root mount alone, or zeros when it is missing.
/// `Averaged` sums sizes and takes the mean usage capped at 100; no
/// partitions yields zeros.
pub fn aggregate_disks(
    policy: DiskAggregation,
    partitions: &[PartitionSample],
    platform: &dyn Platform,
) -> DiskTotals {
    match policy {
        DiskAggregation::Root => partitions
            .iter()
            .find(|p| platform.is_root_mount(&p.mount_point))
            .map(|root| DiskTotals {
                size_bytes: root.total_bytes,
                usage_percent: root.used_percent,
            })
            .unwrap_or_default(),
        DiskAggregation::Averaged => {
            if partitions.is_empty() {
                return DiskTotals::default();
            }
            let size_bytes = partitions.iter().map(|p| p.total_bytes).sum();
            let mean =
                partitions.iter().map(|p| p.used_percent).sum::<f64>() / partitions.len() as f64;
            DiskTotals {
                size_bytes,
                usage_percent: mean.min(100.0),
            }
        }
    }
}

/// Refreshes a [`HostRegistry`] from a [`HostProbe`].
pub struct Collector {
    registry: HostRegistry,
    probe: Box<dyn HostProbe>,
    platform: Arc<dyn Platform>,
    settings: CollectorSettings,
}

impl Collector {
    /// Builds the registry from the probe's current topology.
    pub fn new(
        platform: Arc<dyn Platform>,
        mut probe: Box<dyn HostProbe>,
        settings: CollectorSettings,
    ) -> Result<Self, RegistryError> {
        let registry = HostRegistry::new(platform.as_ref(), probe.as_mut())?;
        info!(
            cores = registry.core_slots(),
            partitions = registry.partition_tokens().len(),
            aggregation = ?settings.disk_aggregation,
            "Registered host gauges"
        );
        Ok(Collector {
            registry,
            probe,
            platform,
            settings,
        })
    }

    pub fn registry(&self) -> &HostRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    /// Runs one cycle. Families are collected in order; the first failure is
    /// logged and ends the cycle, leaving the remaining gauges at their
    /// previous values.
    pub fn collect(&mut self) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport::default();

        for family in MetricFamily::ALL {
            match self.collect_family(family) {
                Ok(()) => report.completed.push(family),
                Err(error) => {
                    error!(family = %family, error = %error, "Error collecting metrics: {}", error);
                    report.failure = Some(FamilyFailure { family, error });
                    break;
                }
            }
        }

        report.duration = started.elapsed();
        debug!(
            completed = report.completed.len(),
            elapsed_ms = report.duration.as_millis() as u64,
            "Collection cycle finished"
        );
        report
    }

    fn collect_family(&mut self, family: MetricFamily) -> Result<(), ProbeError> {
        match family {
            MetricFamily::Cpu => self.collect_cpu(),
            MetricFamily::Memory => self.collect_memory(),
            MetricFamily::Disk => self.collect_disk(),
            MetricFamily::DiskIo => self.collect_disk_io(),
            MetricFamily::Network => self.collect_network(),
        }
    }

    fn collect_cpu(&mut self) -> Result<(), ProbeError> {
        let sample = self.probe.cpu(self.settings.cpu_sample_interval)?;
        self.registry.record_cpu(&sample);
        info!(
            cores = sample.per_core.len(),
            total = sample.total,
            "Collected CPU metrics: {:?}, Total CPU usage: {}%",
            sample.per_core,
            sample.total
        );
        Ok(())
    }

    fn collect_memory(&mut self) -> Result<(), ProbeError> {
        let sample = self.probe.memory()?;
        self.registry.record_memory(&sample);
        info!(
            "Collected Memory metrics: {}% used, Total Installed Memory: {} bytes",
            sample.used_percent, sample.total_bytes
        );
        info!("Collected Swap metrics: {}% used", sample.swap_used_percent);
        Ok(())
    }

    fn collect_disk(&mut self) -> Result<(), ProbeError> {
        let partitions = self.probe.partitions()?;
        for partition in &partitions {
            let token = self.platform.sanitize(&partition.mount_str());
            if !self.registry.record_partition(&token, partition.used_percent) {
                debug!(
                    mountpoint = %partition.mount_point.display(),
                    "Ignoring partition mounted after startup"
                );
            }
        }

        let totals = aggregate_disks(
            self.settings.disk_aggregation,
            &partitions,
            self.platform.as_ref(),
        );
        self.registry
            .record_disk_totals(totals.size_bytes, totals.usage_percent);
        info!(
            partitions = partitions.len(),
            "Total Disk Size: {} bytes, Total Disk Usage: {}% used",
            totals.size_bytes,
            totals.usage_percent
        );
        Ok(())
    }

    fn collect_disk_io(&mut self) -> Result<(), ProbeError> {
        let io = self.probe.disk_io()?;
        self.registry.record_disk_io(&io);
        info!(
            read_count = io.read_count,
            write_count = io.write_count,
            "Collected Disk I/O metrics: read {} bytes, wrote {} bytes",
            io.read_bytes,
            io.write_bytes
        );
        Ok(())
    }

    fn collect_network(&mut self) -> Result<(), ProbeError> {
        let net = self.probe.network_io()?;
        self.registry.record_network_io(&net);
        info!(
            packets_sent = net.packets_sent,
            packets_recv = net.packets_recv,
            "Collected Network metrics: {} bytes sent, {} bytes received",
            net.bytes_sent,
            net.bytes_recv
        );
        Ok(())
    }
}
