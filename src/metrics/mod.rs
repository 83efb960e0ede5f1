//! Host metrics collection and exposition for Prometheus.
//!
//! [`HostRegistry`] owns the gauges, [`Collector`] refreshes them from a
//! [`HostProbe`](crate::probe::HostProbe), and [`Exporter`] serializes scrapes
//! over a shared collector.

mod collector;
mod exporter;
mod registry;
mod report;

pub use collector::{Collector, CollectorSettings, DiskTotals, aggregate_disks};
pub use exporter::{Exporter, ScrapeError};
pub use registry::{HostRegistry, PARTITION_LABEL, RegistryError};
pub use report::{CycleReport, FamilyFailure, MetricFamily};

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
