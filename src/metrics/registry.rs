//! Gauge set backed by a Prometheus registry.

use std::collections::HashMap;

use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder, register_gauge_with_registry};
use tracing::{debug, warn};

use crate::platform::Platform;
use crate::probe::{CpuSample, DiskIoSample, HostProbe, MemorySample, NetworkIoSample, ProbeError};

/// Constant label carried by every per-partition gauge.
pub const PARTITION_LABEL: &str = "mountpoint";
const PARTITION_HELP: &str = "Disk usage percentage for a mounted partition";

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to enumerate CPU cores: {0}")]
    Cores(#[source] ProbeError),
    #[error("no CPU cores detected")]
    NoCores,
    #[error("failed to enumerate mounted partitions: {0}")]
    Partitions(#[source] ProbeError),
    #[error("failed to register gauge {name}: {source}")]
    Register {
        name: String,
        #[source]
        source: prometheus::Error,
    },
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<Gauge, RegistryError> {
    register_gauge_with_registry!(name, help, registry).map_err(|source| RegistryError::Register {
        name: name.to_string(),
        source,
    })
}

struct DiskIoGauges {
    read_bytes: Gauge,
    write_bytes: Gauge,
    read_count: Gauge,
    write_count: Gauge,
}

impl DiskIoGauges {
    fn new(registry: &Registry) -> Result<Self, RegistryError> {
        Ok(DiskIoGauges {
            read_bytes: gauge(registry, "disk_io_read_bytes", "Disk I/O read bytes")?,
            write_bytes: gauge(registry, "disk_io_write_bytes", "Disk I/O write bytes")?,
            read_count: gauge(registry, "disk_io_read_count", "Disk I/O read count")?,
            write_count: gauge(registry, "disk_io_write_count", "Disk I/O write count")?,
        })
    }
}

struct NetworkGauges {
    bytes_sent: Gauge,
    bytes_recv: Gauge,
    packets_sent: Gauge,
    packets_recv: Gauge,
    errin: Gauge,
    errout: Gauge,
    dropin: Gauge,
    dropout: Gauge,
}

impl NetworkGauges {
    fn new(registry: &Registry) -> Result<Self, RegistryError> {
        Ok(NetworkGauges {
            bytes_sent: gauge(registry, "network_bytes_sent", "Bytes sent over network")?,
            bytes_recv: gauge(registry, "network_bytes_recv", "Bytes received over network")?,
            packets_sent: gauge(registry, "network_packets_sent", "Packets sent over network")?,
            packets_recv: gauge(
                registry,
                "network_packets_recv",
                "Packets received over network",
            )?,
            errin: gauge(registry, "network_errin", "Network input errors")?,
            errout: gauge(registry, "network_errout", "Network output errors")?,
            dropin: gauge(registry, "network_dropin", "Network input drops")?,
            dropout: gauge(registry, "network_dropout", "Network output drops")?,
        })
    }
}

/// All host gauges, created once from the topology seen at startup.
///
/// The set of per-core and per-partition gauges is fixed here; cores or
/// mounts that appear later are not exported until restart.
pub struct HostRegistry {
    registry: Registry,

    // CPU
    cpu_cores: Vec<Gauge>,
    total_cpu: Gauge,
    core_count: Gauge,

    // Memory
    memory: Gauge,
    total_memory: Gauge,
    memory_installed: Gauge,
    swap: Gauge,

    // Disk, keyed by sanitized mount token
    partitions: HashMap<String, Gauge>,
    total_disk_usage: Gauge,
    total_disk_size: Gauge,

    disk_io: DiskIoGauges,
    network: NetworkGauges,
}

impl HostRegistry {
    /// Enumerates cores and partitions through `probe` and registers every
    /// gauge. Failing to enumerate either is fatal.
    pub fn new(platform: &dyn Platform, probe: &mut dyn HostProbe) -> Result<Self, RegistryError> {
        let registry = Registry::new();

        let cores = probe.core_count().map_err(RegistryError::Cores)?;
        if cores == 0 {
            return Err(RegistryError::NoCores);
        }
        let cpu_cores = (0..cores)
            .map(|i| {
                gauge(
                    &registry,
                    &format!("cpu_usage_{i}"),
                    &format!("CPU usage for core {i}"),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let total_cpu = gauge(&registry, "total_cpu_usage", "Total CPU usage percentage")?;
        let core_count = gauge(&registry, "cpu_core_count", "Number of CPU cores")?;

        let memory = gauge(&registry, "memory_usage", "Memory usage percentage")?;
        let total_memory = gauge(
            &registry,
            "total_memory_usage",
            "Total memory usage percentage",
        )?;
        let memory_installed = gauge(
            &registry,
            "total_memory_installed",
            "Total installed memory in bytes",
        )?;
        let swap = gauge(&registry, "swap_usage", "Swap usage percentage")?;

        let mounts = probe.partitions().map_err(RegistryError::Partitions)?;
        let mut partitions = HashMap::new();
        let mut owners: HashMap<String, String> = HashMap::new();
        for mount in mounts {
            let raw = mount.mount_str();
            let token = platform.sanitize(&raw);
            let name = format!("disk_usage_{token}");

            let opts = Opts::new(name.as_str(), PARTITION_HELP)
                .const_label(PARTITION_LABEL, raw.as_str());
            let partition_gauge = match Gauge::with_opts(opts) {
                Ok(g) => g,
                Err(e) => {
                    warn!(
                        mountpoint = %raw,
                        error = %e,
                        "Skipping partition with unusable metric name {}",
                        name
                    );
                    continue;
                }
            };
            match registry.register(Box::new(partition_gauge.clone())) {
                Ok(()) => {}
                Err(prometheus::Error::AlreadyReg) => {
                    debug!(mountpoint = %raw, "Partition listed twice, keeping the first gauge");
                    continue;
                }
                Err(source) => return Err(RegistryError::Register { name, source }),
            }

            // Distinct paths can share a token. The later mount takes over
            // the slot; the earlier series stays exported but is no longer
            // updated.
            if let Some(previous) = owners.insert(token.clone(), raw.clone()) {
                warn!(
                    token = %token,
                    previous = %previous,
                    mountpoint = %raw,
                    "Mount points {} and {} share metric {}; only the latter is updated",
                    previous,
                    raw,
                    name
                );
            }
            partitions.insert(token, partition_gauge);
        }

        let total_disk_usage = gauge(&registry, "total_disk_usage", "Total disk usage percentage")?;
        let total_disk_size = gauge(&registry, "total_disk_size", "Total disk size in bytes")?;

        Ok(HostRegistry {
            disk_io: DiskIoGauges::new(&registry)?,
            network: NetworkGauges::new(&registry)?,
            registry,
            cpu_cores,
            total_cpu,
            core_count,
            memory,
            total_memory,
            memory_installed,
            swap,
            partitions,
            total_disk_usage,
            total_disk_size,
        })
    }

    /// Cores beyond the startup topology are dropped; the core count gauge
    /// still reports what was sampled.
    pub fn record_cpu(&self, sample: &CpuSample) {
        for (core, usage) in self.cpu_cores.iter().zip(&sample.per_core) {
            core.set(*usage);
        }
        self.total_cpu.set(sample.total);
        self.core_count.set(sample.per_core.len() as f64);
    }

    /// `memory_usage` and `total_memory_usage` both carry the used share.
    pub fn record_memory(&self, sample: &MemorySample) {
        self.memory.set(sample.used_percent);
        self.total_memory.set(sample.used_percent);
        self.memory_installed.set(sample.total_bytes as f64);
        self.swap.set(sample.swap_used_percent);
    }

    /// Returns false when no gauge exists for `token`.
    pub fn record_partition(&self, token: &str, used_percent: f64) -> bool {
        match self.partitions.get(token) {
            Some(g) => {
                g.set(used_percent);
                true
            }
            None => false,
        }
    }

    /// Sets `total_disk_size` in bytes and `total_disk_usage` as a percentage,
    /// both already aggregated by the configured disk policy.
    pub fn record_disk_totals(&self, size_bytes: u64, usage_percent: f64) {
        self.total_disk_size.set(size_bytes as f64);
        self.total_disk_usage.set(usage_percent);
    }

    /// Copies cumulative disk counters since boot. Bytes and operation
    /// counts are exported as-is, never as rates.
    pub fn record_disk_io(&self, sample: &DiskIoSample) {
        self.disk_io.read_bytes.set(sample.read_bytes as f64);
        self.disk_io.write_bytes.set(sample.write_bytes as f64);
        self.disk_io.read_count.set(sample.read_count as f64);
        self.disk_io.write_count.set(sample.write_count as f64);
    }

    /// Copies cumulative counters summed over every interface, loopback
    /// included.
    pub fn record_network_io(&self, sample: &NetworkIoSample) {
        let n = &self.network;
        n.bytes_sent.set(sample.bytes_sent as f64);
        n.bytes_recv.set(sample.bytes_recv as f64);
        n.packets_sent.set(sample.packets_sent as f64);
        n.packets_recv.set(sample.packets_recv as f64);
        n.errin.set(sample.errin as f64);
        n.errout.set(sample.errout as f64);
        n.dropin.set(sample.dropin as f64);
        n.dropout.set(sample.dropout as f64);
    }

    /// Number of per-core gauges created at startup.
    pub fn core_slots(&self) -> usize {
        self.cpu_cores.len()
    }

    pub fn cpu_core(&self, index: usize) -> Option<f64> {
        self.cpu_cores.get(index).map(Gauge::get)
    }

    /// Current value of the gauge behind a partition token.
    pub fn partition(&self, token: &str) -> Option<f64> {
        self.partitions.get(token).map(Gauge::get)
    }

    pub fn partition_tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.partitions.keys().map(String::as_str).collect();
        tokens.sort_unstable();
        tokens
    }

    /// Value of the first series named `name`, as a scrape would see it.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.registry
            .gather()
            .iter()
            .find(|family| family.get_name() == name)
            .and_then(|family| family.get_metric().first())
            .map(|metric| metric.get_gauge().get_value())
    }

    /// Renders all gauges in Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
