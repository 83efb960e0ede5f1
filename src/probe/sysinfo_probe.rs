use std::thread;
use std::time::Duration;

use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, RefreshKind, System};

use super::{
    CpuSample, DiskIoSample, HostProbe, MemorySample, NetworkIoSample, PartitionSample, ProbeError,
    percent,
};

/// Reads the live host through `sysinfo`, and through `/proc` on Linux for
/// the counters `sysinfo` does not expose (operation counts, drops).
pub struct SysinfoProbe {
    system: System,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
                .with_memory(MemoryRefreshKind::everything()),
        );
        SysinfoProbe { system }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        SysinfoProbe::new()
    }
}

fn round1(value: f32) -> f64 {
    (f64::from(value) * 10.0).round() / 10.0
}

impl HostProbe for SysinfoProbe {
    fn core_count(&mut self) -> Result<usize, ProbeError> {
        match self.system.cpus().len() {
            0 => Err(ProbeError::Unavailable("logical CPU list".to_string())),
            n => Ok(n),
        }
    }

    fn cpu(&mut self, interval: Duration) -> Result<CpuSample, ProbeError> {
        // Usage is the delta between two refreshes, so the wait is the
        // measurement window.
        self.system.refresh_cpu_usage();
        thread::sleep(interval.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
        self.system.refresh_cpu_usage();

        let per_core: Vec<f64> = self
            .system
            .cpus()
            .iter()
            .map(|cpu| round1(cpu.cpu_usage()))
            .collect();
        if per_core.is_empty() {
            return Err(ProbeError::Unavailable("CPU usage".to_string()));
        }

        Ok(CpuSample {
            per_core,
            total: round1(self.system.global_cpu_usage()),
        })
    }

    fn memory(&mut self) -> Result<MemorySample, ProbeError> {
        self.system.refresh_memory();

        let total = self.system.total_memory();
        if total == 0 {
            return Err(ProbeError::Unavailable("memory statistics".to_string()));
        }
        let available = self.system.available_memory();

        Ok(MemorySample {
            used_percent: percent(total.saturating_sub(available), total),
            total_bytes: total,
            swap_used_percent: percent(self.system.used_swap(), self.system.total_swap()),
        })
    }

    fn partitions(&mut self) -> Result<Vec<PartitionSample>, ProbeError> {
        let disks = Disks::new_with_refreshed_list();
        Ok(disks
            .list()
            .iter()
            .map(|disk| {
                partition_sample(disk.mount_point(), disk.total_space(), disk.available_space())
            })
            .collect())
    }

    fn disk_io(&mut self) -> Result<DiskIoSample, ProbeError> {
        read_disk_io()
    }

    fn network_io(&mut self) -> Result<NetworkIoSample, ProbeError> {
        read_network_io()
    }
}

/// Blocks reserved for root count as used, since sysinfo only reports the
/// space available to unprivileged users. On ext4 this reads higher than
/// `df`, which leaves the reserve out of the denominator.
fn partition_sample(mount_point: &std::path::Path, total: u64, available: u64) -> PartitionSample {
    let used = total.saturating_sub(available);
    PartitionSample::new(mount_point, total, percent(used, total))
}

#[cfg(target_os = "linux")]
fn read_proc(path: &str) -> Result<String, ProbeError> {
    std::fs::read_to_string(path).map_err(|source| ProbeError::Io {
        path: path.into(),
        source,
    })
}

#[cfg(target_os = "linux")]
fn read_disk_io() -> Result<DiskIoSample, ProbeError> {
    use super::procfs::DISKSTATS_PATH;

    disk_io_from(&read_proc(DISKSTATS_PATH)?, std::path::Path::new("/sys/block"))
}

/// Whole devices have an entry under `sys_block`, partitions do not.
#[cfg(target_os = "linux")]
fn disk_io_from(diskstats: &str, sys_block: &std::path::Path) -> Result<DiskIoSample, ProbeError> {
    use super::procfs::{parse_diskstats, sum_disk_io};

    let lines = parse_diskstats(diskstats)?;
    Ok(sum_disk_io(&lines, |device| {
        sys_block.join(device.replace('/', "!")).exists()
    }))
}

#[cfg(not(target_os = "linux"))]
fn read_disk_io() -> Result<DiskIoSample, ProbeError> {
    let disks = Disks::new_with_refreshed_list();
    Ok(disks
        .list()
        .iter()
        .fold(DiskIoSample::default(), |mut acc, disk| {
            let usage = disk.usage();
            acc.read_bytes += usage.total_read_bytes;
            acc.write_bytes += usage.total_written_bytes;
            acc
        }))
}

#[cfg(target_os = "linux")]
fn read_network_io() -> Result<NetworkIoSample, ProbeError> {
    use super::procfs::{NET_DEV_PATH, parse_net_dev, sum_network};

    let lines = parse_net_dev(&read_proc(NET_DEV_PATH)?)?;
    Ok(sum_network(&lines))
}

#[cfg(not(target_os = "linux"))]
fn read_network_io() -> Result<NetworkIoSample, ProbeError> {
    let networks = sysinfo::Networks::new_with_refreshed_list();
    Ok(networks
        .list()
        .values()
        .fold(NetworkIoSample::default(), |mut acc, data| {
            acc.bytes_recv += data.total_received();
            acc.bytes_sent += data.total_transmitted();
            acc.packets_recv += data.total_packets_received();
            acc.packets_sent += data.total_packets_transmitted();
            acc.errin += data.total_errors_on_received();
            acc.errout += data.total_errors_on_transmitted();
            acc
        }))
}
