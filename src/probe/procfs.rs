//! Parsers for the Linux `/proc` counter files.
//!
//! Pure functions over file contents so they can be tested with fixture
//! strings; [`SysinfoProbe`](super::SysinfoProbe) does the actual reads.

use super::{DiskIoSample, NetworkIoSample, ProbeError};

pub const DISKSTATS_PATH: &str = "/proc/diskstats";
pub const NET_DEV_PATH: &str = "/proc/net/dev";

/// Linux always reports diskstats sectors in 512-byte units.
const SECTOR_SIZE: u64 = 512;

/// One line of `/proc/diskstats`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiskStatsLine {
    pub device: String,
    pub reads: u64,
    pub read_sectors: u64,
    pub writes: u64,
    pub write_sectors: u64,
}

/// One interface from `/proc/net/dev`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NetDevLine {
    pub interface: String,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errs: u64,
    pub rx_drop: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errs: u64,
    pub tx_drop: u64,
}

fn field(values: &[&str], idx: usize, file: &str, name: &str) -> Result<u64, ProbeError> {
    let raw = values.get(idx).ok_or_else(|| ProbeError::Parse {
        file: file.to_string(),
        message: format!("missing column {idx} for {name}"),
    })?;
    raw.parse().map_err(|_| ProbeError::Parse {
        file: file.to_string(),
        message: format!("column {idx} for {name} is not a counter: {raw:?}"),
    })
}

/// Parses `/proc/diskstats`.
///
/// Format: `major minor name reads r_merged r_sectors r_time writes w_merged w_sectors ...`
/// Lines with fewer than 14 columns are skipped.
pub fn parse_diskstats(content: &str) -> Result<Vec<DiskStatsLine>, ProbeError> {
    let mut disks = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 14 {
            continue;
        }
        let device = parts[2];
        disks.push(DiskStatsLine {
            device: device.to_string(),
            reads: field(&parts, 3, DISKSTATS_PATH, device)?,
            read_sectors: field(&parts, 5, DISKSTATS_PATH, device)?,
            writes: field(&parts, 7, DISKSTATS_PATH, device)?,
            write_sectors: field(&parts, 9, DISKSTATS_PATH, device)?,
        });
    }

    Ok(disks)
}

/// Parses `/proc/net/dev`, skipping the two header lines.
pub fn parse_net_dev(content: &str) -> Result<Vec<NetDevLine>, ProbeError> {
    let mut interfaces = Vec::new();

    for line in content.lines() {
        if line.contains('|') || line.trim().is_empty() {
            continue;
        }
        let Some((name, counters)) = line.split_once(':') else {
            continue;
        };
        let interface = name.trim();
        let values: Vec<&str> = counters.split_whitespace().collect();
        if values.len() < 16 {
            return Err(ProbeError::Parse {
                file: NET_DEV_PATH.to_string(),
                message: format!("interface {interface} has {} columns", values.len()),
            });
        }

        interfaces.push(NetDevLine {
            interface: interface.to_string(),
            rx_bytes: field(&values, 0, NET_DEV_PATH, interface)?,
            rx_packets: field(&values, 1, NET_DEV_PATH, interface)?,
            rx_errs: field(&values, 2, NET_DEV_PATH, interface)?,
            rx_drop: field(&values, 3, NET_DEV_PATH, interface)?,
            tx_bytes: field(&values, 8, NET_DEV_PATH, interface)?,
            tx_packets: field(&values, 9, NET_DEV_PATH, interface)?,
            tx_errs: field(&values, 10, NET_DEV_PATH, interface)?,
            tx_drop: field(&values, 11, NET_DEV_PATH, interface)?,
        });
    }

    Ok(interfaces)
}

/// Sums the devices accepted by `is_whole_device`. Partitions must be
/// filtered out by the caller, otherwise their I/O is counted twice.
pub fn sum_disk_io<F>(lines: &[DiskStatsLine], is_whole_device: F) -> DiskIoSample
where
    F: Fn(&str) -> bool,
{
    lines
        .iter()
        .filter(|l| is_whole_device(&l.device))
        .fold(DiskIoSample::default(), |mut acc, l| {
            acc.read_count += l.reads;
            acc.write_count += l.writes;
            acc.read_bytes += l.read_sectors * SECTOR_SIZE;
            acc.write_bytes += l.write_sectors * SECTOR_SIZE;
            acc
        })
}

pub fn sum_network(lines: &[NetDevLine]) -> NetworkIoSample {
    lines
        .iter()
        .fold(NetworkIoSample::default(), |mut acc, l| {
            acc.bytes_recv += l.rx_bytes;
            acc.packets_recv += l.rx_packets;
            acc.errin += l.rx_errs;
            acc.dropin += l.rx_drop;
            acc.bytes_sent += l.tx_bytes;
            acc.packets_sent += l.tx_packets;
            acc.errout += l.tx_errs;
            acc.dropout += l.tx_drop;
            acc
        })
}
