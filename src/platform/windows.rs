use std::path::Path;

use starship_battery::units::ratio::percent;
use sysinfo::Users;
use tracing::{debug, info};

use super::{Platform, trim_trailing_separators};

const RESERVED: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];
const DEFAULT_SYSTEM_DRIVE: &str = "C:";

/// Windows hosts. Drive letters are mount points (`C:\`, `D:\`).
#[derive(Debug, Clone)]
pub struct Windows {
    system_drive: String,
}

impl Windows {
    pub fn new(system_drive: impl Into<String>) -> Self {
        Windows {
            system_drive: system_drive.into(),
        }
    }

    /// Reads `%SystemDrive%`, falling back to `C:`.
    pub fn from_env() -> Self {
        let drive = std::env::var("SystemDrive")
            .ok()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_DRIVE.to_string());
        Windows::new(drive)
    }
}

impl Default for Windows {
    fn default() -> Self {
        Windows::new(DEFAULT_SYSTEM_DRIVE)
    }
}

impl Platform for Windows {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn sanitize(&self, raw_path: &str) -> String {
        raw_path.replace(RESERVED, "_")
    }

    fn is_root_mount(&self, mount_point: &Path) -> bool {
        let Some(mount) = mount_point.to_str() else {
            return false;
        };
        trim_trailing_separators(mount)
            .eq_ignore_ascii_case(trim_trailing_separators(&self.system_drive))
    }

    /// Logs battery charge and the user accounts sysinfo reports. sysinfo
    /// has no terminal, remote host or login time for a user, so those are
    /// not logged.
    fn log_session_telemetry(&self) {
        match read_batteries() {
            Ok(readings) if readings.is_empty() => debug!("No battery reported"),
            Ok(readings) => {
                for reading in readings {
                    info!(
                        battery = reading.index,
                        state = %reading.state,
                        "Battery percentage: {}%",
                        reading.charge_percent
                    );
                }
            }
            Err(e) => debug!(error = %e, "Battery telemetry unavailable"),
        }

        let users = Users::new_with_refreshed_list();
        if users.list().is_empty() {
            info!("No user sessions reported");
            return;
        }
        for user in users.list() {
            let groups = user
                .groups()
                .iter()
                .map(|g| g.name().to_string())
                .collect::<Vec<_>>()
                .join(",");
            info!(
                user = user.name(),
                uid = ?user.id(),
                groups = %groups,
                "User session: {}, Groups: {}",
                user.name(),
                groups
            );
        }
    }
}

/// One battery's charge, rounded to one decimal.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryReading {
    pub index: usize,
    pub charge_percent: f64,
    pub state: String,
}

/// Reads every battery the host exposes. Hosts without one return an
/// empty list.
pub fn read_batteries() -> Result<Vec<BatteryReading>, starship_battery::Error> {
    let manager = starship_battery::Manager::new()?;
    let mut readings = Vec::new();
    for (index, battery) in manager.batteries()?.enumerate() {
        let battery = battery?;
        let charge = f64::from(battery.state_of_charge().get::<percent>());
        readings.push(BatteryReading {
            index,
            charge_percent: (charge * 10.0).round() / 10.0,
            state: battery.state().to_string(),
        });
    }
    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::HostRegistry;
    use crate::probe::PartitionSample;
    use crate::probe::fake::ScriptedProbe;

    #[test]
    fn sanitize_replaces_reserved_characters() {
        let w = Windows::default();
        assert_eq!(w.sanitize("C:\\"), "C__");
        assert_eq!(w.sanitize("D:\\Games"), "D__Games");
        assert_eq!(w.sanitize(r#"a*b?c"d<e>f|g/h"#), "a_b_c_d_e_f_g_h");
    }

    #[test]
    fn sanitize_leaves_dots_and_dashes() {
        // Only the reserved set is rewritten; this differs from POSIX mode.
        let w = Windows::default();
        assert_eq!(w.sanitize("E:\\my-dir.x"), "E__my-dir.x");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let w = Windows::default();
        for raw in ["C:\\", "\\\\?\\Volume{abc}\\", "Z:\\a\\b"] {
            let once = w.sanitize(raw);
            assert_eq!(w.sanitize(&once), once);
        }
    }

    #[test]
    fn battery_readings_are_percentages() {
        // Hosts without a power supply interface report an error or nothing.
        if let Ok(readings) = read_batteries() {
            for reading in readings {
                assert!((0.0..=100.0).contains(&reading.charge_percent));
            }
        }
    }

    #[test]
    fn session_telemetry_leaves_gauges_untouched() {
        let mut probe = ScriptedProbe::new(2)
            .with_partitions(vec![PartitionSample::new("C:\\", 100, 40.0)]);
        let registry = HostRegistry::new(&Windows::default(), &mut probe).unwrap();
        registry.record_disk_totals(100, 40.0);
        let before = registry.render().unwrap();

        Windows::default().log_session_telemetry();

        assert_eq!(registry.render().unwrap(), before);
    }

    #[test]
    fn root_detection_uses_system_drive() {
        let w = Windows::new("D:");
        assert!(w.is_root_mount(Path::new("D:\\")));
        assert!(w.is_root_mount(Path::new("d:\\")));
        assert!(!w.is_root_mount(Path::new("C:\\")));
    }
}
