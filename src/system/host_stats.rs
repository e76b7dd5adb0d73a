//! Host CPU / memory / disk usage for the admin dashboard
//!
//! Backed by sysinfo when the `system-stats` feature is enabled; reports
//! zeros otherwise.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HostSnapshot {
    /// Global CPU usage, percent
    pub cpu: f64,
    /// Used memory, percent of total
    pub memory: f64,
    /// Used disk space across mounted disks, percent of total
    pub storage: f64,
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    crate::utils::round1(used as f64 * 100.0 / total as f64)
}

#[cfg(feature = "system-stats")]
mod imp {
    use std::sync::LazyLock;

    use parking_lot::Mutex;
    use sysinfo::{Disks, System};

    use super::{HostSnapshot, percent};

    /// CPU usage is a delta between refreshes, so the System is kept around
    static SYSTEM: LazyLock<Mutex<System>> = LazyLock::new(|| Mutex::new(System::new()));

    pub fn snapshot() -> HostSnapshot {
        let mut sys = SYSTEM.lock();
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let disks = Disks::new_with_refreshed_list();
        let (total_space, available_space) = disks
            .list()
            .iter()
            .fold((0u64, 0u64), |(t, a), d| {
                (t + d.total_space(), a + d.available_space())
            });

        HostSnapshot {
            cpu: crate::utils::round1(f64::from(sys.global_cpu_usage())),
            memory: percent(sys.used_memory(), sys.total_memory()),
            storage: percent(total_space.saturating_sub(available_space), total_space),
        }
    }
}

#[cfg(not(feature = "system-stats"))]
mod imp {
    use super::HostSnapshot;

    pub fn snapshot() -> HostSnapshot {
        HostSnapshot::default()
    }
}

/// Current host usage
pub fn host_snapshot() -> HostSnapshot {
    imp::snapshot()
}
