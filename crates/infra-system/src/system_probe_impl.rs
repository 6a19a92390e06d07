// System probe implementation
// reason: sysinfo for cross-platform host monitoring
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use sysinfo::{Disks, System};
use tracing::debug;

use animagen_core::port::system_probe::{HostMetrics, SystemProbe};

const MB: u64 = 1024 * 1024;

/// System probe implementation using sysinfo
///
/// Disk figures describe the filesystem holding the media root, since that is
/// where renders land.
pub struct SystemProbeImpl {
    system: Arc<Mutex<System>>,
    media_root: PathBuf,
}

impl SystemProbeImpl {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        let media_root = media_root.into();
        let media_root = media_root.canonicalize().unwrap_or(media_root);
        Self {
            system: Arc::new(Mutex::new(System::new_all())),
            media_root,
        }
    }
}

/// (available, total) bytes of the disk with the longest mount point prefix of `path`
fn disk_space_for(disks: &Disks, path: &Path) -> (u64, u64) {
    disks
        .iter()
        .filter(|d| path.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len())
        .map(|d| (d.available_space(), d.total_space()))
        .unwrap_or((0, 0))
}

#[async_trait]
impl SystemProbe for SystemProbeImpl {
    async fn get_metrics(&self) -> HostMetrics {
        let (cpu_usage_percent, memory_used_mb, memory_total_mb) = {
            let mut sys = self.system.lock().unwrap_or_else(|e| e.into_inner());
            sys.refresh_cpu();
            sys.refresh_memory();
            (
                sys.global_cpu_info().cpu_usage(),
                sys.used_memory() / MB,
                sys.total_memory() / MB,
            )
        };

        let disks = Disks::new_with_refreshed_list();
        let (available, total) = disk_space_for(&disks, &self.media_root);

        debug!(
            cpu = %cpu_usage_percent,
            mem_used_mb = %memory_used_mb,
            media_disk_available_mb = available / MB,
            "Host metrics collected"
        );

        HostMetrics {
            cpu_usage_percent,
            memory_used_mb,
            memory_total_mb,
            media_disk_available_mb: available / MB,
            media_disk_total_mb: total / MB,
        }
    }
}
