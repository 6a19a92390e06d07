// Host resource probe port (health reporting)
use async_trait::async_trait;
use serde::Serialize;

/// Host metrics relevant to rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostMetrics {
    pub cpu_usage_percent: f32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    /// Free space on the disk holding the media root
    pub media_disk_available_mb: u64,
    pub media_disk_total_mb: u64,
}

#[async_trait]
pub trait SystemProbe: Send + Sync {
    /// Get current host metrics
    async fn get_metrics(&self) -> HostMetrics;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;

    /// Probe returning fixed metrics
    pub struct FixedSystemProbe {
        metrics: HostMetrics,
    }

    impl FixedSystemProbe {
        pub fn new(cpu_usage_percent: f32) -> Self {
            Self {
                metrics: HostMetrics {
                    cpu_usage_percent,
                    memory_used_mb: 4096,
                    memory_total_mb: 16384,
                    media_disk_available_mb: 100_000,
                    media_disk_total_mb: 500_000,
                },
            }
        }
    }

    #[async_trait]
    impl SystemProbe for FixedSystemProbe {
        async fn get_metrics(&self) -> HostMetrics {
            self.metrics.clone()
        }
    }
}
