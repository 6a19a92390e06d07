// Startup recovery: rebuild the job catalog from the scratch root
use crate::application::catalog::JobCatalog;
use crate::application::probe::StateProbe;
use crate::port::JobStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Summary of one catalog rebuild
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub scanned: usize,
    pub completed: usize,
    pub processing: usize,
    pub failed: usize,
}

/// Recovery service
///
/// On daemon startup, scans every persisted source and re-derives its state so
/// `animation.list.v1` covers jobs submitted before the restart.
pub struct RecoveryService {
    store: Arc<dyn JobStore>,
    probe: StateProbe,
    catalog: Arc<JobCatalog>,
}

impl RecoveryService {
    pub fn new(store: Arc<dyn JobStore>, probe: StateProbe, catalog: Arc<JobCatalog>) -> Self {
        Self {
            store,
            probe,
            catalog,
        }
    }

    /// Rebuild the catalog. Unreadable jobs are skipped with a warning.
    pub async fn rebuild_catalog(&self) -> crate::error::Result<RecoveryReport> {
        let ids = self.store.list_job_ids().await?;
        let mut report = RecoveryReport {
            scanned: ids.len(),
            ..Default::default()
        };

        for job_id in ids {
            let status = match self.probe.probe(&job_id).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(job_id = %job_id, error = %e, "Skipping unreadable job during recovery");
                    continue;
                }
            };

            if let Err(e) = self.catalog.observe(&job_id, status.state) {
                warn!(job_id = %job_id, error = %e, "Catalog refused recovered state");
                continue;
            }

            match (&status.failure, status.state) {
                (_, crate::domain::JobState::Completed) => report.completed += 1,
                (Some(failure), _) => {
                    self.catalog.note_failure(&job_id, failure.kind);
                    report.failed += 1;
                }
                (None, _) => report.processing += 1,
            }
        }

        info!(
            scanned = report.scanned,
            completed = report.completed,
            processing = report.processing,
            failed = report.failed,
            "Job catalog rebuilt"
        );
        Ok(report)
    }
}
