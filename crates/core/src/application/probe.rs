// State probe - derives job state from the filesystem
use crate::domain::{JobId, JobState, JobStatus};
use crate::error::Result;
use crate::port::{ArtifactLocator, JobStore};
use std::sync::Arc;

/// Artifact first, then source marker, else NotFound.
///
/// Checking the artifact first means a job whose artifact exists is Completed
/// even if its source was cleaned away.
#[derive(Clone)]
pub struct StateProbe {
    store: Arc<dyn JobStore>,
    locator: Arc<dyn ArtifactLocator>,
}

impl StateProbe {
    pub fn new(store: Arc<dyn JobStore>, locator: Arc<dyn ArtifactLocator>) -> Self {
        Self { store, locator }
    }

    pub async fn probe(&self, job_id: &JobId) -> Result<JobStatus> {
        if let Some(path) = self.locator.locate(job_id).await? {
            return Ok(JobStatus {
                job_id: job_id.clone(),
                state: JobState::Completed,
                artifact_path: Some(path),
                failure: None,
            });
        }

        if self.store.source_exists(job_id).await? {
            return Ok(JobStatus {
                job_id: job_id.clone(),
                state: JobState::Processing,
                artifact_path: None,
                failure: self.store.read_failure(job_id).await?,
            });
        }

        Ok(JobStatus::not_found(job_id.clone()))
    }
}
