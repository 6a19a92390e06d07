// Job Catalog - in-memory convenience index
//
// Not authoritative: status is always derived from the filesystem. The catalog
// remembers what the filesystem cannot (description, submission time) and the
// last state it observed.

use crate::domain::{DomainError, FailureKind, JobId, JobState};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    pub job_id: JobId,
    /// Unknown for jobs rebuilt from a scratch-root scan
    pub description: Option<String>,
    pub submitted_at: Option<i64>, // epoch ms
    pub last_state: JobState,
    pub failure_kind: Option<FailureKind>,
}

#[derive(Debug, Default)]
pub struct JobCatalog {
    records: RwLock<BTreeMap<JobId, JobRecord>>,
}

impl JobCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh submission (state Processing)
    pub fn register(&self, job_id: &JobId, description: &str, submitted_at: i64) {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.insert(
            job_id.clone(),
            JobRecord {
                job_id: job_id.clone(),
                description: Some(description.to_string()),
                submitted_at: Some(submitted_at),
                last_state: JobState::Processing,
                failure_kind: None,
            },
        );
    }

    /// Fold an observed state into the index.
    ///
    /// NotFound for a known job means it was cleaned up externally and the
    /// record is dropped. Any other backwards move is refused.
    pub fn observe(&self, job_id: &JobId, state: JobState) -> Result<(), DomainError> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());

        if state == JobState::NotFound {
            records.remove(job_id);
            return Ok(());
        }

        match records.get_mut(job_id) {
            Some(record) => {
                if !record.last_state.can_advance_to(state) {
                    return Err(DomainError::StateRegression {
                        from: record.last_state.to_string(),
                        to: state.to_string(),
                    });
                }
                record.last_state = state;
            }
            None => {
                records.insert(
                    job_id.clone(),
                    JobRecord {
                        job_id: job_id.clone(),
                        description: None,
                        submitted_at: None,
                        last_state: state,
                        failure_kind: None,
                    },
                );
            }
        }
        Ok(())
    }

    pub fn note_failure(&self, job_id: &JobId, kind: FailureKind) {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        if let Some(record) = records.get_mut(job_id) {
            record.failure_kind = Some(kind);
        }
    }

    pub fn get(&self, job_id: &JobId) -> Option<JobRecord> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records.get(job_id).cloned()
    }

    /// Records sorted by submission time (unknown first), then id
    pub fn list(&self) -> Vec<JobRecord> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        let mut list: Vec<JobRecord> = records.values().cloned().collect();
        list.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.job_id.cmp(&b.job_id))
        });
        list
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
