// Job Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Longest accepted job id (UUID v4 strings are 36 chars)
pub const MAX_JOB_ID_LEN: usize = 64;

/// Longest accepted description, in characters
pub const MAX_DESCRIPTION_CHARS: usize = 4000;

/// Job ID
///
/// Doubles as a file and directory name under the scratch and media roots,
/// so only `[A-Za-z0-9_-]` is accepted. Anything else (path separators, dots,
/// whitespace) is rejected before it can reach the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

impl JobId {
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(DomainError::InvalidJobId("job id is empty".to_string()));
        }
        if raw.len() > MAX_JOB_ID_LEN {
            return Err(DomainError::InvalidJobId(format!(
                "job id too long ({} > {} chars)",
                raw.len(),
                MAX_JOB_ID_LEN
            )));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DomainError::InvalidJobId(format!(
                "job id '{}' must be alphanumeric, '-' or '_'",
                raw.escape_default()
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for JobId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller-supplied animation description (trimmed, non-empty, bounded)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description(String);

impl Description {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidDescription(
                "description is empty".to_string(),
            ));
        }
        let chars = trimmed.chars().count();
        if chars > MAX_DESCRIPTION_CHARS {
            return Err(DomainError::InvalidDescription(format!(
                "description too long ({} > {} chars)",
                chars, MAX_DESCRIPTION_CHARS
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render state of a job.
///
/// Never stored: it is derived from the filesystem on every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    NotFound,
    Processing,
    Completed,
}

impl JobState {
    fn rank(self) -> u8 {
        match self {
            JobState::NotFound => 0,
            JobState::Processing => 1,
            JobState::Completed => 2,
        }
    }

    /// Happy-path transitions only move forward (staying put is allowed)
    pub fn can_advance_to(self, next: JobState) -> bool {
        next.rank() >= self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::NotFound => "NOT_FOUND",
            JobState::Processing => "PROCESSING",
            JobState::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a render terminally failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    ExecutionFailed,
    Timeout,
    ArtifactNotFound,
}

/// Failure marker persisted next to the source of a job whose render failed.
///
/// The job keeps reporting `Processing`; the record only adds diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub kind: FailureKind,
    pub message: String,
    pub diagnostics: Option<String>,
    pub recorded_at: i64, // epoch ms
}

/// Snapshot produced by a status probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub job_id: JobId,
    pub state: JobState,
    pub artifact_path: Option<PathBuf>,
    pub failure: Option<FailureRecord>,
}

impl JobStatus {
    pub fn not_found(job_id: JobId) -> Self {
        Self {
            job_id,
            state: JobState::NotFound,
            artifact_path: None,
            failure: None,
        }
    }
}
