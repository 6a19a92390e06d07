//! RPC Request/Response Types
//!
//! Parameters and results of the `animation.*` and `system.*` methods.

use animagen_core::domain::{FailureKind, FailureRecord, JobState};
use animagen_core::port::HostMetrics;
use serde::{Deserialize, Serialize};

fn default_wait() -> bool {
    true
}

/// animation.submit.v1 - Generate and render an animation
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// Optional at the wire level so a missing field is a validation error, not a parse error
    #[serde(default)]
    pub description: Option<String>,
    /// When false the call returns once the source is persisted
    #[serde(default = "default_wait")]
    pub wait: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub state: JobState,
    pub artifact_url: String,
    pub source_text: String,
}

/// animation.status.v1 - Derived state of a job
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub job_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub job_id: String,
    pub state: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureRecord>,
}

/// animation.artifact.v1 - Read a slice of the rendered video
#[derive(Debug, Deserialize)]
pub struct ArtifactRequest {
    pub job_id: String,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub length: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactResponse {
    pub job_id: String,
    pub offset: u64,
    pub chunk_bytes: u64,
    /// Base64 (standard alphabet, padded)
    pub data: String,
    pub media_type: String,
    pub total_bytes: u64,
    pub eof: bool,
}

/// system.health.v1
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub codegen_mode: String,
    pub render_capacity: usize,
    pub renders_in_flight: usize,
    pub host: HostMetrics,
}

/// animation.list.v1
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub jobs: Vec<JobSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub job_id: String,
    pub state: JobState,
    pub description: Option<String>,
    pub submitted_at: Option<i64>,
    pub failure_kind: Option<FailureKind>,
}
