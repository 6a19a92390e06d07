//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types from the api-rpc crate. States and kinds stay
//! strings so newer daemons do not break older clients.

use serde::{Deserialize, Serialize};

/// animation.submit.v1 parameters
#[derive(Debug, Clone, Serialize)]
pub struct SubmitRequest {
    pub description: String,
    pub wait: bool,
}

/// animation.submit.v1 result
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub state: String,
    pub artifact_url: String,
    pub source_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct StatusRequest {
    pub job_id: String,
}

/// Failure record attached to a job whose last render failed
#[derive(Debug, Clone, Deserialize)]
pub struct FailureInfo {
    pub kind: String,
    pub message: String,
    pub diagnostics: Option<String>,
    pub recorded_at: i64,
}

/// animation.status.v1 result
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub job_id: String,
    pub state: String,
    #[serde(default)]
    pub artifact_url: Option<String>,
    #[serde(default)]
    pub failure: Option<FailureInfo>,
}

impl StatusResponse {
    pub fn is_completed(&self) -> bool {
        self.state == "COMPLETED"
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ArtifactRequest {
    pub job_id: String,
    pub offset: u64,
    pub length: u64,
}

/// animation.artifact.v1 result, `data` still base64 encoded
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactChunk {
    pub job_id: String,
    pub offset: u64,
    pub chunk_bytes: u64,
    pub data: String,
    pub media_type: String,
    pub total_bytes: u64,
    pub eof: bool,
}

/// Host figures reported by system.health.v1
#[derive(Debug, Clone, Deserialize)]
pub struct HostMetrics {
    pub cpu_usage_percent: f32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub media_disk_available_mb: u64,
    pub media_disk_total_mb: u64,
}

/// system.health.v1 result
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub codegen_mode: String,
    pub render_capacity: usize,
    pub renders_in_flight: usize,
    pub host: HostMetrics,
}

/// One entry of animation.list.v1
#[derive(Debug, Clone, Deserialize)]
pub struct JobSummary {
    pub job_id: String,
    pub state: String,
    pub description: Option<String>,
    pub submitted_at: Option<i64>,
    pub failure_kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListResponse {
    pub jobs: Vec<JobSummary>,
}
