//! RPC Method Handlers
//!
//! Thin adapters between JSON-RPC parameters and the job pipeline.

use crate::error::to_rpc_error;
use crate::types::{
    ArtifactRequest, ArtifactResponse, HealthResponse, JobSummary, ListResponse, StatusRequest,
    StatusResponse, SubmitRequest, SubmitResponse,
};
use animagen_core::application::constants::DEFAULT_ARTIFACT_CHUNK_BYTES;
use animagen_core::application::{artifact_url, CodegenMode, JobPipeline};
use animagen_core::domain::JobState;
use animagen_core::error::AppError;
use animagen_core::port::SystemProbe;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    pipeline: JobPipeline,
    system_probe: Arc<dyn SystemProbe>,
    codegen_mode: CodegenMode,
    start_time: Instant,
}

impl RpcHandler {
    pub fn new(
        pipeline: JobPipeline,
        system_probe: Arc<dyn SystemProbe>,
        codegen_mode: CodegenMode,
    ) -> Self {
        Self {
            pipeline,
            system_probe,
            codegen_mode,
            start_time: Instant::now(),
        }
    }

    /// animation.submit.v1
    pub async fn submit(&self, params: SubmitRequest) -> Result<SubmitResponse, ErrorObjectOwned> {
        let description = params.description.ok_or_else(|| {
            to_rpc_error(AppError::InvalidRequest("description is required".to_string()))
        })?;

        if params.wait {
            let receipt = self
                .pipeline
                .submit(&description)
                .await
                .map_err(to_rpc_error)?;
            return Ok(SubmitResponse {
                job_id: receipt.job_id.to_string(),
                state: JobState::Completed,
                artifact_url: receipt.artifact_url,
                source_text: receipt.source_text.into_string(),
            });
        }

        // Detached: the render outcome is observable through status
        let accepted = self
            .pipeline
            .enqueue(&description)
            .await
            .map_err(to_rpc_error)?;
        info!(job_id = %accepted.job_id, "Submission accepted for background render");
        Ok(SubmitResponse {
            artifact_url: artifact_url(&accepted.job_id),
            job_id: accepted.job_id.to_string(),
            state: JobState::Processing,
            source_text: accepted.source_text.into_string(),
        })
    }

    /// animation.status.v1
    pub async fn status(&self, params: StatusRequest) -> Result<StatusResponse, ErrorObjectOwned> {
        let status = self
            .pipeline
            .status(&params.job_id)
            .await
            .map_err(to_rpc_error)?;

        if status.state == JobState::NotFound {
            return Err(to_rpc_error(AppError::NotFound(format!(
                "job {}",
                status.job_id
            ))));
        }

        Ok(StatusResponse {
            job_id: status.job_id.to_string(),
            state: status.state,
            artifact_url: (status.state == JobState::Completed)
                .then(|| artifact_url(&status.job_id)),
            failure: status.failure,
        })
    }

    /// animation.artifact.v1
    pub async fn artifact(
        &self,
        params: ArtifactRequest,
    ) -> Result<ArtifactResponse, ErrorObjectOwned> {
        let length = params.length.unwrap_or(DEFAULT_ARTIFACT_CHUNK_BYTES);
        let chunk = self
            .pipeline
            .read_artifact_chunk(&params.job_id, params.offset, length)
            .await
            .map_err(to_rpc_error)?;

        debug!(
            job_id = %params.job_id,
            offset = chunk.offset,
            bytes = chunk.bytes.len(),
            eof = chunk.eof,
            "Artifact chunk served"
        );

        Ok(ArtifactResponse {
            job_id: params.job_id,
            offset: chunk.offset,
            chunk_bytes: chunk.bytes.len() as u64,
            data: STANDARD.encode(&chunk.bytes),
            media_type: chunk.media_type,
            total_bytes: chunk.total_bytes,
            eof: chunk.eof,
        })
    }

    /// system.health.v1
    pub async fn health(&self) -> Result<HealthResponse, ErrorObjectOwned> {
        let host = self.system_probe.get_metrics().await;
        let gate = self.pipeline.render_gate();

        Ok(HealthResponse {
            status: "ok".to_string(),
            version: animagen_core::VERSION.to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            codegen_mode: self.codegen_mode.to_string(),
            render_capacity: gate.capacity(),
            renders_in_flight: gate.in_use(),
            host,
        })
    }

    /// animation.list.v1
    pub async fn list(&self) -> Result<ListResponse, ErrorObjectOwned> {
        let records = self.pipeline.list().await.map_err(to_rpc_error)?;
        let jobs = records
            .into_iter()
            .map(|r| JobSummary {
                job_id: r.job_id.to_string(),
                state: r.last_state,
                description: r.description,
                submitted_at: r.submitted_at,
                failure_kind: r.failure_kind,
            })
            .collect();
        Ok(ListResponse { jobs })
    }
}
