//! Animagen Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    ArtifactChunk, ArtifactRequest, HealthResponse, JobSummary, ListResponse, StatusRequest,
    StatusResponse, SubmitRequest, SubmitResponse,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Synchronous submissions block for the whole render
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_CHUNK_BYTES: u64 = 1024 * 1024;
const MAX_RESPONSE_BYTES: u32 = 16 * 1024 * 1024;

impl ArtifactChunk {
    /// Decoded chunk payload
    pub fn bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| SdkError::InvalidChunk(e.to_string()))
    }
}

/// Animagen Daemon Client
///
/// # Example
///
/// ```no_run
/// use animagen_sdk::AnimagenClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = AnimagenClient::connect("http://127.0.0.1:9527").await?;
/// let job = client.submit("Create a blue circle").await?;
/// client.download_artifact(&job.job_id, "circle.mp4").await?;
/// # Ok(())
/// # }
/// ```
pub struct AnimagenClient {
    client: HttpClient,
}

impl AnimagenClient {
    /// Connect to the Animagen daemon
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:9527`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        Self::connect_with_timeout(url, DEFAULT_REQUEST_TIMEOUT).await
    }

    /// Connect with a custom per-request timeout
    pub async fn connect_with_timeout(url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(timeout)
            .max_response_size(MAX_RESPONSE_BYTES)
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    /// Submit a description and wait for the render to finish
    pub async fn submit(&self, description: impl Into<String>) -> Result<SubmitResponse> {
        self.submit_request(SubmitRequest {
            description: description.into(),
            wait: true,
        })
        .await
    }

    /// Submit a description and return once its source is persisted
    ///
    /// Poll [`status`](Self::status) to follow the render.
    pub async fn enqueue(&self, description: impl Into<String>) -> Result<SubmitResponse> {
        self.submit_request(SubmitRequest {
            description: description.into(),
            wait: false,
        })
        .await
    }

    async fn submit_request(&self, request: SubmitRequest) -> Result<SubmitResponse> {
        let params = rpc_params![request];
        let response: SubmitResponse = self.client.request("animation.submit.v1", params).await?;

        Ok(response)
    }

    /// Derived state of a job
    ///
    /// Unknown jobs fail with an RPC error of kind `NOT_FOUND`.
    pub async fn status(&self, job_id: impl Into<String>) -> Result<StatusResponse> {
        let request = StatusRequest {
            job_id: job_id.into(),
        };
        let params = rpc_params![request];
        let response: StatusResponse = self.client.request("animation.status.v1", params).await?;

        Ok(response)
    }

    /// Read one slice of a job's video
    pub async fn artifact_chunk(
        &self,
        job_id: impl Into<String>,
        offset: u64,
        length: u64,
    ) -> Result<ArtifactChunk> {
        let request = ArtifactRequest {
            job_id: job_id.into(),
            offset,
            length,
        };
        let params = rpc_params![request];
        let response: ArtifactChunk = self
            .client
            .request("animation.artifact.v1", params)
            .await?;

        Ok(response)
    }

    /// Download a job's video to `path`, returning the number of bytes written
    pub async fn download_artifact(&self, job_id: &str, path: impl AsRef<Path>) -> Result<u64> {
        let mut file = tokio::fs::File::create(path.as_ref()).await?;

        let mut offset = 0u64;
        loop {
            let chunk = self
                .artifact_chunk(job_id, offset, DEFAULT_CHUNK_BYTES)
                .await?;
            let bytes = chunk.bytes()?;
            if bytes.len() as u64 != chunk.chunk_bytes {
                return Err(SdkError::InvalidChunk(format!(
                    "expected {} bytes at offset {}, decoded {}",
                    chunk.chunk_bytes,
                    offset,
                    bytes.len()
                )));
            }
            file.write_all(&bytes).await?;
            offset += bytes.len() as u64;

            if chunk.eof || bytes.is_empty() {
                break;
            }
        }
        file.flush().await?;

        Ok(offset)
    }

    /// Jobs known to the daemon
    pub async fn list(&self) -> Result<Vec<JobSummary>> {
        let response: ListResponse = self
            .client
            .request("animation.list.v1", rpc_params![])
            .await?;

        Ok(response.jobs)
    }

    /// Daemon health
    pub async fn health(&self) -> Result<HealthResponse> {
        let response: HealthResponse = self
            .client
            .request("system.health.v1", rpc_params![])
            .await?;

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_decoding() {
        let chunk = ArtifactChunk {
            job_id: "job".to_string(),
            offset: 0,
            chunk_bytes: 5,
            data: STANDARD.encode(b"hello"),
            media_type: "video/mp4".to_string(),
            total_bytes: 5,
            eof: true,
        };
        assert_eq!(chunk.bytes().unwrap(), b"hello");

        let broken = ArtifactChunk {
            data: "!!not base64!!".to_string(),
            ..chunk
        };
        assert!(matches!(broken.bytes(), Err(SdkError::InvalidChunk(_))));
    }
}
