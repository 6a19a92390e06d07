// Job Pipeline - per-job lifecycle orchestration
//
// submit -> generate -> persist source -> (render permit) -> execute -> locate
// status / fetch only look at the filesystem.

pub mod submit;


pub use submit::PreparedJob;

use crate::application::admission::RenderGate;
use crate::application::catalog::{JobCatalog, JobRecord};
use crate::application::codegen::CodeGenerator;
use crate::application::constants::{
    ARTIFACT_URL_PREFIX, DEFAULT_MAX_CONCURRENT_RENDERS, MAX_ARTIFACT_CHUNK_BYTES,
};
use crate::application::probe::StateProbe;
use crate::domain::{FailureRecord, JobId, JobState, JobStatus, SourceText};
use crate::error::{AppError, Result};
use crate::port::{
    ArtifactLocator, ArtifactStream, IdProvider, JobStore, RenderError, RenderExecutor,
    TimeProvider,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};

/// Pipeline tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub max_concurrent_renders: usize,
    pub max_chunk_bytes: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_renders: DEFAULT_MAX_CONCURRENT_RENDERS,
            max_chunk_bytes: MAX_ARTIFACT_CHUNK_BYTES,
        }
    }
}

/// Collaborators injected into the pipeline
pub struct PipelinePorts {
    pub generator: Arc<CodeGenerator>,
    pub store: Arc<dyn JobStore>,
    pub locator: Arc<dyn ArtifactLocator>,
    pub executor: Arc<dyn RenderExecutor>,
    pub id_provider: Arc<dyn IdProvider>,
    pub time_provider: Arc<dyn TimeProvider>,
}

/// Result of a synchronous submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub job_id: JobId,
    pub artifact_url: String,
    pub artifact_path: PathBuf,
    pub source_text: SourceText,
}

/// Result of a decoupled submission; the render continues in the background
#[derive(Debug)]
pub struct AcceptedJob {
    pub job_id: JobId,
    pub source_text: SourceText,
    pub completion: JoinHandle<Result<PathBuf>>,
}

/// One slice of an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactChunk {
    pub bytes: Vec<u8>,
    pub offset: u64,
    pub media_type: String,
    pub total_bytes: u64,
    pub eof: bool,
}

/// Address under which the artifact of `job_id` is served
pub fn artifact_url(job_id: &JobId) -> String {
    format!("{}/{}", ARTIFACT_URL_PREFIX, job_id)
}

#[derive(Clone)]
pub struct JobPipeline {
    generator: Arc<CodeGenerator>,
    store: Arc<dyn JobStore>,
    locator: Arc<dyn ArtifactLocator>,
    executor: Arc<dyn RenderExecutor>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    probe: StateProbe,
    gate: RenderGate,
    catalog: Arc<JobCatalog>,
    config: PipelineConfig,
}

impl JobPipeline {
    pub fn new(ports: PipelinePorts, catalog: Arc<JobCatalog>, config: PipelineConfig) -> Self {
        let probe = StateProbe::new(Arc::clone(&ports.store), Arc::clone(&ports.locator));
        Self {
            generator: ports.generator,
            store: ports.store,
            locator: ports.locator,
            executor: ports.executor,
            id_provider: ports.id_provider,
            time_provider: ports.time_provider,
            probe,
            gate: RenderGate::new(config.max_concurrent_renders),
            catalog,
            config,
        }
    }

    /// Submit and wait for the render to finish
    ///
    /// # Errors
    /// - `InvalidRequest` for an empty or oversized description
    /// - `GenerationFailed` (nothing written)
    /// - `Render(..)` when the renderer fails; the source stays and the job
    ///   keeps reporting Processing with a failure record
    pub async fn submit(&self, raw_description: &str) -> Result<SubmissionReceipt> {
        let prepared = self.prepare(raw_description).await?;
        let artifact_path = self.render(&prepared.job_id, &prepared.source_path).await?;

        Ok(SubmissionReceipt {
            artifact_url: artifact_url(&prepared.job_id),
            job_id: prepared.job_id,
            artifact_path,
            source_text: prepared.source_text,
        })
    }

    /// Submit and return once the source is persisted; render in the background
    pub async fn enqueue(&self, raw_description: &str) -> Result<AcceptedJob> {
        let prepared = self.prepare(raw_description).await?;

        let pipeline = self.clone();
        let job_id = prepared.job_id.clone();
        let source_path = prepared.source_path.clone();
        let span = info_span!("render", job_id = %job_id);
        let completion = tokio::spawn(
            async move { pipeline.render(&job_id, &source_path).await }.instrument(span),
        );

        Ok(AcceptedJob {
            job_id: prepared.job_id,
            source_text: prepared.source_text,
            completion,
        })
    }

    /// Derived state of a job. Unknown ids are `NotFound`, not an error.
    pub async fn status(&self, raw_job_id: &str) -> Result<JobStatus> {
        let job_id = JobId::parse(raw_job_id)?;
        let status = self.probe.probe(&job_id).await?;
        if let Err(e) = self.catalog.observe(&job_id, status.state) {
            warn!(job_id = %job_id, error = %e, "Catalog rejected observed state");
        }
        Ok(status)
    }

    /// Open the artifact of a job for streaming
    pub async fn fetch_artifact(&self, raw_job_id: &str) -> Result<ArtifactStream> {
        let job_id = JobId::parse(raw_job_id)?;
        let path = self
            .locator
            .locate(&job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no artifact for job {}", job_id)))?;
        self.store.open_artifact(&path).await
    }

    /// Read `length` bytes of a job's artifact starting at `offset`
    pub async fn read_artifact_chunk(
        &self,
        raw_job_id: &str,
        offset: u64,
        length: u64,
    ) -> Result<ArtifactChunk> {
        if length == 0 || length > self.config.max_chunk_bytes {
            return Err(AppError::InvalidRequest(format!(
                "chunk length must be within 1..={}",
                self.config.max_chunk_bytes
            )));
        }

        let mut stream = self.fetch_artifact(raw_job_id).await?;
        if offset > stream.size_bytes {
            return Err(AppError::InvalidRequest(format!(
                "offset {} is past the end of the artifact ({} bytes)",
                offset, stream.size_bytes
            )));
        }

        stream.reader.seek(SeekFrom::Start(offset)).await?;
        let mut bytes = Vec::with_capacity(length.min(stream.size_bytes - offset) as usize);
        (&mut stream.reader).take(length).read_to_end(&mut bytes).await?;

        let eof = offset + bytes.len() as u64 >= stream.size_bytes;
        Ok(ArtifactChunk {
            bytes,
            offset,
            media_type: stream.media_type,
            total_bytes: stream.size_bytes,
            eof,
        })
    }

    /// Catalog entries with their state re-derived from the filesystem
    pub async fn list(&self) -> Result<Vec<JobRecord>> {
        for record in self.catalog.list() {
            if record.last_state == JobState::Completed {
                continue;
            }
            let status = match self.probe.probe(&record.job_id).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(job_id = %record.job_id, error = %e, "Listing job with its last known state");
                    continue;
                }
            };
            if let Err(e) = self.catalog.observe(&record.job_id, status.state) {
                warn!(job_id = %record.job_id, error = %e, "Catalog rejected observed state");
            }
        }
        Ok(self.catalog.list())
    }

    pub fn render_gate(&self) -> &RenderGate {
        &self.gate
    }

    pub fn catalog(&self) -> &Arc<JobCatalog> {
        &self.catalog
    }

    async fn prepare(&self, raw_description: &str) -> Result<PreparedJob> {
        submit::prepare(
            &self.generator,
            self.store.as_ref(),
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
            &self.catalog,
            raw_description,
        )
        .await
    }

    async fn render(&self, job_id: &JobId, source_path: &Path) -> Result<PathBuf> {
        let _permit = self.gate.acquire().await?;
        let started = Instant::now();

        match self.executor.execute(source_path, job_id).await {
            Ok(artifact_path) => {
                if let Err(e) = self.catalog.observe(job_id, JobState::Completed) {
                    warn!(job_id = %job_id, error = %e, "Catalog rejected completion");
                }
                info!(
                    job_id = %job_id,
                    artifact_path = %artifact_path.display(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Render completed"
                );
                Ok(artifact_path)
            }
            Err(e) => {
                error!(
                    job_id = %job_id,
                    kind = ?e.failure_kind(),
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Render failed"
                );
                self.record_failure(job_id, &e).await;
                Err(AppError::Render(e))
            }
        }
    }

    async fn record_failure(&self, job_id: &JobId, error: &RenderError) {
        let record = FailureRecord {
            kind: error.failure_kind(),
            message: error.to_string(),
            diagnostics: error.diagnostics().map(str::to_string),
            recorded_at: self.time_provider.now_millis(),
        };
        self.catalog.note_failure(job_id, record.kind);
        if let Err(e) = self.store.record_failure(job_id, &record).await {
            warn!(job_id = %job_id, error = %e, "Failed to persist failure record");
        }
    }
}
