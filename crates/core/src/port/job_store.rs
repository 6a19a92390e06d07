// Job Store Port (Interface)
// The filesystem is the system of record: source marker, failure record, artifact bytes

use crate::domain::{FailureRecord, JobId, SourceText};
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncSeek};

/// Seekable byte source for artifact retrieval
pub trait ArtifactRead: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Unpin> ArtifactRead for T {}

/// An opened artifact, ready to stream
pub struct ArtifactStream {
    pub path: PathBuf,
    pub media_type: String,
    pub size_bytes: u64,
    pub reader: Box<dyn ArtifactRead>,
}

impl fmt::Debug for ArtifactStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactStream")
            .field("path", &self.path)
            .field("media_type", &self.media_type)
            .field("size_bytes", &self.size_bytes)
            .finish_non_exhaustive()
    }
}

/// Per-job durable state
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Where the job's source lives (whether or not it exists yet)
    fn source_path(&self, job_id: &JobId) -> PathBuf;

    /// Persist the generated source exactly once.
    ///
    /// Readers never observe a partially written file. A second call for the
    /// same id fails with `AppError::Conflict` and leaves the first source intact.
    async fn persist_source(&self, job_id: &JobId, source: &SourceText) -> Result<PathBuf>;

    async fn source_exists(&self, job_id: &JobId) -> Result<bool>;

    async fn read_source(&self, job_id: &JobId) -> Result<Option<SourceText>>;

    /// Persist (or replace) the failure record of a job
    async fn record_failure(&self, job_id: &JobId, record: &FailureRecord) -> Result<()>;

    async fn read_failure(&self, job_id: &JobId) -> Result<Option<FailureRecord>>;

    /// Ids of every job with a persisted source, sorted
    async fn list_job_ids(&self) -> Result<Vec<JobId>>;

    /// Open a located artifact for streaming
    async fn open_artifact(&self, path: &Path) -> Result<ArtifactStream>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::{BTreeMap, HashMap};
    use std::io::Cursor;
    use std::sync::Mutex;

    /// In-memory job store for core tests
    #[derive(Default)]
    pub struct InMemoryJobStore {
        sources: Mutex<BTreeMap<JobId, SourceText>>,
        failures: Mutex<HashMap<JobId, FailureRecord>>,
        artifacts: Mutex<HashMap<PathBuf, Vec<u8>>>,
    }

    impl InMemoryJobStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn put_artifact(&self, path: impl Into<PathBuf>, bytes: Vec<u8>) {
            self.artifacts.lock().unwrap().insert(path.into(), bytes);
        }

        pub fn source_count(&self) -> usize {
            self.sources.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl JobStore for InMemoryJobStore {
        fn source_path(&self, job_id: &JobId) -> PathBuf {
            PathBuf::from(format!("/mock/scratch/{}.py", job_id))
        }

        async fn persist_source(&self, job_id: &JobId, source: &SourceText) -> Result<PathBuf> {
            let mut sources = self.sources.lock().unwrap();
            if sources.contains_key(job_id) {
                return Err(AppError::Conflict(format!(
                    "source for job {} already exists",
                    job_id
                )));
            }
            sources.insert(job_id.clone(), source.clone());
            Ok(self.source_path(job_id))
        }

        async fn source_exists(&self, job_id: &JobId) -> Result<bool> {
            Ok(self.sources.lock().unwrap().contains_key(job_id))
        }

        async fn read_source(&self, job_id: &JobId) -> Result<Option<SourceText>> {
            Ok(self.sources.lock().unwrap().get(job_id).cloned())
        }

        async fn record_failure(&self, job_id: &JobId, record: &FailureRecord) -> Result<()> {
            self.failures
                .lock()
                .unwrap()
                .insert(job_id.clone(), record.clone());
            Ok(())
        }

        async fn read_failure(&self, job_id: &JobId) -> Result<Option<FailureRecord>> {
            Ok(self.failures.lock().unwrap().get(job_id).cloned())
        }

        async fn list_job_ids(&self) -> Result<Vec<JobId>> {
            Ok(self.sources.lock().unwrap().keys().cloned().collect())
        }

        async fn open_artifact(&self, path: &Path) -> Result<ArtifactStream> {
            let bytes = self
                .artifacts
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .unwrap_or_default();
            Ok(ArtifactStream {
                path: path.to_path_buf(),
                media_type: crate::domain::layout::ARTIFACT_MEDIA_TYPE.to_string(),
                size_bytes: bytes.len() as u64,
                reader: Box::new(Cursor::new(bytes)),
            })
        }
    }
}
