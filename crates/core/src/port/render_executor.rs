// Render Executor Port
// Abstraction over the external renderer subprocess

use crate::domain::{FailureKind, JobId};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Render failures. Each variant is a distinct, non-retried failure class.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Renderer could not be spawned or exited non-zero
    #[error("renderer execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// Renderer exceeded its wall-clock deadline and was killed
    #[error("renderer timed out after {}s", timeout.as_secs_f64())]
    Timeout { timeout: Duration },

    /// Renderer reported success but nothing recognizable was produced
    #[error("renderer exited successfully but no artifact was found under {searched}")]
    ArtifactNotFound { searched: String },
}

impl RenderError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            RenderError::ExecutionFailed { .. } => FailureKind::ExecutionFailed,
            RenderError::Timeout { .. } => FailureKind::Timeout,
            RenderError::ArtifactNotFound { .. } => FailureKind::ArtifactNotFound,
        }
    }

    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            RenderError::ExecutionFailed { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}

/// Render Executor trait
///
/// Implementations:
/// - SubprocessRenderExecutor: spawns the renderer under a deadline
/// - mocks::MockRenderExecutor: scripted outcomes for pipeline tests
///
/// One call is one attempt. Retry policy, if any, belongs to the caller.
#[async_trait]
pub trait RenderExecutor: Send + Sync {
    /// Render `source_path` for `job_id` and return the produced artifact path
    ///
    /// # Errors
    /// - RenderError::ExecutionFailed on spawn failure or non-zero exit
    /// - RenderError::Timeout if the deadline expires (process group is killed)
    /// - RenderError::ArtifactNotFound if the renderer produced nothing
    async fn execute(&self, source_path: &Path, job_id: &JobId) -> Result<PathBuf, RenderError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::port::artifact_locator::mocks::MockArtifactLocator;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    /// Mock executor behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Produce the artifact (registered with the attached locator)
        Success,
        /// Exit non-zero with the given stderr
        Fail(String),
        /// Report a deadline expiry
        Timeout(Duration),
        /// Exit zero without output
        NoArtifact,
    }

    /// Mock Render Executor for testing
    pub struct MockRenderExecutor {
        behavior: Arc<Mutex<MockBehavior>>,
        locator: Option<Arc<MockArtifactLocator>>,
        release: Option<Arc<Notify>>,
        calls: Arc<Mutex<Vec<(PathBuf, JobId)>>>,
    }

    impl MockRenderExecutor {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                locator: None,
                release: None,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Succeeding executor that marks artifacts present in `locator`
        pub fn producing(locator: Arc<MockArtifactLocator>) -> Self {
            let mut executor = Self::new(MockBehavior::Success);
            executor.locator = Some(locator);
            executor
        }

        pub fn new_fail(stderr: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(stderr.into()))
        }

        /// Hold every execution until `release` is notified
        pub fn gated_by(mut self, release: Arc<Notify>) -> Self {
            self.release = Some(release);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls(&self) -> Vec<(PathBuf, JobId)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RenderExecutor for MockRenderExecutor {
        async fn execute(
            &self,
            source_path: &Path,
            job_id: &JobId,
        ) -> Result<PathBuf, RenderError> {
            self.calls
                .lock()
                .unwrap()
                .push((source_path.to_path_buf(), job_id.clone()));

            if let Some(release) = &self.release {
                release.notified().await;
            }

            let behavior = self.behavior.lock().unwrap().clone();
            match behavior {
                MockBehavior::Success => {
                    let path = PathBuf::from(format!("/mock/media/{}.mp4", job_id));
                    if let Some(locator) = &self.locator {
                        locator.mark_present(job_id, path.clone());
                    }
                    Ok(path)
                }
                MockBehavior::Fail(stderr) => Err(RenderError::ExecutionFailed {
                    exit_code: Some(1),
                    stderr,
                }),
                MockBehavior::Timeout(timeout) => Err(RenderError::Timeout { timeout }),
                MockBehavior::NoArtifact => Err(RenderError::ArtifactNotFound {
                    searched: format!("/mock/media/{}", job_id),
                }),
            }
        }
    }
}
