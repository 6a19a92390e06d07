// Artifact Locator Port
// Canonical path + degraded search for a job's rendered video

use crate::domain::JobId;
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;

#[async_trait]
pub trait ArtifactLocator: Send + Sync {
    /// Where the renderer is expected to write the artifact (pure)
    fn canonical_path(&self, job_id: &JobId) -> PathBuf;

    /// Root searched by [`ArtifactLocator::discover`]
    fn search_root(&self, job_id: &JobId) -> PathBuf;

    /// Search the job's output root for any artifact-like file.
    ///
    /// Tie-break: the lexicographically smallest path wins, so repeated calls
    /// over an unchanged tree return the same file.
    async fn discover(&self, job_id: &JobId) -> io::Result<Option<PathBuf>>;

    /// Canonical path when it exists, otherwise the discovered one
    async fn locate(&self, job_id: &JobId) -> io::Result<Option<PathBuf>> {
        let canonical = self.canonical_path(job_id);
        if tokio::fs::try_exists(&canonical).await? {
            return Ok(Some(canonical));
        }
        self.discover(job_id).await
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory locator: artifacts exist once `mark_present` is called
    #[derive(Default)]
    pub struct MockArtifactLocator {
        present: Mutex<HashMap<JobId, PathBuf>>,
    }

    impl MockArtifactLocator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn mark_present(&self, job_id: &JobId, path: PathBuf) {
            self.present.lock().unwrap().insert(job_id.clone(), path);
        }
    }

    #[async_trait]
    impl ArtifactLocator for MockArtifactLocator {
        fn canonical_path(&self, job_id: &JobId) -> PathBuf {
            PathBuf::from(format!("/mock/media/{}.mp4", job_id))
        }

        fn search_root(&self, job_id: &JobId) -> PathBuf {
            PathBuf::from(format!("/mock/media/{}", job_id))
        }

        async fn discover(&self, job_id: &JobId) -> io::Result<Option<PathBuf>> {
            Ok(self.present.lock().unwrap().get(job_id).cloned())
        }

        async fn locate(&self, job_id: &JobId) -> io::Result<Option<PathBuf>> {
            self.discover(job_id).await
        }
    }
}
