// Filesystem ArtifactLocator Implementation

use animagen_core::domain::layout::PARTIAL_OUTPUT_DIR;
use animagen_core::domain::{JobId, StorageLayout};
use animagen_core::port::ArtifactLocator;
use async_trait::async_trait;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

pub struct FsArtifactLocator {
    layout: StorageLayout,
}

impl FsArtifactLocator {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }
}

/// Smallest (bytewise) path under `root` with the given extension.
///
/// Renderer segment folders are pruned; symlinks are not followed.
fn search(root: &Path, extension: &str) -> io::Result<Option<PathBuf>> {
    if !root.is_dir() {
        return Ok(None);
    }

    let mut best: Option<PathBuf> = None;
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && e.file_name() == PARTIAL_OUTPUT_DIR))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if !matches {
            continue;
        }

        let candidate = entry.into_path();
        let better = best
            .as_ref()
            .map_or(true, |b| candidate.as_os_str() < b.as_os_str());
        if better {
            best = Some(candidate);
        }
    }
    Ok(best)
}

#[async_trait]
impl ArtifactLocator for FsArtifactLocator {
    fn canonical_path(&self, job_id: &JobId) -> PathBuf {
        self.layout.canonical_artifact_path(job_id)
    }

    fn search_root(&self, job_id: &JobId) -> PathBuf {
        self.layout.job_media_root(job_id)
    }

    async fn discover(&self, job_id: &JobId) -> io::Result<Option<PathBuf>> {
        let root = self.search_root(job_id);
        let extension = self.layout.artifact_extension.clone();

        let found = tokio::task::spawn_blocking(move || search(&root, &extension))
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))??;

        match &found {
            Some(path) => info!(
                job_id = %job_id,
                path = %path.display(),
                "Artifact found outside the canonical path"
            ),
            None => debug!(job_id = %job_id, "No artifact discovered"),
        }
        Ok(found)
    }
}
