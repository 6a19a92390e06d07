// Filesystem JobStore Implementation

use animagen_core::domain::layout::{ARTIFACT_EXTENSION, ARTIFACT_MEDIA_TYPE};
use animagen_core::domain::{FailureRecord, JobId, SourceText, StorageLayout};
use animagen_core::error::{AppError, Result};
use animagen_core::port::{ArtifactStream, JobStore};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

pub struct FsJobStore {
    layout: StorageLayout,
}

impl FsJobStore {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Create the scratch and media roots if missing
    pub async fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.layout.scratch_root).await?;
        fs::create_dir_all(&self.layout.media_root).await?;
        info!(
            scratch_root = %self.layout.scratch_root.display(),
            media_root = %self.layout.media_root.display(),
            "Storage directories ready"
        );
        Ok(())
    }

    fn conflict(job_id: &JobId) -> AppError {
        AppError::Conflict(format!("source for job {} already exists", job_id))
    }

    async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        file.write_all(bytes).await?;
        file.sync_all().await
    }
}

fn media_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(ARTIFACT_EXTENSION) => ARTIFACT_MEDIA_TYPE,
        _ => FALLBACK_MEDIA_TYPE,
    }
}

#[async_trait]
impl JobStore for FsJobStore {
    fn source_path(&self, job_id: &JobId) -> PathBuf {
        self.layout.source_path(job_id)
    }

    async fn persist_source(&self, job_id: &JobId, source: &SourceText) -> Result<PathBuf> {
        let staging = self.layout.staging_path(job_id);
        let target = self.layout.source_path(job_id);

        if fs::try_exists(&target).await? {
            return Err(Self::conflict(job_id));
        }

        // Staging is created exclusively, so a concurrent writer for the same id loses here
        match Self::write_synced(&staging, source.as_str().as_bytes()).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(Self::conflict(job_id)),
            Err(e) => {
                let _ = fs::remove_file(&staging).await;
                return Err(e.into());
            }
        }

        // hard_link never replaces an existing target: the first source wins
        let linked = fs::hard_link(&staging, &target).await;
        if let Err(e) = fs::remove_file(&staging).await {
            warn!(path = %staging.display(), error = %e, "Failed to remove staging file");
        }
        match linked {
            Ok(()) => {
                debug!(job_id = %job_id, path = %target.display(), "Source persisted");
                Ok(target)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(Self::conflict(job_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn source_exists(&self, job_id: &JobId) -> Result<bool> {
        Ok(fs::try_exists(self.layout.source_path(job_id)).await?)
    }

    async fn read_source(&self, job_id: &JobId) -> Result<Option<SourceText>> {
        match fs::read_to_string(self.layout.source_path(job_id)).await {
            Ok(text) => Ok(Some(SourceText::new(text))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn record_failure(&self, job_id: &JobId, record: &FailureRecord) -> Result<()> {
        let path = self.layout.failure_path(job_id);
        let tmp = path.with_extension("json.partial");
        let bytes = serde_json::to_vec_pretty(record)?;

        let _ = fs::remove_file(&tmp).await;
        Self::write_synced(&tmp, &bytes).await?;
        fs::rename(&tmp, &path).await?;

        debug!(job_id = %job_id, path = %path.display(), "Failure record written");
        Ok(())
    }

    async fn read_failure(&self, job_id: &JobId) -> Result<Option<FailureRecord>> {
        match fs::read(self.layout.failure_path(job_id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_job_ids(&self) -> Result<Vec<JobId>> {
        let mut entries = match fs::read_dir(&self.layout.scratch_root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(id) = self.layout.job_id_from_source_file(&entry.path()) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn open_artifact(&self, path: &Path) -> Result<ArtifactStream> {
        let file = match File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!(
                    "artifact {} disappeared",
                    path.display()
                )))
            }
            Err(e) => return Err(e.into()),
        };
        let size_bytes = file.metadata().await?.len();

        Ok(ArtifactStream {
            path: path.to_path_buf(),
            media_type: media_type_for(path).to_string(),
            size_bytes,
            reader: Box::new(file),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use animagen_core::domain::FailureKind;
    use animagen_core::ErrorKind as AppErrorKind;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    fn store(dir: &TempDir) -> FsJobStore {
        FsJobStore::new(StorageLayout::new(
            dir.path().join("temp"),
            dir.path().join("media"),
        ))
    }

    fn id(s: &str) -> JobId {
        JobId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_persist_source_once() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.ensure_dirs().await.unwrap();

        let first = SourceText::new("from manim import *\n# first\n");
        let path = store.persist_source(&id("job"), &first).await.unwrap();
        assert_eq!(path, dir.path().join("temp/job.py"));
        assert!(store.source_exists(&id("job")).await.unwrap());

        let err = store
            .persist_source(&id("job"), &SourceText::new("# second"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AppErrorKind::Conflict);
        assert_eq!(store.read_source(&id("job")).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_no_staging_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.ensure_dirs().await.unwrap();
        store
            .persist_source(&id("job"), &SourceText::new("x"))
            .await
            .unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path().join("temp"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["job.py".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_writers_single_winner() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store(&dir));
        store.ensure_dirs().await.unwrap();

        let mut handles = Vec::new();
        for n in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .persist_source(&id("race"), &SourceText::new(format!("# writer {}", n)))
                    .await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(e) => assert_eq!(e.kind(), AppErrorKind::Conflict),
            }
        }
        assert_eq!(winners, 1);
        let text = store.read_source(&id("race")).await.unwrap().unwrap();
        assert!(text.as_str().starts_with("# writer "));
    }

    #[tokio::test]
    async fn test_missing_source_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(!store.source_exists(&id("nope")).await.unwrap());
        assert_eq!(store.read_source(&id("nope")).await.unwrap(), None);
        assert_eq!(store.read_failure(&id("nope")).await.unwrap(), None);
        assert!(store.list_job_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_record_is_replaced() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.ensure_dirs().await.unwrap();

        let mut record = FailureRecord {
            kind: FailureKind::ExecutionFailed,
            message: "exit 1".to_string(),
            diagnostics: Some("Traceback".to_string()),
            recorded_at: 1,
        };
        store.record_failure(&id("job"), &record).await.unwrap();
        record.kind = FailureKind::Timeout;
        record.recorded_at = 2;
        store.record_failure(&id("job"), &record).await.unwrap();

        assert_eq!(store.read_failure(&id("job")).await.unwrap(), Some(record));
        assert!(dir.path().join("temp/job.failure.json").exists());
    }

    #[tokio::test]
    async fn test_list_only_sees_sources() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.ensure_dirs().await.unwrap();
        for name in ["b", "a"] {
            store
                .persist_source(&id(name), &SourceText::new("x"))
                .await
                .unwrap();
        }
        std::fs::write(dir.path().join("temp/a.failure.json"), "{}").unwrap();
        std::fs::write(dir.path().join("temp/notes.txt"), "").unwrap();
        std::fs::write(dir.path().join("temp/bad name.py"), "").unwrap();
        std::fs::create_dir(dir.path().join("temp/dir.py")).unwrap();

        let ids = store.list_job_ids().await.unwrap();
        assert_eq!(ids, vec![id("a"), id("b")]);
    }

    #[tokio::test]
    async fn test_open_artifact() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let path = dir.path().join("ManimScene.mp4");
        std::fs::write(&path, b"video-bytes").unwrap();

        let mut stream = store.open_artifact(&path).await.unwrap();
        assert_eq!(stream.media_type, "video/mp4");
        assert_eq!(stream.size_bytes, 11);
        let mut buf = Vec::new();
        stream.reader.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"video-bytes");

        let err = store
            .open_artifact(&dir.path().join("gone.mp4"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AppErrorKind::NotFound);
    }
}
