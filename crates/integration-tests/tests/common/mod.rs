//! Shared fixtures: the real filesystem store, locator and subprocess
//! executor, with `/bin/sh` scripts standing in for the renderer.
//!
//! Scripts are invoked as `sh <script> <source> <scene> -ql --media_dir <media_root>`.

#![allow(dead_code)]

use animagen_core::application::{
    CodeGenerator, JobCatalog, JobPipeline, PipelineConfig, PipelinePorts, RecoveryReport,
    RecoveryService, StateProbe,
};
use animagen_core::domain::{JobId, StorageLayout};
use animagen_core::port::id_provider::UuidProvider;
use animagen_core::port::time_provider::SystemTimeProvider;
use animagen_core::port::{ArtifactLocator, JobStore};
use animagen_infra_fs::{FsArtifactLocator, FsJobStore};
use animagen_infra_system::{allowlisted_env, RendererConfig, SubprocessRenderExecutor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Writes the artifact where the renderer normally puts it
pub const RENDER_OK: &str = r#"out="$5/videos/$(basename "$1" .py)/480p15"
mkdir -p "$out"
printf 'fake-mp4-bytes' > "$out/$2.mp4"
"#;

/// Writes the artifact under an unexpected quality folder and name
pub const RENDER_ELSEWHERE: &str = r#"out="$5/videos/$(basename "$1" .py)/1080p60"
mkdir -p "$out"
printf 'elsewhere' > "$out/OtherScene.mp4"
"#;

/// Leaves only per-segment clips behind
pub const RENDER_PARTIAL_ONLY: &str = r#"out="$5/videos/$(basename "$1" .py)/480p15/partial_movie_files/$2"
mkdir -p "$out"
printf 'segment' > "$out/0001.mp4"
"#;

pub const RENDER_FAIL: &str = r#"echo "NameError: name 'Sqare' is not defined" >&2
exit 1
"#;

pub const RENDER_NOTHING: &str = "exit 0\n";

pub const RENDER_HANG: &str = "exec sleep 30\n";

/// Renders once `<root>/release` exists
pub const RENDER_WHEN_RELEASED: &str = r#"root="$(dirname "$(dirname "$1")")"
while [ ! -f "$root/release" ]; do sleep 0.05; done
out="$5/videos/$(basename "$1" .py)/480p15"
mkdir -p "$out"
printf 'released' > "$out/$2.mp4"
"#;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Stack {
    dir: Option<TempDir>,
    pub root: PathBuf,
    pub layout: StorageLayout,
    pub store: Arc<FsJobStore>,
    pub catalog: Arc<JobCatalog>,
    pub pipeline: JobPipeline,
}

impl Stack {
    pub async fn new(script: &str) -> Self {
        Self::with_timeout(script, DEFAULT_TIMEOUT).await
    }

    pub async fn with_timeout(script: &str, timeout: Duration) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let mut stack = Self::build(&root, script, timeout).await;
        stack.dir = Some(dir);
        stack
    }

    /// A fresh process over the same directories (simulated restart)
    pub async fn reopen(&self, script: &str) -> Self {
        Self::build(&self.root, script, DEFAULT_TIMEOUT).await
    }

    async fn build(root: &Path, script: &str, timeout: Duration) -> Self {
        let layout = StorageLayout::new(root.join("temp"), root.join("media"));
        let store = Arc::new(FsJobStore::new(layout.clone()));
        store.ensure_dirs().await.unwrap();
        let locator: Arc<dyn ArtifactLocator> = Arc::new(FsArtifactLocator::new(layout.clone()));

        let script_path = root.join("render.sh");
        std::fs::write(&script_path, script).unwrap();

        let mut renderer = RendererConfig::manim(&layout.media_root);
        renderer.program = "/bin/sh".to_string();
        renderer.base_args = vec![script_path.to_string_lossy().to_string()];
        renderer.timeout = timeout;
        renderer.kill_grace = Duration::from_millis(500);
        renderer.env = allowlisted_env(std::env::vars(), &["PATH".to_string()]);
        let executor = Arc::new(SubprocessRenderExecutor::new(renderer, locator.clone()));

        let catalog = Arc::new(JobCatalog::new());
        let pipeline = JobPipeline::new(
            PipelinePorts {
                generator: Arc::new(CodeGenerator::rule_based(layout.scene_name.clone())),
                store: store.clone(),
                locator,
                executor,
                id_provider: Arc::new(UuidProvider),
                time_provider: Arc::new(SystemTimeProvider),
            },
            catalog.clone(),
            PipelineConfig::default(),
        );

        Self {
            dir: None,
            root: root.to_path_buf(),
            layout,
            store,
            catalog,
            pipeline,
        }
    }

    pub async fn recover(&self) -> RecoveryReport {
        let store: Arc<dyn JobStore> = self.store.clone();
        let locator: Arc<dyn ArtifactLocator> =
            Arc::new(FsArtifactLocator::new(self.layout.clone()));
        RecoveryService::new(
            store.clone(),
            StateProbe::new(store, locator),
            self.catalog.clone(),
        )
        .rebuild_catalog()
        .await
        .unwrap()
    }

    pub fn release(&self) {
        std::fs::write(self.root.join("release"), "").unwrap();
    }

    pub fn source_on_disk(&self, job_id: &JobId) -> String {
        std::fs::read_to_string(self.layout.source_path(job_id)).unwrap()
    }
}
