//! Animagen Daemon - Main Entry Point
//!
//! Composition root: wires the filesystem store, renderer subprocess and code
//! generators into the job pipeline and serves it over JSON-RPC.

mod config;
mod logging;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use animagen_api_rpc::{RpcHandler, RpcServer};
use animagen_core::application::{
    CodeGenerator, CodegenMode, JobCatalog, JobPipeline, PipelinePorts, RecoveryService,
    StateProbe,
};
use animagen_core::port::id_provider::UuidProvider;
use animagen_core::port::time_provider::SystemTimeProvider;
use animagen_core::port::{ArtifactLocator, CodeGenerationProvider, JobStore};
use animagen_infra_fs::{FsArtifactLocator, FsJobStore};
use animagen_infra_llm::GeminiProvider;
use animagen_infra_system::{SubprocessRenderExecutor, SystemProbeImpl};

use crate::config::DaemonConfig;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration and logging
    let config = DaemonConfig::from_env().context("Failed to load configuration")?;
    let _log_guard = logging::init(&config.log)?;

    info!("Animagen daemon v{} starting...", animagen_core::VERSION);

    // 2. Storage
    let layout = config.layout.clone();
    let fs_store = FsJobStore::new(layout.clone());
    fs_store
        .ensure_dirs()
        .await
        .context("Failed to create storage directories")?;
    let store: Arc<dyn JobStore> = Arc::new(fs_store);
    let locator: Arc<dyn ArtifactLocator> = Arc::new(FsArtifactLocator::new(layout.clone()));

    // 3. Code generation
    let remote: Option<Arc<dyn CodeGenerationProvider>> = match config.gemini.clone() {
        Some(gemini) if config.codegen_mode != CodegenMode::RuleBased => {
            info!(model = %gemini.model, "Remote code generation enabled");
            let provider: Arc<dyn CodeGenerationProvider> = Arc::new(
                GeminiProvider::new(gemini)
                    .map_err(|e| anyhow::anyhow!("Gemini client setup failed: {}", e))?
                    .with_scene_name(layout.scene_name.clone()),
            );
            Some(provider)
        }
        _ => None,
    };
    if remote.is_none() && config.codegen_mode == CodegenMode::RemoteWithFallback {
        warn!("No Gemini API key configured; using rule-based generation only");
    }
    let generator = Arc::new(CodeGenerator::new(
        config.codegen_mode,
        remote,
        layout.scene_name.clone(),
    ));

    // 4. Renderer
    let executor = Arc::new(SubprocessRenderExecutor::new(
        config.renderer.clone(),
        locator.clone(),
    ));
    info!(
        program = %config.renderer.program,
        timeout_secs = config.renderer.timeout.as_secs(),
        max_concurrent = config.pipeline.max_concurrent_renders,
        "Renderer configured"
    );

    // 5. Rebuild the job catalog from the scratch root
    let catalog = Arc::new(JobCatalog::new());
    let recovery = RecoveryService::new(
        store.clone(),
        StateProbe::new(store.clone(), locator.clone()),
        catalog.clone(),
    );
    match recovery.rebuild_catalog().await {
        Ok(report) => info!(
            scanned = report.scanned,
            completed = report.completed,
            processing = report.processing,
            failed = report.failed,
            "Job catalog rebuilt"
        ),
        Err(e) => error!(error = %e, "Job catalog rebuild failed"),
    }

    // 6. Pipeline + JSON-RPC server
    let pipeline = JobPipeline::new(
        PipelinePorts {
            generator,
            store,
            locator,
            executor,
            id_provider: Arc::new(UuidProvider),
            time_provider: Arc::new(SystemTimeProvider),
        },
        catalog,
        config.pipeline.clone(),
    );
    let system_probe = Arc::new(SystemProbeImpl::new(layout.media_root.clone()));
    let handler = RpcHandler::new(pipeline, system_probe, config.codegen_mode);

    let (rpc_handle, addr) = RpcServer::new(config.rpc.clone(), handler)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!(addr = %addr, "System ready. Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, rpc_handle.stopped())
        .await
        .is_err()
    {
        warn!("RPC server did not stop within the shutdown timeout");
    }

    info!("Shutdown complete.");
    Ok(())
}
