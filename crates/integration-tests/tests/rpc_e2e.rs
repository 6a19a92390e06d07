//! JSON-RPC End-to-End Tests
//!
//! Real server on an ephemeral port, driven through the SDK.

mod common;

use animagen_api_rpc::{RpcHandler, RpcServer, RpcServerConfig, ServerHandle};
use animagen_core::application::CodegenMode;
use animagen_core::port::system_probe::mocks::FixedSystemProbe;
use animagen_sdk::AnimagenClient;
use common::{Stack, RENDER_FAIL, RENDER_OK, RENDER_WHEN_RELEASED};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

async fn serve(stack: &Stack) -> (ServerHandle, AnimagenClient) {
    let handler = RpcHandler::new(
        stack.pipeline.clone(),
        Arc::new(FixedSystemProbe::new(3.0)),
        CodegenMode::RuleBased,
    );
    let config = RpcServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        port_attempts: 1,
    };
    let (handle, addr) = RpcServer::new(config, handler).start().await.unwrap();
    let client = AnimagenClient::connect(format!("http://{}", addr))
        .await
        .unwrap();
    (handle, client)
}

#[tokio::test]
async fn test_submit_status_download() {
    let stack = Stack::new(RENDER_OK).await;
    let (handle, client) = serve(&stack).await;

    let job = client.submit("Create a blue circle").await.unwrap();
    assert_eq!(job.state, "COMPLETED");
    assert_eq!(job.artifact_url, format!("/video/{}", job.job_id));
    assert!(job.source_text.contains("Circle(color=BLUE)"));

    let status = client.status(&job.job_id).await.unwrap();
    assert!(status.is_completed());
    assert!(status.failure.is_none());

    let out = TempDir::new().unwrap();
    let target = out.path().join("video.mp4");
    let written = client.download_artifact(&job.job_id, &target).await.unwrap();
    assert_eq!(written, 14);
    assert_eq!(std::fs::read(&target).unwrap(), b"fake-mp4-bytes");

    handle.stop().unwrap();
    println!("✅ submit -> status -> download over JSON-RPC");
}

#[tokio::test]
async fn test_error_kinds_cross_the_wire() {
    let stack = Stack::new(RENDER_FAIL).await;
    let (handle, client) = serve(&stack).await;

    let err = client.submit("a square").await.unwrap_err();
    assert_eq!(err.kind(), Some("EXECUTION_FAILED"));

    let missing = client
        .status("00000000-0000-4000-8000-000000000000")
        .await
        .unwrap_err();
    assert!(missing.is_not_found());

    let unsafe_id = client.status("../../etc/passwd").await.unwrap_err();
    assert_eq!(unsafe_id.kind(), Some("INVALID_REQUEST"));

    let empty = client.submit("   ").await.unwrap_err();
    assert_eq!(empty.kind(), Some("INVALID_REQUEST"));

    let jobs = client.list().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].state, "PROCESSING");
    assert_eq!(jobs[0].failure_kind.as_deref(), Some("EXECUTION_FAILED"));

    let status = client.status(&jobs[0].job_id).await.unwrap();
    let failure = status.failure.unwrap();
    assert_eq!(failure.kind, "EXECUTION_FAILED");
    assert!(failure.diagnostics.unwrap().contains("NameError"));

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_enqueue_then_poll() {
    let stack = Stack::new(RENDER_WHEN_RELEASED).await;
    let (handle, client) = serve(&stack).await;

    let job = client.enqueue("a triangle").await.unwrap();
    assert_eq!(job.state, "PROCESSING");
    assert_eq!(client.status(&job.job_id).await.unwrap().state, "PROCESSING");

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.render_capacity, 2);
    assert_eq!(health.codegen_mode, "rule_based");

    stack.release();
    let mut completed = false;
    for _ in 0..100 {
        if client.status(&job.job_id).await.unwrap().is_completed() {
            completed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(completed, "job never completed");

    let chunk = client.artifact_chunk(&job.job_id, 0, 3).await.unwrap();
    assert_eq!(chunk.bytes().unwrap(), b"rel");
    assert_eq!(chunk.total_bytes, 8);
    assert!(!chunk.eof);

    handle.stop().unwrap();
}
