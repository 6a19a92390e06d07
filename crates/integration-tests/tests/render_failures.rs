//! Render Failure Tests
//!
//! Each renderer failure mode surfaces as its own error kind and leaves the
//! job in Processing with a failure record beside the source.

mod common;

use animagen_core::domain::{FailureKind, JobState};
use animagen_core::ErrorKind;
use common::{
    Stack, RENDER_ELSEWHERE, RENDER_FAIL, RENDER_HANG, RENDER_NOTHING, RENDER_PARTIAL_ONLY,
};
use std::time::{Duration, Instant};

fn only_job(stack: &Stack) -> animagen_core::domain::JobId {
    let jobs = stack.catalog.list();
    assert_eq!(jobs.len(), 1);
    jobs[0].job_id.clone()
}

#[tokio::test]
async fn test_nonzero_exit_is_execution_failed() {
    let stack = Stack::new(RENDER_FAIL).await;

    let err = stack.pipeline.submit("a square").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
    assert!(err.diagnostics().unwrap().contains("NameError"));

    let id = only_job(&stack);
    assert!(stack.layout.source_path(&id).exists());
    assert!(stack.layout.failure_path(&id).exists());

    let status = stack.pipeline.status(id.as_str()).await.unwrap();
    assert_eq!(status.state, JobState::Processing);
    let failure = status.failure.unwrap();
    assert_eq!(failure.kind, FailureKind::ExecutionFailed);
    assert!(failure.diagnostics.unwrap().contains("Sqare"));
}

#[tokio::test]
async fn test_hanging_renderer_times_out() {
    let timeout = Duration::from_millis(500);
    let stack = Stack::with_timeout(RENDER_HANG, timeout).await;

    let started = Instant::now();
    let err = stack.pipeline.submit("a circle").await.unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(elapsed >= timeout, "returned early: {:?}", elapsed);
    // deadline + kill grace + scheduling slack
    assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);

    let id = only_job(&stack);
    let status = stack.pipeline.status(id.as_str()).await.unwrap();
    assert_eq!(status.state, JobState::Processing);
    assert_eq!(status.failure.unwrap().kind, FailureKind::Timeout);

    println!("✅ Hanging renderer terminated after {:?}", elapsed);
}

#[tokio::test]
async fn test_clean_exit_without_output_is_artifact_not_found() {
    let stack = Stack::new(RENDER_NOTHING).await;

    let err = stack.pipeline.submit("a circle").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArtifactNotFound);

    let id = only_job(&stack);
    let status = stack.pipeline.status(id.as_str()).await.unwrap();
    assert_eq!(status.state, JobState::Processing);
    assert_eq!(status.failure.unwrap().kind, FailureKind::ArtifactNotFound);
}

#[tokio::test]
async fn test_partial_segments_are_not_an_artifact() {
    let stack = Stack::new(RENDER_PARTIAL_ONLY).await;
    let err = stack.pipeline.submit("a circle").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArtifactNotFound);
}

#[tokio::test]
async fn test_nonstandard_output_is_discovered() {
    let stack = Stack::new(RENDER_ELSEWHERE).await;

    let receipt = stack.pipeline.submit("a circle").await.unwrap();
    assert_ne!(
        receipt.artifact_path,
        stack.layout.canonical_artifact_path(&receipt.job_id)
    );
    assert!(receipt.artifact_path.ends_with("1080p60/OtherScene.mp4"));

    let status = stack.pipeline.status(receipt.job_id.as_str()).await.unwrap();
    assert_eq!(status.state, JobState::Completed);
    assert_eq!(status.artifact_path, Some(receipt.artifact_path));
}

#[tokio::test]
async fn test_list_survives_an_unreadable_failure_record() {
    let stack = Stack::new(RENDER_FAIL).await;
    stack.pipeline.submit("a square").await.unwrap_err();
    stack.pipeline.submit("a circle").await.unwrap_err();

    let jobs = stack.catalog.list();
    assert_eq!(jobs.len(), 2);
    let corrupted = jobs[0].job_id.clone();
    std::fs::write(stack.layout.failure_path(&corrupted), "{ not json").unwrap();

    let records = stack.pipeline.list().await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.last_state == JobState::Processing));

    // The healthy job still reports normally; only the damaged one errors
    let healthy = &jobs[1].job_id;
    let status = stack.pipeline.status(healthy.as_str()).await.unwrap();
    assert_eq!(status.failure.unwrap().kind, FailureKind::ExecutionFailed);
    assert!(stack.pipeline.status(corrupted.as_str()).await.is_err());
}
