//! Pipeline End-to-End Tests
//!
//! Real filesystem store, real locator, real subprocess; the renderer is a
//! shell script.

mod common;

use animagen_core::domain::{FailureKind, JobState};
use common::{Stack, RENDER_FAIL, RENDER_OK, RENDER_WHEN_RELEASED};
use std::collections::HashSet;

#[tokio::test]
async fn test_submit_renders_to_canonical_path() {
    let stack = Stack::new(RENDER_OK).await;

    let receipt = stack.pipeline.submit("Create a circle").await.unwrap();

    assert_eq!(
        receipt.artifact_path,
        stack.layout.canonical_artifact_path(&receipt.job_id)
    );
    assert_eq!(std::fs::read(&receipt.artifact_path).unwrap(), b"fake-mp4-bytes");
    assert_eq!(receipt.artifact_url, format!("/video/{}", receipt.job_id));

    let on_disk = stack.source_on_disk(&receipt.job_id);
    assert_eq!(on_disk, receipt.source_text.as_str());
    assert!(on_disk.starts_with("from manim import *"));
    assert!(on_disk.contains("class ManimScene(Scene)"));
    assert_eq!(on_disk.matches("Circle(").count(), 1);

    let status = stack.pipeline.status(receipt.job_id.as_str()).await.unwrap();
    assert_eq!(status.state, JobState::Completed);
    assert_eq!(status.artifact_path, Some(receipt.artifact_path));

    println!("✅ Submission rendered to the canonical path");
}

#[tokio::test]
async fn test_quoted_text_reaches_renderer_source() {
    let stack = Stack::new(RENDER_OK).await;

    let receipt = stack
        .pipeline
        .submit(r#"Write the text "Hello, Manim!""#)
        .await
        .unwrap();

    let on_disk = stack.source_on_disk(&receipt.job_id);
    assert!(on_disk.contains(r#"Text("Hello, Manim!", color=YELLOW)"#));
}

#[tokio::test]
async fn test_status_only_moves_forward() {
    let stack = Stack::new(RENDER_WHEN_RELEASED).await;

    let accepted = stack.pipeline.enqueue("a square that rotates").await.unwrap();
    let id = accepted.job_id.clone();

    let mut seen = vec![JobState::NotFound];
    for _ in 0..5 {
        let state = stack.pipeline.status(id.as_str()).await.unwrap().state;
        assert_eq!(state, JobState::Processing);
        seen.push(state);
    }

    stack.release();
    let artifact = accepted.completion.await.unwrap().unwrap();
    assert_eq!(std::fs::read(&artifact).unwrap(), b"released");

    for _ in 0..3 {
        seen.push(stack.pipeline.status(id.as_str()).await.unwrap().state);
    }
    assert!(seen.windows(2).all(|w| w[0].can_advance_to(w[1])));
    assert_eq!(seen.last(), Some(&JobState::Completed));
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let stack = Stack::new(RENDER_OK).await;
    let status = stack
        .pipeline
        .status("00000000-0000-4000-8000-000000000000")
        .await
        .unwrap();
    assert_eq!(status.state, JobState::NotFound);
    assert!(stack.pipeline.fetch_artifact("nope").await.is_err());
}

#[tokio::test]
async fn test_concurrent_jobs_do_not_collide() {
    let stack = Stack::new(RENDER_OK).await;

    let mut handles = Vec::new();
    for i in 0..6 {
        let pipeline = stack.pipeline.clone();
        handles.push(tokio::spawn(async move {
            pipeline.submit(&format!("circle number {}", i)).await
        }));
    }

    let mut ids = HashSet::new();
    let mut artifacts = HashSet::new();
    for handle in handles {
        let receipt = handle.await.unwrap().unwrap();
        ids.insert(receipt.job_id.clone());
        artifacts.insert(receipt.artifact_path.clone());
    }
    assert_eq!(ids.len(), 6);
    assert_eq!(artifacts.len(), 6);
    assert_eq!(stack.pipeline.render_gate().in_use(), 0);

    println!("✅ 6 concurrent jobs rendered into disjoint subtrees");
}

#[tokio::test]
async fn test_artifact_chunks_cover_the_file() {
    let stack = Stack::new(RENDER_OK).await;
    let receipt = stack.pipeline.submit("a triangle").await.unwrap();

    let mut collected = Vec::new();
    let mut offset = 0;
    loop {
        let chunk = stack
            .pipeline
            .read_artifact_chunk(receipt.job_id.as_str(), offset, 4)
            .await
            .unwrap();
        assert_eq!(chunk.media_type, "video/mp4");
        assert_eq!(chunk.total_bytes, 14);
        offset += chunk.bytes.len() as u64;
        collected.extend(chunk.bytes);
        if chunk.eof {
            break;
        }
    }
    assert_eq!(collected, b"fake-mp4-bytes");
}

#[tokio::test]
async fn test_catalog_rebuilt_after_restart() {
    let first = Stack::new(RENDER_OK).await;
    let done = first.pipeline.submit("a circle").await.unwrap();

    let failing = first.reopen(RENDER_FAIL).await;
    let err = failing.pipeline.submit("a square").await.unwrap_err();
    assert_eq!(err.kind(), animagen_core::ErrorKind::ExecutionFailed);

    let restarted = first.reopen(RENDER_OK).await;
    let report = restarted.recover().await;
    assert_eq!(report.scanned, 2);
    assert_eq!(report.completed, 1);
    assert_eq!(report.failed, 1);

    let jobs = restarted.pipeline.list().await.unwrap();
    assert_eq!(jobs.len(), 2);
    let completed = jobs.iter().find(|r| r.job_id == done.job_id).unwrap();
    assert_eq!(completed.last_state, JobState::Completed);
    assert!(completed.description.is_none());
    let failed = jobs.iter().find(|r| r.job_id != done.job_id).unwrap();
    assert_eq!(failed.last_state, JobState::Processing);
    assert_eq!(failed.failure_kind, Some(FailureKind::ExecutionFailed));

    println!("✅ Catalog rebuilt from the scratch root");
}
