//! Animagen SDK - Rust Client Library
//!
//! Typed client for the Animagen daemon's JSON-RPC API.
//!
//! # Example
//!
//! ```no_run
//! use animagen_sdk::AnimagenClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AnimagenClient::connect("http://127.0.0.1:9527").await?;
//!
//!     let job = client.enqueue("Write the text \"Hello, Manim!\"").await?;
//!     let status = client.status(&job.job_id).await?;
//!     println!("{} is {}", job.job_id, status.state);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::AnimagenClient;
pub use error::{Result, SdkError};
pub use types::{
    ArtifactChunk, FailureInfo, HealthResponse, HostMetrics, JobSummary, StatusResponse,
    SubmitRequest, SubmitResponse,
};
