// Port Layer - Interfaces for external dependencies

pub mod artifact_locator;
pub mod code_generation;
pub mod id_provider; // For deterministic testing
pub mod job_store;
pub mod render_executor;
pub mod system_probe;
pub mod time_provider;

// Re-exports
pub use artifact_locator::ArtifactLocator;
pub use code_generation::{CodeGenerationProvider, GenerationError};
pub use id_provider::IdProvider;
pub use job_store::{ArtifactRead, ArtifactStream, JobStore};
pub use render_executor::{RenderError, RenderExecutor};
pub use system_probe::{HostMetrics, SystemProbe};
pub use time_provider::TimeProvider;
