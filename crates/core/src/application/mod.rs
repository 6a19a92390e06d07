// Application Layer - Use Cases and Business Logic

pub mod admission;
pub mod catalog;
pub mod codegen;
pub mod constants;
pub mod pipeline;
pub mod probe;
pub mod recovery;

// Re-exports
pub use admission::{RenderGate, RenderPermit};
pub use catalog::{JobCatalog, JobRecord};
pub use codegen::{CodeGenerator, CodegenMode, RuleBasedGenerator};
pub use pipeline::{
    artifact_url, AcceptedJob, ArtifactChunk, JobPipeline, PipelineConfig, PipelinePorts,
    SubmissionReceipt,
};
pub use probe::StateProbe;
pub use recovery::{RecoveryReport, RecoveryService};
