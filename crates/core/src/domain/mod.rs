// Domain Layer - Pure business logic and entities

pub mod error;
pub mod job;
pub mod layout;
pub mod source;

// Re-exports
pub use error::DomainError;
pub use job::{Description, FailureKind, FailureRecord, JobId, JobState, JobStatus};
pub use layout::StorageLayout;
pub use source::SourceText;
