// Animagen Infrastructure - Filesystem Adapters
// Implements: JobStore, ArtifactLocator

mod artifact_locator;
mod job_store;

pub use artifact_locator::FsArtifactLocator;
pub use job_store::FsJobStore;
