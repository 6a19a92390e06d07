// Submit Use Case (generate -> persist)

use crate::application::catalog::JobCatalog;
use crate::application::codegen::CodeGenerator;
use crate::domain::{Description, JobId, SourceText};
use crate::error::Result;
use crate::port::{IdProvider, JobStore, TimeProvider};
use std::path::PathBuf;
use tracing::info;

/// A job whose source is durably persisted and ready to render
#[derive(Debug, Clone)]
pub struct PreparedJob {
    pub job_id: JobId,
    pub source_path: PathBuf,
    pub source_text: SourceText,
}

/// Validate, generate and persist.
///
/// Nothing touches the filesystem until generation has succeeded, so a
/// `GenerationFailed` submission leaves no trace. Once this returns, status
/// queries report the job as Processing.
pub async fn prepare(
    generator: &CodeGenerator,
    store: &dyn JobStore,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
    catalog: &JobCatalog,
    raw_description: &str,
) -> Result<PreparedJob> {
    let description = Description::parse(raw_description)?;
    let job_id = id_provider.generate_id();

    let source_text = generator.generate(&description, &job_id).await?;
    let source_path = store.persist_source(&job_id, &source_text).await?;

    catalog.register(&job_id, description.as_str(), time_provider.now_millis());
    info!(
        job_id = %job_id,
        source_path = %source_path.display(),
        "Job accepted"
    );

    Ok(PreparedJob {
        job_id,
        source_path,
        source_text,
    })
}
