// Code generation use case: remote provider with deterministic fallback

pub mod rule_based;

pub use rule_based::{RuleBasedGenerator, SceneBlock, Shape};

use crate::domain::{Description, JobId, SourceText};
use crate::error::{AppError, Result};
use crate::port::{CodeGenerationProvider, GenerationError};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Which generators are consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodegenMode {
    /// Remote model first, rule-based output on any remote failure
    #[default]
    RemoteWithFallback,
    /// Never call the remote model
    RuleBased,
    /// Remote model only; a remote failure fails the submission
    RemoteOnly,
}

impl CodegenMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CodegenMode::RemoteWithFallback => "remote_with_fallback",
            CodegenMode::RuleBased => "rule_based",
            CodegenMode::RemoteOnly => "remote_only",
        }
    }
}

impl fmt::Display for CodegenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodegenMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "remote_with_fallback" | "remote" => Ok(CodegenMode::RemoteWithFallback),
            "rule_based" | "rules" => Ok(CodegenMode::RuleBased),
            "remote_only" => Ok(CodegenMode::RemoteOnly),
            other => Err(AppError::Config(format!(
                "unknown codegen mode '{}' (expected remote_with_fallback, rule_based or remote_only)",
                other
            ))),
        }
    }
}

/// Produces renderer source for a description.
///
/// The pipeline only sees this type; which provider answered is logged, not exposed.
pub struct CodeGenerator {
    mode: CodegenMode,
    primary: Option<Arc<dyn CodeGenerationProvider>>,
    fallback: RuleBasedGenerator,
    scene_name: String,
}

impl CodeGenerator {
    pub fn new(
        mode: CodegenMode,
        primary: Option<Arc<dyn CodeGenerationProvider>>,
        scene_name: impl Into<String>,
    ) -> Self {
        let scene_name = scene_name.into();
        Self {
            mode,
            primary,
            fallback: RuleBasedGenerator::new(scene_name.clone()),
            scene_name,
        }
    }

    /// Generator that never leaves the process
    pub fn rule_based(scene_name: impl Into<String>) -> Self {
        Self::new(CodegenMode::RuleBased, None, scene_name)
    }

    pub fn mode(&self) -> CodegenMode {
        self.mode
    }

    /// Generate source for one job.
    ///
    /// # Errors
    /// `AppError::GenerationFailed` only in `RemoteOnly` mode.
    pub async fn generate(&self, description: &Description, job_id: &JobId) -> Result<SourceText> {
        if self.mode == CodegenMode::RuleBased {
            return Ok(self.fallback.render(description.as_str()));
        }

        let error = match self.try_primary(description, job_id).await {
            Ok(source) => return Ok(source),
            Err(e) => e,
        };

        match self.mode {
            CodegenMode::RemoteOnly => Err(AppError::GenerationFailed(error.to_string())),
            _ => {
                warn!(
                    job_id = %job_id,
                    error = %error,
                    "Remote code generation failed, using rule-based fallback"
                );
                Ok(self.fallback.render(description.as_str()))
            }
        }
    }

    async fn try_primary(
        &self,
        description: &Description,
        job_id: &JobId,
    ) -> std::result::Result<SourceText, GenerationError> {
        let provider = self.primary.as_ref().ok_or_else(|| {
            GenerationError::Unavailable("no remote provider configured".to_string())
        })?;

        let started = Instant::now();
        let source = provider.generate(description, job_id).await?;
        if !source.declares_scene(&self.scene_name) {
            return Err(GenerationError::Malformed(format!(
                "response does not declare class {}",
                self.scene_name
            )));
        }

        info!(
            job_id = %job_id,
            provider = provider.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Source generated"
        );
        debug!(job_id = %job_id, bytes = source.as_str().len(), "Generated source size");
        Ok(source)
    }
}
