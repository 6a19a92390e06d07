// Code Generation Provider Port
// Variants: RemoteModel (infra-llm) and RuleBasedFallback (application::codegen)

use crate::domain::{Description, JobId, SourceText};
use async_trait::async_trait;
use thiserror::Error;

/// Provider failures. All of them trigger the rule-based fallback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider returned HTTP {0}")]
    HttpStatus(u16),

    #[error("provider timed out")]
    Timeout,

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Turns a description into renderer source
#[async_trait]
pub trait CodeGenerationProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn generate(
        &self,
        description: &Description,
        job_id: &JobId,
    ) -> Result<SourceText, GenerationError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stub provider returning a canned response
    pub struct StubProvider {
        response: Result<String, GenerationError>,
        calls: AtomicUsize,
    }

    impl StubProvider {
        pub fn responding(source: impl Into<String>) -> Self {
            Self {
                response: Ok(source.into()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(error: GenerationError) -> Self {
            Self {
                response: Err(error),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CodeGenerationProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn generate(
            &self,
            _description: &Description,
            _job_id: &JobId,
        ) -> Result<SourceText, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone().map(SourceText::new)
        }
    }
}
