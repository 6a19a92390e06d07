//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error objects. The `data` member
//! carries `{kind, http_status, detail?}` so clients can branch on the kind.

use animagen_core::error::{AppError, ErrorKind};
use jsonrpsee::types::ErrorObjectOwned;
use serde::Serialize;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const GENERATION_FAILED: i32 = 5003;
    pub const EXECUTION_FAILED: i32 = 5004;
    pub const RENDER_TIMEOUT: i32 = 5005;
    pub const ARTIFACT_NOT_FOUND: i32 = 5006;
}

/// Structured `data` member of every error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorData {
    pub kind: ErrorKind,
    pub http_status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

fn code_for(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::InvalidRequest => code::VALIDATION_ERROR,
        ErrorKind::NotFound => code::NOT_FOUND,
        ErrorKind::Conflict => code::CONFLICT,
        ErrorKind::GenerationFailed => code::GENERATION_FAILED,
        ErrorKind::ExecutionFailed => code::EXECUTION_FAILED,
        ErrorKind::Timeout => code::RENDER_TIMEOUT,
        ErrorKind::ArtifactNotFound => code::ARTIFACT_NOT_FOUND,
        ErrorKind::Internal => code::INTERNAL_ERROR,
    }
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let kind = err.kind();
    let data = ErrorData {
        kind,
        http_status: err.http_status(),
        detail: err.diagnostics().map(str::to_string),
    };
    ErrorObjectOwned::owned(code_for(kind), err.to_string(), Some(data))
}
