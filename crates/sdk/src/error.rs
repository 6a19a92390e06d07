//! SDK Error Types

use thiserror::Error;

/// SDK Result type
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK Error
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Connection error: {0}")]
    Connection(String),

    /// Error object returned by the daemon. `kind` is the stable
    /// classification from the error data (e.g. `TIMEOUT`).
    #[error("RPC error ({code}): {message}")]
    Rpc {
        code: i32,
        message: String,
        kind: Option<String>,
        http_status: Option<u16>,
        detail: Option<String>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid artifact chunk: {0}")]
    InvalidChunk(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl SdkError {
    /// Error kind reported by the daemon, if this is an RPC error
    pub fn kind(&self) -> Option<&str> {
        match self {
            SdkError::Rpc { kind, .. } => kind.as_deref(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == Some("NOT_FOUND")
    }
}

impl From<jsonrpsee::core::ClientError> for SdkError {
    fn from(e: jsonrpsee::core::ClientError) -> Self {
        match e {
            jsonrpsee::core::ClientError::Call(call_err) => {
                let data: Option<serde_json::Value> = call_err
                    .data()
                    .and_then(|raw| serde_json::from_str(raw.get()).ok());
                let field = |name: &str| data.as_ref().and_then(|d| d.get(name).cloned());
                SdkError::Rpc {
                    code: call_err.code(),
                    message: call_err.message().to_string(),
                    kind: field("kind").and_then(|v| v.as_str().map(str::to_string)),
                    http_status: field("http_status")
                        .and_then(|v| v.as_u64())
                        .and_then(|v| u16::try_from(v).ok()),
                    detail: field("detail").and_then(|v| v.as_str().map(str::to_string)),
                }
            }
            jsonrpsee::core::ClientError::Transport(e) => {
                SdkError::Transport(format!("Transport error: {}", e))
            }
            jsonrpsee::core::ClientError::RestartNeeded(_) => {
                SdkError::Connection("Connection restart needed".to_string())
            }
            jsonrpsee::core::ClientError::ParseError(e) => {
                SdkError::Other(format!("Parse error: {}", e))
            }
            _ => SdkError::Other(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpsee::types::ErrorObjectOwned;
    use serde_json::json;

    #[test]
    fn test_call_error_keeps_error_data() {
        let call = ErrorObjectOwned::owned(
            5005,
            "Render error: timed out",
            Some(json!({"kind": "TIMEOUT", "http_status": 500})),
        );
        let err = SdkError::from(jsonrpsee::core::ClientError::Call(call));
        match &err {
            SdkError::Rpc {
                code,
                http_status,
                detail,
                ..
            } => {
                assert_eq!(*code, 5005);
                assert_eq!(*http_status, Some(500));
                assert!(detail.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(err.kind(), Some("TIMEOUT"));
        assert!(!err.is_not_found());
    }
}
