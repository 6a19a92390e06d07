// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid job id: {0}")]
    InvalidJobId(String),

    #[error("Invalid description: {0}")]
    InvalidDescription(String),

    #[error("Job state regression: {from} -> {to}")]
    StateRegression { from: String, to: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;
