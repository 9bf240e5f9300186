//! Error types for the portal client

use thiserror::Error;

/// Portal client errors
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for portal operations
pub type PortalResult<T> = Result<T, PortalError>;
