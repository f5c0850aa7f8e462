//! Error taxonomy for the platform core
//!
//! Every public operation returns [`Result`]. Lower layers (node, identity,
//! JWT codec) keep their own error enums and convert into [`PlatformError`]
//! at the component boundary.

use crate::credentials::JwtError;
use crate::identity::DidError;
use crate::node::NodeError;

/// Top-level error for every platform operation
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// Missing or empty required input; never retried
    #[error("Validation error: {0}")]
    Validation(String),

    /// Protocol install/propagation failure, or a write the protocol rejects
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A read or query yielded nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credential absent, invalid, or the caller is not allowed to act
    #[error("Auth error: {0}")]
    Auth(String),

    /// Network/storage round trip failed
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PlatformError>;

impl PlatformError {
    pub fn validation(msg: impl Into<String>) -> Self {
        PlatformError::Validation(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        PlatformError::Auth(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PlatformError::NotFound(_))
    }
}

impl From<NodeError> for PlatformError {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::RecordNotFound(_) => PlatformError::NotFound(err.to_string()),
            NodeError::Unauthorized(_) => PlatformError::Auth(err.to_string()),
            NodeError::Unreachable(_) | NodeError::Storage(_) => {
                PlatformError::Transport(err.to_string())
            }
            NodeError::ProtocolNotFound(_)
            | NodeError::InvalidProtocolPath(_)
            | NodeError::ParentMismatch(_)
            | NodeError::SchemaMismatch(_)
            | NodeError::DataFormatNotAllowed(_) => PlatformError::Protocol(err.to_string()),
        }
    }
}

impl From<DidError> for PlatformError {
    fn from(err: DidError) -> Self {
        match err {
            DidError::KeyNotFound(_) => PlatformError::Auth(err.to_string()),
            _ => PlatformError::Validation(err.to_string()),
        }
    }
}

impl From<JwtError> for PlatformError {
    fn from(err: JwtError) -> Self {
        PlatformError::Auth(err.to_string())
    }
}
