//! Error types for protocol operations
//!
//! Provides error types for handshake serialization and configuration parsing.

use thiserror::Error;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors that can occur during protocol operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Handshake kind name not recognized
    #[error("Unknown handshake kind '{0}'. Expected one of: none, initialize, capabilities")]
    UnknownHandshake(String),
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_handshake_lists_choices() {
        let err = ProtocolError::UnknownHandshake("hello".to_string());
        let msg = err.to_string();
        assert!(msg.contains("hello"));
        assert!(msg.contains("initialize"));
        assert!(msg.contains("capabilities"));
    }
}
