//! Bridge error types

use std::path::PathBuf;
use thiserror::Error;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Exit status reported when the worker never ran
pub const STARTUP_FAILURE_CODE: i32 = 1;

/// Errors that can occur while launching or driving the worker
#[derive(Debug, Error)]
pub enum BridgeError {
    // Startup errors (nothing was spawned)
    /// Server script does not exist
    #[error("Server script not found. Expected it at: {}", .path.display())]
    ScriptNotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// Server script path exists but is not a regular file
    #[error("Server script is not a regular file: {}", .path.display())]
    ScriptNotAFile {
        /// Path that was checked
        path: PathBuf,
    },

    // Spawn errors (the OS refused to create the worker)
    /// Worker process could not be created
    #[error("Failed to spawn '{executable}': {source}")]
    Spawn {
        /// Executable that was tried
        executable: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// A piped worker stream was not available after spawn
    #[error("Worker {0} was not captured")]
    StreamUnavailable(&'static str),

    // Runtime errors
    /// Handshake could not be encoded or written
    #[error("Failed to send handshake: {0}")]
    Handshake(String),

    /// Signal could not be delivered to the worker
    #[error("Failed to signal worker (pid {pid}): {reason}")]
    Signal {
        /// Worker process id
        pid: u32,
        /// Reason reported by the OS
        reason: String,
    },

    /// Operation not allowed in the current lifecycle state
    #[error("Cannot {operation} while bridge is {state}")]
    InvalidState {
        /// Attempted operation
        operation: &'static str,
        /// State the bridge was in
        state: String,
    },

    /// Filesystem or pipe I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the failure happened before any worker was spawned
    pub fn is_startup(&self) -> bool {
        matches!(self, Self::ScriptNotFound { .. } | Self::ScriptNotAFile { .. })
    }

    /// Whether the OS failed to create the worker
    pub fn is_spawn(&self) -> bool {
        matches!(self, Self::Spawn { .. } | Self::StreamUnavailable(_))
    }

    /// Process exit status the launcher should report for this error
    pub fn exit_code(&self) -> i32 {
        STARTUP_FAILURE_CODE
    }

    pub(crate) fn invalid_state(operation: &'static str, state: impl ToString) -> Self {
        Self::InvalidState {
            operation,
            state: state.to_string(),
        }
    }
}

impl From<ncbi_mcp_protocol::ProtocolError> for BridgeError {
    fn from(err: ncbi_mcp_protocol::ProtocolError) -> Self {
        Self::Handshake(err.to_string())
    }
}
