//! Handshake message types for the ncbi-mcp launcher
//!
//! The launcher can prime the Python MCP server with a single synthetic message
//! before any caller input is forwarded. This crate defines the shapes of that
//! message and its line-delimited JSON encoding.
//!
//! # Type Organization
//!
//! - **Handshake messages**: [`handshake`] - `initialize` request and capability announcement
//! - **Common types**: [`types`] - implementation info, capabilities, protocol version
//! - **Error types**: [`error`] - serialization and parsing errors
//!
//! # Design Principles
//!
//! - **Zero I/O**: All types are pure data structures
//! - **Line-delimited**: Every message encodes to exactly one line of JSON

#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! # Usage
//!
//! ```
//! use ncbi_mcp_protocol::{HandshakeKind, Implementation};
//!
//! let kind: HandshakeKind = "initialize".parse().unwrap();
//! let handshake = kind.build(Implementation::new("ncbi-mcp", "0.2.0")).unwrap();
//! assert!(handshake.to_line().unwrap().ends_with('\n'));
//! ```

pub mod error;
pub mod handshake;
pub mod types;

// Re-export commonly used types at crate level
pub use error::{ProtocolError, Result};
pub use handshake::{
    CapabilityAnnouncement, Handshake, HandshakeKind, InitializeParams, InitializeRequest,
};
pub use types::{Capabilities, Implementation, JSONRPC_VERSION, PROTOCOL_VERSION};
