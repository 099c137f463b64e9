//! Process bridge for the ncbi-mcp launcher
//!
//! Spawns the Python MCP server as a worker process and presents it as if it
//! were the current process's own stdio-driven service.
//!
//! # Architecture
//!
//! - **Subprocess**: executable resolution and worker spawning ([`subprocess`])
//! - **Relay**: ordered byte forwarding between stream endpoints ([`relay`])
//! - **Bridge**: lifecycle state machine tying the two together ([`bridge`])
//! - **Signals**: interrupt/termination handling and forwarding ([`signal`])

#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! # Usage
//!
//! ```no_run
//! use ncbi_mcp_transport::{ProcessBridge, ProcessConfig};
//!
//! # async fn example() -> ncbi_mcp_transport::Result<()> {
//! let config = ProcessConfig::new("ncbi_mcp.py").with_arg("--email").with_arg("me@example.org");
//! let exit = ProcessBridge::new(config).serve().await?;
//! std::process::exit(exit.code());
//! # }
//! ```

pub mod bridge;
pub mod error;
pub mod relay;
pub mod signal;
pub mod subprocess;

// Re-export commonly used types
pub use bridge::{BridgeState, ProcessBridge, Termination};
pub use error::{BridgeError, Result};
pub use signal::{ShutdownListener, TerminationSignal};
pub use subprocess::{
    ExecutableResolver, ExecutableSpec, PathResolver, ProcessConfig, StaticResolver, WorkerExit,
    WorkerProcess, resolve_executable,
};
