//! Worker subprocess management
//!
//! Resolves the interpreter to launch and spawns the server script with
//! three piped standard streams.

pub mod process;
pub mod resolve;

pub use process::{ExecutableSpec, ProcessConfig, WorkerExit, WorkerProcess};
pub use resolve::{ExecutableResolver, PathResolver, StaticResolver, resolve_executable};
