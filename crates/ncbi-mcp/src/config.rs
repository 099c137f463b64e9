//! Launcher configuration
//!
//! Values come from two layers: environment variables, then command-line
//! flags. Flags win wherever they are set.

use ncbi_mcp_protocol::{HandshakeKind, Implementation};
use ncbi_mcp_transport::subprocess::process::{DEFAULT_GRACE_PERIOD, DEFAULT_SCRIPT};
use ncbi_mcp_transport::ProcessConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Interpreter to launch (disables probing)
pub const ENV_PYTHON: &str = "NCBI_MCP_PYTHON";
/// Path of the server script
pub const ENV_SCRIPT: &str = "NCBI_MCP_SCRIPT";
/// Directory holding the server files
pub const ENV_HOME: &str = "NCBI_MCP_HOME";
/// Handshake kind: none, initialize or capabilities
pub const ENV_HANDSHAKE: &str = "NCBI_MCP_HANDSHAKE";
/// Cancellation grace period in milliseconds
pub const ENV_GRACE_MS: &str = "NCBI_MCP_GRACE_MS";

/// Settings for a `serve` run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LauncherConfig {
    /// Explicit interpreter; `None` probes the default candidates
    pub python: Option<String>,

    /// Server script path
    pub script: Option<PathBuf>,

    /// Directory holding the server files
    pub home: Option<PathBuf>,

    /// Handshake to send before caller input
    pub handshake: Option<HandshakeKind>,

    /// Time a cancelled worker gets before being killed
    pub grace_period: Option<Duration>,
}

impl LauncherConfig {
    /// Load configuration from environment variables.
    ///
    /// This will look for:
    /// - `NCBI_MCP_PYTHON` for the interpreter
    /// - `NCBI_MCP_SCRIPT` for the server script
    /// - `NCBI_MCP_HOME` for the directory holding the server files
    /// - `NCBI_MCP_HANDSHAKE` for the handshake kind
    /// - `NCBI_MCP_GRACE_MS` for the cancellation grace period
    ///
    /// Empty or unparseable values are ignored.
    pub fn from_env() -> Self {
        use std::env;

        let mut config = Self::default();

        if let Ok(python) = env::var(ENV_PYTHON)
            && !python.is_empty()
        {
            config.python = Some(python);
        }

        if let Some(script) = env::var_os(ENV_SCRIPT).filter(|s| !s.is_empty()) {
            config.script = Some(PathBuf::from(script));
        }

        if let Some(home) = env::var_os(ENV_HOME).filter(|s| !s.is_empty()) {
            config.home = Some(PathBuf::from(home));
        }

        if let Ok(kind) = env::var(ENV_HANDSHAKE) {
            match kind.parse::<HandshakeKind>() {
                Ok(kind) => config.handshake = Some(kind),
                Err(e) => tracing::warn!(variable = ENV_HANDSHAKE, error = %e, "Ignoring invalid value"),
            }
        }

        if let Ok(grace) = env::var(ENV_GRACE_MS)
            && let Ok(ms) = grace.parse::<u64>()
        {
            config.grace_period = Some(Duration::from_millis(ms));
        }

        config
    }

    /// Merge this configuration with another, with the other taking precedence.
    pub fn merge(mut self, other: LauncherConfig) -> Self {
        if other.python.is_some() {
            self.python = other.python;
        }
        if other.script.is_some() {
            self.script = other.script;
        }
        if other.home.is_some() {
            self.home = other.home;
        }
        if other.handshake.is_some() {
            self.handshake = other.handshake;
        }
        if other.grace_period.is_some() {
            self.grace_period = other.grace_period;
        }
        self
    }

    /// Directory holding the server files: `home`, else the working directory
    pub fn home_dir(&self) -> PathBuf {
        self.home.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Server script to launch: `script`, else `ncbi_mcp.py` inside the home directory
    pub fn script_path(&self) -> PathBuf {
        self.script
            .clone()
            .unwrap_or_else(|| self.home_dir().join(DEFAULT_SCRIPT))
    }

    /// Build the worker configuration, forwarding `args` after the script path
    pub fn to_process_config(&self, args: Vec<String>) -> ProcessConfig {
        let handshake = self
            .handshake
            .unwrap_or_default()
            .build(Implementation::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));

        let mut config = ProcessConfig::new(self.script_path())
            .with_args(args)
            .with_handshake(handshake)
            .with_grace_period(self.grace_period.unwrap_or(DEFAULT_GRACE_PERIOD));

        if let Some(python) = &self.python {
            config = config.with_executable(python.clone());
        }
        config
    }
}
