//! Command-line interface

use crate::config::LauncherConfig;
use crate::logging::LogFormat;
use clap::{Args, Parser, Subcommand};
use ncbi_mcp_protocol::HandshakeKind;
use std::path::PathBuf;
use std::time::Duration;

/// Launch and install the NCBI MCP server
#[derive(Debug, Parser)]
#[command(name = "ncbi-mcp", version, about, args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Options for the default `serve` command
    #[command(flatten)]
    pub serve: ServeArgs,

    /// Verbose launcher logging (RUST_LOG overrides)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log line format
    #[arg(
        long,
        global = true,
        value_enum,
        env = "NCBI_MCP_LOG_FORMAT",
        default_value_t = LogFormat::Text
    )]
    pub log_format: LogFormat,
}

impl Cli {
    /// The command to run; `serve` when none was named
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the server over stdio (default)
    Serve(ServeArgs),

    /// Copy the server files into the editor's extensions directory
    Install(InstallArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Python interpreter to use instead of probing python, python3, py
    #[arg(long, value_name = "EXE")]
    pub python: Option<String>,

    /// Server script [default: $NCBI_MCP_HOME/ncbi_mcp.py]
    #[arg(long, value_name = "PATH")]
    pub script: Option<PathBuf>,

    /// Message sent to the server before any input
    #[arg(long, value_name = "KIND", value_parser = parse_handshake)]
    pub handshake: Option<HandshakeKind>,

    /// Milliseconds a signaled server gets to exit before it is killed
    #[arg(long, value_name = "MS")]
    pub grace_ms: Option<u64>,

    /// Arguments passed to the server unchanged (use `--` before flags)
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl ServeArgs {
    /// Flag-level configuration layer
    pub fn to_config(&self) -> LauncherConfig {
        LauncherConfig {
            python: self.python.clone(),
            script: self.script.clone(),
            home: None,
            handshake: self.handshake,
            grace_period: self.grace_ms.map(Duration::from_millis),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct InstallArgs {
    /// Directory holding the server files [default: $NCBI_MCP_HOME or .]
    #[arg(long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Install location [default: ~/.cursor/extensions/ncbi-mcp]
    #[arg(long, value_name = "DIR")]
    pub target: Option<PathBuf>,

    /// Overwrite an existing installation
    #[arg(long)]
    pub force: bool,
}

fn parse_handshake(s: &str) -> Result<HandshakeKind, String> {
    s.parse().map_err(|e: ncbi_mcp_protocol::ProtocolError| e.to_string())
}
