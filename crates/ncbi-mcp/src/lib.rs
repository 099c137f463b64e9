//! # ncbi-mcp
//!
//! Launcher for the Python NCBI Model Context Protocol server.
//!
//! The launcher starts `ncbi_mcp.py` under a Python interpreter, connects its
//! own stdio to the server's, optionally sends a handshake line first, forwards
//! SIGINT/SIGTERM and exits with the server's exit code. The `install`
//! command copies the server files into the editor's extensions directory.
//!
//! ```no_run
//! use clap::Parser;
//! use ncbi_mcp::cli::Cli;
//!
//! # async fn example() {
//! let cli = Cli::parse_from(["ncbi-mcp", "--handshake", "initialize"]);
//! let code = ncbi_mcp::run(cli).await;
//! std::process::exit(code);
//! # }
//! ```

#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod install;
pub mod logging;

use cli::{Cli, Command, InstallArgs, ServeArgs};
use config::LauncherConfig;
use install::{InstallError, Installer};
use ncbi_mcp_transport::ProcessBridge;

/// Exit code for launcher-side failures
pub const FAILURE_CODE: i32 = 1;

/// Run the parsed command and return the process exit code
pub async fn run(cli: Cli) -> i32 {
    match cli.into_command() {
        Command::Serve(args) => serve(args).await,
        Command::Install(args) => install(args),
    }
}

async fn serve(args: ServeArgs) -> i32 {
    let config = LauncherConfig::from_env().merge(args.to_config());
    let process = config.to_process_config(args.args);
    tracing::debug!(?process, "Launching server");

    match ProcessBridge::new(process).serve().await {
        Ok(exit) => {
            tracing::debug!(exit_code = exit.code(), "Server finished");
            exit.code()
        }
        Err(e) => {
            tracing::debug!(error = %e, "Launch failed");
            eprintln!("ncbi-mcp: {e}");
            e.exit_code()
        }
    }
}

fn install(args: InstallArgs) -> i32 {
    match run_install(args) {
        Ok(report) => {
            for path in &report.copied {
                eprintln!("  {}", path.display());
            }
            eprintln!(
                "Installed {} files ({} bytes) to {}",
                report.copied.len(),
                report.bytes,
                report.target.display()
            );
            0
        }
        Err(e) => {
            eprintln!("ncbi-mcp: {e}");
            FAILURE_CODE
        }
    }
}

fn run_install(args: InstallArgs) -> Result<install::InstallReport, InstallError> {
    let source = args
        .source
        .unwrap_or_else(|| LauncherConfig::from_env().home_dir());
    let target = match args.target {
        Some(target) => target,
        None => install::default_target()?,
    };

    Installer::new(source, target).overwrite(args.force).install()
}
