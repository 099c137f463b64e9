//! Structured logging setup
//!
//! Logs always go to stderr: stdout carries the worker's protocol traffic.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,

    /// One JSON object per line
    Json,
}

/// Default filter directive when `RUST_LOG` is unset
pub fn default_directive(debug: bool) -> &'static str {
    if debug { "debug" } else { "warn" }
}

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over `debug`.
pub fn init(debug: bool, format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "warn");
        assert_eq!(default_directive(true), "debug");
    }

    #[test]
    fn test_second_init_fails_instead_of_panicking() {
        let _ = init(false, LogFormat::Text);
        assert!(init(true, LogFormat::Json).is_err());
    }
}
