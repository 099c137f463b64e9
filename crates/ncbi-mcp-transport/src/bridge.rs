//! Process bridge: one worker, three relays, one exit code
//!
//! The bridge owns a single worker process for its whole lifetime. It is
//! single-use and moves through a fixed set of states:
//!
//! ```text
//! Idle -> Launching -> Running -> Terminated
//!             \__________________/
//!              (startup failure)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use ncbi_mcp_transport::{ProcessBridge, ProcessConfig, TerminationSignal};
//!
//! # async fn example() -> ncbi_mcp_transport::Result<()> {
//! let mut bridge = ProcessBridge::new(ProcessConfig::new("ncbi_mcp.py"));
//! bridge.start().await?;
//! bridge.relay()?;
//! let exit = bridge.await_exit().await?;
//! println!("worker exited with {}", exit.code());
//! # Ok(())
//! # }
//! ```

use crate::error::{BridgeError, Result};
use crate::relay::{Relay, StreamKind};
use crate::signal::{ShutdownListener, TerminationSignal};
use crate::subprocess::process::check_script;
use crate::subprocess::{
    ExecutableResolver, ExecutableSpec, PathResolver, ProcessConfig, WorkerExit, WorkerProcess,
    resolve_executable,
};
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

/// How the bridge reached its terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Script or executable missing, or spawn failed; no worker ran
    StartupFailed,

    /// Worker exited on its own
    Exited(WorkerExit),

    /// Worker was stopped by [`ProcessBridge::cancel`]
    Cancelled(WorkerExit),
}

impl Termination {
    /// Exit status the launcher should report
    pub fn code(&self) -> i32 {
        match self {
            Self::StartupFailed => crate::error::STARTUP_FAILURE_CODE,
            Self::Exited(exit) | Self::Cancelled(exit) => exit.code(),
        }
    }
}

/// Lifecycle state of a [`ProcessBridge`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Constructed, nothing launched
    Idle,

    /// Resolving and spawning the worker
    Launching,

    /// Worker is alive
    Running,

    /// Worker is gone (or never started)
    Terminated(Termination),
}

impl BridgeState {
    /// Whether the bridge has reached its final state
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated(_))
    }
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Launching => f.write_str("launching"),
            Self::Running => f.write_str("running"),
            Self::Terminated(Termination::StartupFailed) => f.write_str("terminated (startup failed)"),
            Self::Terminated(Termination::Exited(exit)) => {
                write!(f, "terminated (exit {})", exit.code())
            }
            Self::Terminated(Termination::Cancelled(exit)) => {
                write!(f, "terminated (cancelled, exit {})", exit.code())
            }
        }
    }
}

#[derive(Debug, Default)]
struct Relays {
    input: Option<Relay>,
    output: Option<Relay>,
    error: Option<Relay>,
}

/// Presents an external command as the current process's stdio service
pub struct ProcessBridge {
    config: ProcessConfig,
    resolver: Arc<dyn ExecutableResolver>,
    state: BridgeState,
    worker: Option<WorkerProcess>,
    relays: Relays,
}

impl ProcessBridge {
    /// Create an idle bridge that resolves executables on `PATH`
    pub fn new(config: ProcessConfig) -> Self {
        Self {
            config,
            resolver: Arc::new(PathResolver),
            state: BridgeState::Idle,
            worker: None,
            relays: Relays::default(),
        }
    }

    /// Use a different executable resolver
    pub fn with_resolver(mut self, resolver: Arc<dyn ExecutableResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Configuration the bridge was built with
    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    /// Worker process id while a worker exists
    pub fn pid(&self) -> Option<u32> {
        self.worker.as_ref().and_then(WorkerProcess::pid)
    }

    /// Executable the worker was launched with
    pub fn executable(&self) -> Option<&str> {
        self.worker.as_ref().map(WorkerProcess::executable)
    }

    /// Locate and launch the worker, then send the handshake if one is configured
    ///
    /// A missing script is reported before anything is spawned.
    pub async fn start(&mut self) -> Result<()> {
        if self.state != BridgeState::Idle {
            return Err(BridgeError::invalid_state("start", self.state));
        }

        self.state = BridgeState::Launching;
        match self.launch().await {
            Ok(worker) => {
                self.worker = Some(worker);
                self.state = BridgeState::Running;
                Ok(())
            }
            Err(e) => {
                tracing::debug!(error = %e, "Worker failed to start");
                self.state = BridgeState::Terminated(Termination::StartupFailed);
                Err(e)
            }
        }
    }

    async fn launch(&self) -> Result<WorkerProcess> {
        check_script(&self.config.script).await?;

        let executable = match &self.config.executable {
            ExecutableSpec::Explicit(executable) => executable.clone(),
            ExecutableSpec::Probe {
                candidates,
                fallback,
            } => resolve_executable(candidates, fallback, self.resolver.as_ref()),
        };

        let mut worker = WorkerProcess::spawn(&executable, &self.config)?;
        if let Some(handshake) = &self.config.handshake {
            // Dropping `worker` on failure kills it
            worker.write_handshake(handshake).await?;
        }
        Ok(worker)
    }

    /// Relay the launcher's own stdin, stdout and stderr
    pub fn relay(&mut self) -> Result<()> {
        self.relay_with(tokio::io::stdin(), tokio::io::stdout(), tokio::io::stderr())
    }

    /// Relay the given endpoints
    ///
    /// `input` feeds the worker's stdin; the worker's stdout and stderr are
    /// written to `output` and `error`. Each direction runs on its own task.
    pub fn relay_with<I, O, E>(&mut self, input: I, output: O, error: E) -> Result<()>
    where
        I: AsyncRead + Unpin + Send + 'static,
        O: AsyncWrite + Unpin + Send + 'static,
        E: AsyncWrite + Unpin + Send + 'static,
    {
        if self.state != BridgeState::Running {
            return Err(BridgeError::invalid_state("relay", self.state));
        }
        let worker = self
            .worker
            .as_mut()
            .ok_or_else(|| BridgeError::invalid_state("relay", "without a worker"))?;

        let (Some(stdin), Some(stdout), Some(stderr)) = (
            worker.take_stdin(),
            worker.take_stdout(),
            worker.take_stderr(),
        ) else {
            return Err(BridgeError::invalid_state("relay", "already relaying"));
        };

        self.relays = Relays {
            input: Some(Relay::spawn(StreamKind::Input, input, stdin)),
            output: Some(Relay::spawn(StreamKind::Output, stdout, output)),
            error: Some(Relay::spawn(StreamKind::Error, stderr, error)),
        };
        tracing::debug!(pid = self.pid(), "Relaying worker streams");
        Ok(())
    }

    /// Wait for the worker to terminate and return how it ended
    ///
    /// Worker output and error are drained before returning. Caller input
    /// still in flight is abandoned.
    pub async fn await_exit(&mut self) -> Result<WorkerExit> {
        if self.state != BridgeState::Running {
            return Err(BridgeError::invalid_state("await exit", self.state));
        }
        let worker = self
            .worker
            .as_mut()
            .ok_or_else(|| BridgeError::invalid_state("await exit", "without a worker"))?;

        let exit = worker.wait().await?;
        self.finish_relays().await;

        tracing::info!(exit_code = exit.code(), "Worker exited");
        self.state = BridgeState::Terminated(Termination::Exited(exit));
        Ok(exit)
    }

    /// Forward `signal` to the worker and wait for it to go away
    ///
    /// A worker still alive after the grace period is killed.
    pub async fn cancel(&mut self, signal: TerminationSignal) -> Result<WorkerExit> {
        if self.state != BridgeState::Running {
            return Err(BridgeError::invalid_state("cancel", self.state));
        }
        let grace_period = self.config.grace_period;
        let worker = self
            .worker
            .as_mut()
            .ok_or_else(|| BridgeError::invalid_state("cancel", "without a worker"))?;

        let exit = match worker.try_wait()? {
            Some(exit) => exit,
            None => {
                tracing::info!(pid = worker.pid(), signal = %signal, "Forwarding signal to worker");
                worker.signal(signal)?;

                match tokio::time::timeout(grace_period, worker.wait()).await {
                    Ok(exit) => exit?,
                    Err(_) => {
                        tracing::warn!(
                            pid = worker.pid(),
                            grace_ms = grace_period.as_millis() as u64,
                            "Worker ignored signal, killing"
                        );
                        worker.kill().await?
                    }
                }
            }
        };
        self.finish_relays().await;

        tracing::info!(exit_code = exit.code(), "Worker cancelled");
        self.state = BridgeState::Terminated(Termination::Cancelled(exit));
        Ok(exit)
    }

    /// Run the full lifecycle on the launcher's own stdio
    ///
    /// Starts the worker, relays the three streams and waits until either the
    /// worker exits or the launcher receives SIGINT/SIGTERM, which is
    /// forwarded to the worker. Signal handlers are installed before the
    /// worker is spawned, so a signal arriving during launch is forwarded too.
    pub async fn serve(mut self) -> Result<WorkerExit> {
        let mut shutdown = ShutdownListener::install();
        self.start().await?;
        self.relay()?;

        let signal = tokio::select! {
            exit = self.await_exit() => return exit,
            signal = shutdown.recv() => signal,
        };
        self.cancel(signal).await
    }

    /// Drain worker output, giving up after the grace period
    ///
    /// A process that inherited the worker's stdout or stderr can hold the
    /// pipe open after the worker itself is gone.
    async fn finish_relays(&mut self) {
        if let Some(input) = self.relays.input.take() {
            input.abort();
        }

        let deadline = tokio::time::Instant::now() + self.config.grace_period;
        for slot in [&mut self.relays.output, &mut self.relays.error] {
            if let Some(relay) = slot.as_mut()
                && tokio::time::timeout_at(deadline, relay.join()).await.is_err()
            {
                tracing::warn!(stream = %relay.kind(), "Worker stream still open after exit, abandoning");
                relay.abort();
            }
            *slot = None;
        }
    }
}

impl fmt::Debug for ProcessBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessBridge")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("pid", &self.pid())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(BridgeState::Idle.to_string(), "idle");
        assert_eq!(
            BridgeState::Terminated(Termination::Exited(WorkerExit::Code(2))).to_string(),
            "terminated (exit 2)"
        );
        assert_eq!(
            BridgeState::Terminated(Termination::Cancelled(WorkerExit::Signaled(15))).to_string(),
            "terminated (cancelled, exit 143)"
        );
    }

    #[test]
    fn test_termination_code() {
        assert_eq!(Termination::StartupFailed.code(), 1);
        assert_eq!(Termination::Exited(WorkerExit::Code(0)).code(), 0);
        assert_eq!(Termination::Cancelled(WorkerExit::Code(130)).code(), 130);
    }

    #[test]
    fn test_new_bridge_is_idle() {
        let bridge = ProcessBridge::new(ProcessConfig::default());
        assert_eq!(bridge.state(), BridgeState::Idle);
        assert!(bridge.pid().is_none());
        assert!(bridge.executable().is_none());
    }

    #[test]
    fn test_relay_before_start_is_rejected() {
        let mut bridge = ProcessBridge::new(ProcessConfig::default());
        let err = bridge
            .relay_with(tokio::io::empty(), tokio::io::sink(), tokio::io::sink())
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidState { operation: "relay", .. }));
    }

    #[tokio::test]
    async fn test_missing_script_terminates_without_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("ncbi_mcp.py");
        let mut bridge = ProcessBridge::new(ProcessConfig::new(&missing).with_executable("sh"));

        let err = bridge.start().await.unwrap_err();
        assert!(err.is_startup());
        assert!(err.to_string().contains("ncbi_mcp.py"));
        assert_eq!(
            bridge.state(),
            BridgeState::Terminated(Termination::StartupFailed)
        );
        assert!(bridge.pid().is_none());

        // Single-use: no second attempt
        let err = bridge.start().await.unwrap_err();
        assert!(matches!(err, BridgeError::InvalidState { operation: "start", .. }));
    }
}
