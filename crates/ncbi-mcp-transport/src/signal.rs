//! Termination signals received by the launcher and forwarded to the worker
//!
//! Handlers are installed by [`ShutdownListener::install`], not on first poll:
//! once installed, a signal no longer terminates the launcher outright and is
//! held until [`ShutdownListener::recv`] collects it.

use std::fmt;

/// A request to stop, as delivered to the launcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationSignal {
    /// SIGINT / Ctrl-C
    Interrupt,

    /// SIGTERM
    Terminate,
}

impl TerminationSignal {
    #[cfg(unix)]
    pub(crate) fn as_nix(&self) -> nix::sys::signal::Signal {
        match self {
            Self::Interrupt => nix::sys::signal::Signal::SIGINT,
            Self::Terminate => nix::sys::signal::Signal::SIGTERM,
        }
    }
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => f.write_str("SIGINT"),
            Self::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Registered SIGINT/SIGTERM handlers
///
/// Must be created inside a tokio runtime.
#[derive(Debug)]
pub struct ShutdownListener {
    handlers: Option<Handlers>,
}

impl ShutdownListener {
    /// Register the handlers now
    ///
    /// If they cannot be installed, [`recv`](Self::recv) never resolves and the
    /// worker's exit remains the only way the bridge completes.
    pub fn install() -> Self {
        match Handlers::install() {
            Ok(handlers) => Self {
                handlers: Some(handlers),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install signal handlers");
                Self { handlers: None }
            }
        }
    }

    /// Wait for the next shutdown request
    ///
    /// Signals delivered since [`install`](Self::install) are returned
    /// immediately. Cancel-safe.
    pub async fn recv(&mut self) -> TerminationSignal {
        let Some(handlers) = self.handlers.as_mut() else {
            return std::future::pending().await;
        };
        let signal = handlers.recv().await;
        tracing::info!(signal = %signal, "Received shutdown signal");
        signal
    }
}

#[cfg(unix)]
#[derive(Debug)]
struct Handlers {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Handlers {
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> TerminationSignal {
        tokio::select! {
            _ = self.interrupt.recv() => TerminationSignal::Interrupt,
            _ = self.terminate.recv() => TerminationSignal::Terminate,
        }
    }
}

#[cfg(windows)]
#[derive(Debug)]
struct Handlers {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(windows)]
impl Handlers {
    fn install() -> std::io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    async fn recv(&mut self) -> TerminationSignal {
        self.ctrl_c.recv().await;
        TerminationSignal::Interrupt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_display() {
        assert_eq!(TerminationSignal::Interrupt.to_string(), "SIGINT");
        assert_eq!(TerminationSignal::Terminate.to_string(), "SIGTERM");
    }

    #[cfg(unix)]
    #[test]
    fn test_nix_mapping() {
        use nix::sys::signal::Signal;

        assert_eq!(TerminationSignal::Interrupt.as_nix(), Signal::SIGINT);
        assert_eq!(TerminationSignal::Terminate.as_nix(), Signal::SIGTERM);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_signal_before_recv_is_held() {
        let mut listener = ShutdownListener::install();

        // Delivered with no one awaiting: must neither kill the test process nor be lost
        nix::sys::signal::raise(nix::sys::signal::Signal::SIGTERM).unwrap();

        let received = tokio::time::timeout(std::time::Duration::from_secs(5), listener.recv())
            .await
            .expect("pending signal was not delivered");
        assert_eq!(received, TerminationSignal::Terminate);
    }
}
