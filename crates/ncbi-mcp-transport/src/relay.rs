//! Unidirectional, order-preserving byte relays
//!
//! Each relay copies whatever bytes arrive on its reader to its writer,
//! flushing after every chunk. Nothing is parsed or reframed.

use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;

/// Read buffer size per relay
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Which standard stream a relay carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Caller input to worker input
    Input,

    /// Worker output to caller output
    Output,

    /// Worker error to caller error
    Error,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("stdin"),
            Self::Output => f.write_str("stdout"),
            Self::Error => f.write_str("stderr"),
        }
    }
}

/// Copy `reader` to `writer` until EOF, flushing after every chunk
///
/// Returns the number of bytes forwarded. The writer is dropped when the
/// reader ends, which closes pipe-backed writers.
pub async fn pump<R, W>(mut reader: R, mut writer: W) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(total);
        }
        writer.write_all(&buf[..n]).await?;
        writer.flush().await?;
        total += n as u64;
    }
}

/// A relay running on its own task
#[derive(Debug)]
pub struct Relay {
    kind: StreamKind,
    handle: JoinHandle<std::io::Result<u64>>,
}

impl Relay {
    /// Start relaying `reader` into `writer`
    pub fn spawn<R, W>(kind: StreamKind, reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let result = pump(reader, writer).await;
            match &result {
                Ok(bytes) => tracing::debug!(stream = %kind, bytes, "Relay finished"),
                // The worker closing its input early is expected on shutdown
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    tracing::debug!(stream = %kind, "Relay peer closed")
                }
                Err(e) => tracing::warn!(stream = %kind, error = %e, "Relay failed"),
            }
            result
        });

        Self { kind, handle }
    }

    /// Stream this relay carries
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Whether the relay task has ended
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the relay to drain
    ///
    /// Returns the byte count, or `None` if the relay failed or was aborted.
    /// Cancel-safe: the task keeps running if this future is dropped.
    pub async fn join(&mut self) -> Option<u64> {
        match (&mut self.handle).await {
            Ok(Ok(bytes)) => Some(bytes),
            Ok(Err(_)) => None,
            Err(e) => {
                if !e.is_cancelled() {
                    tracing::warn!(stream = %self.kind, error = %e, "Relay task panicked");
                }
                None
            }
        }
    }

    /// Stop relaying
    pub fn abort(&self) {
        self.handle.abort();
    }
}
