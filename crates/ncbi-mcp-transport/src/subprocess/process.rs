//! Process management for the worker subprocess

use crate::error::{BridgeError, Result, STARTUP_FAILURE_CODE};
use crate::signal::TerminationSignal;
use ncbi_mcp_protocol::Handshake;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

/// Interpreter names probed when no executable is given, in order
pub const DEFAULT_CANDIDATES: [&str; 3] = ["python", "python3", "py"];

/// Interpreter used when no candidate resolves
pub const DEFAULT_FALLBACK: &str = "python";

/// Server script launched when none is configured
pub const DEFAULT_SCRIPT: &str = "ncbi_mcp.py";

/// How long a signaled worker may take to exit before it is killed
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Which program runs the server script
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutableSpec {
    /// Use this executable as-is
    Explicit(String),

    /// Probe candidates in order, falling back to a fixed name
    Probe {
        /// Names to try, first match wins
        candidates: Vec<String>,
        /// Name used when no candidate resolves
        fallback: String,
    },
}

impl Default for ExecutableSpec {
    fn default() -> Self {
        Self::Probe {
            candidates: DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect(),
            fallback: DEFAULT_FALLBACK.to_string(),
        }
    }
}

/// Configuration for spawning the worker
#[derive(Clone, Debug)]
pub struct ProcessConfig {
    /// Interpreter selection
    pub executable: ExecutableSpec,

    /// Server script, passed as the first argument
    pub script: PathBuf,

    /// Arguments forwarded verbatim after the script path
    pub args: Vec<String>,

    /// Extra environment variables for the worker
    pub env: HashMap<String, String>,

    /// Message written to the worker before any caller input
    pub handshake: Option<Handshake>,

    /// Time a cancelled worker gets before being killed
    pub grace_period: Duration,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            executable: ExecutableSpec::default(),
            script: PathBuf::from(DEFAULT_SCRIPT),
            args: Vec::new(),
            env: HashMap::new(),
            handshake: None,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

impl ProcessConfig {
    /// Create a configuration for the given server script
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            ..Default::default()
        }
    }

    /// Use a specific executable instead of probing
    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = ExecutableSpec::Explicit(executable.into());
        self
    }

    /// Probe these candidates instead of the defaults
    pub fn with_candidates<I, S>(mut self, candidates: I, fallback: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.executable = ExecutableSpec::Probe {
            candidates: candidates.into_iter().map(Into::into).collect(),
            fallback: fallback.into(),
        };
        self
    }

    /// Add an argument
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add several arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable
    ///
    /// The worker inherits the launcher's environment; variables set here are
    /// added on top, overriding inherited values with the same name.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set (or clear) the handshake message
    pub fn with_handshake(mut self, handshake: Option<Handshake>) -> Self {
        self.handshake = handshake;
        self
    }

    /// Set the cancellation grace period
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }
}

/// How the worker ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerExit {
    /// Exited on its own with this code
    Code(i32),

    /// Terminated by this signal number
    Signaled(i32),
}

impl WorkerExit {
    /// Map an OS exit status
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Code(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signaled(signal);
            }
        }

        Self::Code(STARTUP_FAILURE_CODE)
    }

    /// Exit status the launcher should report, following the shell convention
    /// of `128 + n` for death by signal `n`
    pub fn code(&self) -> i32 {
        match self {
            Self::Code(code) => *code,
            Self::Signaled(signal) => 128 + signal,
        }
    }

    /// Whether the worker exited with status 0
    pub fn success(&self) -> bool {
        matches!(self, Self::Code(0))
    }
}

/// A running worker with its three piped streams
///
/// Streams are handed out once via the `take_*` methods. The child is spawned
/// with kill-on-drop, so dropping the handle never leaves the worker running.
#[derive(Debug)]
pub struct WorkerProcess {
    child: Child,
    pid: Option<u32>,
    executable: String,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
}

impl WorkerProcess {
    /// Spawn `executable` with the configured script, arguments and environment
    pub fn spawn(executable: &str, config: &ProcessConfig) -> Result<Self> {
        let mut cmd = Command::new(executable);
        cmd.arg(&config.script);
        cmd.args(&config.args);
        cmd.envs(&config.env);

        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| BridgeError::Spawn {
            executable: executable.to_string(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or(BridgeError::StreamUnavailable("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(BridgeError::StreamUnavailable("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(BridgeError::StreamUnavailable("stderr"))?;

        let pid = child.id();
        tracing::info!(
            pid = pid,
            executable = %executable,
            script = %config.script.display(),
            args = ?config.args,
            "Spawned worker"
        );

        Ok(Self {
            child,
            pid,
            executable: executable.to_string(),
            stdin: Some(stdin),
            stdout: Some(stdout),
            stderr: Some(stderr),
        })
    }

    /// Write a handshake line to the worker's input and flush it
    pub async fn write_handshake(&mut self, handshake: &Handshake) -> Result<()> {
        let line = handshake.to_line()?;
        let stdin = self
            .stdin
            .as_mut()
            .ok_or(BridgeError::StreamUnavailable("stdin"))?;

        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| BridgeError::Handshake(e.to_string()))?;
        stdin
            .flush()
            .await
            .map_err(|e| BridgeError::Handshake(e.to_string()))?;

        tracing::debug!(kind = %handshake.kind(), bytes = line.len(), "Sent handshake");
        Ok(())
    }

    /// Take the worker's input stream
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.stdin.take()
    }

    /// Take the worker's output stream
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// Take the worker's error stream
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.stderr.take()
    }

    /// Process id, if the OS reported one
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Executable the worker was started with
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Wait for the worker to exit
    ///
    /// Cancel-safe: once the status has been collected, later calls return it immediately.
    pub async fn wait(&mut self) -> Result<WorkerExit> {
        let status = self.child.wait().await?;
        Ok(WorkerExit::from_status(status))
    }

    /// Exit status if the worker has already exited
    pub fn try_wait(&mut self) -> Result<Option<WorkerExit>> {
        Ok(self.child.try_wait()?.map(WorkerExit::from_status))
    }

    /// Ask the worker to terminate
    #[cfg(unix)]
    pub fn signal(&mut self, signal: TerminationSignal) -> Result<()> {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        let pid = self.pid.ok_or_else(|| BridgeError::Signal {
            pid: 0,
            reason: "worker has no pid".to_string(),
        })?;
        let raw = i32::try_from(pid).map_err(|e| BridgeError::Signal {
            pid,
            reason: e.to_string(),
        })?;

        kill(Pid::from_raw(raw), signal.as_nix()).map_err(|e| BridgeError::Signal {
            pid,
            reason: e.to_string(),
        })
    }

    /// Ask the worker to terminate
    ///
    /// Without POSIX signals the only request available is a forced kill.
    #[cfg(not(unix))]
    pub fn signal(&mut self, _signal: TerminationSignal) -> Result<()> {
        let pid = self.pid.unwrap_or(0);
        self.child.start_kill().map_err(|e| BridgeError::Signal {
            pid,
            reason: e.to_string(),
        })
    }

    /// Kill the worker and wait for it
    pub async fn kill(&mut self) -> Result<WorkerExit> {
        self.child.kill().await?;
        self.wait().await
    }
}

/// Check that the server script exists and is a regular file
pub(crate) async fn check_script(path: &Path) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(BridgeError::ScriptNotAFile {
            path: path.to_path_buf(),
        }),
        Err(_) => Err(BridgeError::ScriptNotFound {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_process_config_default() {
        let config = ProcessConfig::default();
        assert_eq!(config.script, PathBuf::from("ncbi_mcp.py"));
        assert!(config.args.is_empty());
        assert!(config.handshake.is_none());
        assert_eq!(
            config.executable,
            ExecutableSpec::Probe {
                candidates: vec!["python".into(), "python3".into(), "py".into()],
                fallback: "python".into(),
            }
        );
    }

    #[test]
    fn test_process_config_builder() {
        let config = ProcessConfig::new("/srv/ncbi/ncbi_mcp.py")
            .with_executable("/usr/bin/python3.11")
            .with_arg("--api-key")
            .with_args(["abc", "--email", "me@example.org"])
            .with_env("NCBI_API_KEY", "abc")
            .with_grace_period(Duration::from_millis(250));

        assert_eq!(
            config.executable,
            ExecutableSpec::Explicit("/usr/bin/python3.11".into())
        );
        assert_eq!(config.args, ["--api-key", "abc", "--email", "me@example.org"]);
        assert_eq!(config.env.get("NCBI_API_KEY"), Some(&"abc".to_string()));
        assert_eq!(config.grace_period, Duration::from_millis(250));
    }

    #[test]
    fn test_with_candidates_replaces_probe_list() {
        let config = ProcessConfig::default().with_candidates(["python3.12", "python3"], "python3");
        assert_eq!(
            config.executable,
            ExecutableSpec::Probe {
                candidates: vec!["python3.12".into(), "python3".into()],
                fallback: "python3".into(),
            }
        );
    }

    #[rstest]
    #[case(WorkerExit::Code(0), 0, true)]
    #[case(WorkerExit::Code(2), 2, false)]
    #[case(WorkerExit::Signaled(15), 143, false)]
    #[case(WorkerExit::Signaled(9), 137, false)]
    fn test_worker_exit_code(#[case] exit: WorkerExit, #[case] code: i32, #[case] success: bool) {
        assert_eq!(exit.code(), code);
        assert_eq!(exit.success(), success);
    }

    #[cfg(unix)]
    #[test]
    fn test_worker_exit_from_signal_status() {
        use std::os::unix::process::ExitStatusExt;
        // Raw wait status: low 7 bits carry the terminating signal
        let status = ExitStatus::from_raw(15);
        assert_eq!(WorkerExit::from_status(status), WorkerExit::Signaled(15));

        let status = ExitStatus::from_raw(3 << 8);
        assert_eq!(WorkerExit::from_status(status), WorkerExit::Code(3));
    }

    #[tokio::test]
    async fn test_check_script() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("server.py");

        let err = check_script(&script).await.unwrap_err();
        assert!(matches!(err, BridgeError::ScriptNotFound { .. }));

        let err = check_script(dir.path()).await.unwrap_err();
        assert!(matches!(err, BridgeError::ScriptNotAFile { .. }));

        std::fs::write(&script, "print('hi')\n").unwrap();
        assert!(check_script(&script).await.is_ok());
    }
}
