//! Runtime process supervision.
//!
//! The runtime under test can be launched by the tester. It counts as
//! ready once it writes anything to stdout; after a short settle delay the
//! connection supervisor takes over.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncReadExt, sink};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Delay between the first stdout output and reporting readiness.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Default time budget for the runtime to print its first output.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(4);

// ============================================================================
// ProcessGuard
// ============================================================================

/// Kills the child process when dropped.
struct ProcessGuard {
    child: Option<Child>,
    pid: u32,
}

impl ProcessGuard {
    fn new(child: Child) -> Self {
        let pid = child.id().unwrap_or(0);
        debug!(pid, "Process guard created");
        Self {
            child: Some(child),
            pid,
        }
    }

    /// Kills the process and waits for it to exit.
    async fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!(pid = self.pid, "Killing runtime process");
            if let Err(e) = child.kill().await {
                debug!(pid = self.pid, error = %e, "Failed to kill process");
            }
            if let Err(e) = child.wait().await {
                debug!(pid = self.pid, error = %e, "Failed to wait for process");
            }
            info!(pid = self.pid, "Runtime process terminated");
        }
    }

    /// Returns `true` if the child has already exited.
    fn has_exited(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(Some(status))) => {
                debug!(pid = self.pid, %status, "Runtime process exited");
                true
            }
            Some(Ok(None)) => false,
            Some(Err(e)) => {
                debug!(pid = self.pid, error = %e, "Failed to poll process");
                true
            }
            None => true,
        }
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take()
            && let Err(e) = child.start_kill()
        {
            debug!(pid = self.pid, error = %e, "Failed to send kill signal in Drop");
        }
    }
}

// ============================================================================
// RuntimeProcess
// ============================================================================

/// A runtime launched through the platform shell.
///
/// The process is killed on [`RuntimeProcess::stop`] or when dropped.
pub struct RuntimeProcess {
    /// Shell command line.
    command: String,
    /// Owned child process.
    guard: ProcessGuard,
    /// Task discarding stdout after readiness.
    drain: Option<JoinHandle<()>>,
}

impl fmt::Debug for RuntimeProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeProcess")
            .field("command", &self.command)
            .field("pid", &self.guard.pid)
            .finish_non_exhaustive()
    }
}

impl RuntimeProcess {
    /// Launches `command` and waits until it is ready.
    ///
    /// # Errors
    ///
    /// - [`Error::ProcessLaunchFailed`] if the shell can't be spawned
    /// - [`Error::RuntimeExited`] if the process exits before it is ready
    /// - [`Error::Timeout`] if it prints nothing within `startup_timeout`
    pub async fn start(command: &str, startup_timeout: Duration) -> Result<Self> {
        info!(command, "Starting runtime");

        let mut child = shell(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(Error::process_launch_failed)?;

        let stdout = child.stdout.take();
        let mut guard = ProcessGuard::new(child);
        let Some(mut stdout) = stdout else {
            guard.kill().await;
            return Err(Error::config("Runtime stdout was not captured"));
        };

        match timeout(startup_timeout, wait_for_output(&mut stdout, &mut guard)).await {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                warn!(command, "Runtime exited before becoming ready");
                return Err(Error::runtime_exited(command));
            }
            Ok(Err(e)) => {
                guard.kill().await;
                return Err(e);
            }
            Err(_) => {
                guard.kill().await;
                return Err(Error::timeout(
                    "runtime startup",
                    startup_timeout.as_millis() as u64,
                ));
            }
        }

        sleep(SETTLE_DELAY).await;
        if guard.has_exited() {
            warn!(command, "Runtime exited while settling");
            return Err(Error::runtime_exited(command));
        }

        let drain = tokio::spawn(async move {
            if let Err(e) = tokio::io::copy(&mut stdout, &mut sink()).await {
                debug!(error = %e, "Runtime stdout drain stopped");
            }
        });

        info!(command, pid = guard.pid, "Runtime has started");
        Ok(Self {
            command: command.to_owned(),
            guard,
            drain: Some(drain),
        })
    }

    /// Returns the command line the runtime was started with.
    #[inline]
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the process ID.
    #[inline]
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.guard.pid
    }

    /// Returns `true` while the process is alive.
    #[must_use]
    pub fn is_running(&mut self) -> bool {
        !self.guard.has_exited()
    }

    /// Kills the runtime and waits for it to exit.
    pub async fn stop(mut self) {
        if let Some(drain) = self.drain.take() {
            drain.abort();
        }
        self.guard.kill().await;
        info!(command = %self.command, "Runtime exited");
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Builds a command running `line` through the platform shell.
fn shell(line: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(line);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(line);
        cmd
    }
}

/// Resolves `true` on the first stdout byte, `false` if the process exits
/// or closes stdout first.
async fn wait_for_output(stdout: &mut ChildStdout, guard: &mut ProcessGuard) -> Result<bool> {
    let mut buf = [0u8; 256];
    let Some(child) = guard.child.as_mut() else {
        return Ok(false);
    };

    tokio::select! {
        read = stdout.read(&mut buf) => Ok(read? > 0),
        status = child.wait() => {
            debug!(status = ?status, "Runtime process exited during startup");
            Ok(false)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_waits_for_output() {
        let mut process = RuntimeProcess::start("echo ready; sleep 30", DEFAULT_STARTUP_TIMEOUT)
            .await
            .expect("runtime should start");

        assert!(process.pid() > 0);
        assert_eq!(process.command(), "echo ready; sleep 30");
        assert!(process.is_running());
        process.stop().await;
    }

    #[tokio::test]
    async fn test_exit_before_output_fails() {
        let err = RuntimeProcess::start("exit 3", DEFAULT_STARTUP_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RuntimeExited { .. }));
    }

    #[tokio::test]
    async fn test_exit_while_settling_fails() {
        let err = RuntimeProcess::start("echo bye", DEFAULT_STARTUP_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RuntimeExited { .. }));
    }

    #[tokio::test]
    async fn test_silent_runtime_times_out() {
        let err = RuntimeProcess::start("sleep 30", Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }
}
