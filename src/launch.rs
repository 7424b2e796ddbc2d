//! Hand a composed message to the operating environment.
//!
//! Dispatch never blocks the caller on the mail client: the child process is
//! awaited on a background thread and its outcome is delivered through a
//! [`LaunchHandle`].

use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use crate::compose::ComposedMessage;
use crate::error::{Error, Result};
use crate::model::profile::DispatchMode;

/// Dispatches composed messages.
pub trait Launcher: Send + Sync {
    fn dispatch(&self, message: &ComposedMessage, mode: DispatchMode) -> Result<LaunchHandle>;
}

/// Pending outcome of a dispatch.
#[derive(Debug)]
pub struct LaunchHandle {
    outcome: Receiver<Result<()>>,
}

impl LaunchHandle {
    /// A handle whose outcome is already known.
    pub fn ready(outcome: Result<()>) -> Self {
        let (tx, rx) = mpsc::channel();
        // The receiver is alive, sending cannot fail.
        let _ = tx.send(outcome);
        Self { outcome: rx }
    }

    /// Wait for `child` on a background thread.
    pub fn watch(child: Child, label: String) -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(wait_child(child, &label));
        });
        Self { outcome: rx }
    }

    /// Block until the environment accepted or rejected the message.
    pub fn wait(self) -> Result<()> {
        self.outcome
            .recv()
            .unwrap_or_else(|_| Err(Error::LaunchFailure("launcher thread vanished".into())))
    }

    /// Wait at most `timeout` for the outcome.
    ///
    /// `None` means the child is still running, which is the normal case for
    /// a mail client started by the dispatch itself.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<()>> {
        match self.outcome.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(Error::LaunchFailure(
                "launcher thread vanished".into(),
            ))),
        }
    }

    /// Outcome if already known, `None` while the child is still running.
    pub fn try_outcome(&self) -> Option<Result<()>> {
        match self.outcome.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(Error::LaunchFailure(
                "launcher thread vanished".into(),
            ))),
        }
    }
}

/// Launcher using the platform URI opener and shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn dispatch(&self, message: &ComposedMessage, mode: DispatchMode) -> Result<LaunchHandle> {
        let mut cmd = match mode {
            DispatchMode::UriHandler => uri_opener(message.as_str()),
            DispatchMode::Subprocess => shell(message.as_str()),
        };

        tracing::info!(mode = ?mode, "Launching mail client");
        tracing::debug!(message = message.as_str(), "Dispatched message");

        let spawned = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn();
        let child =
            spawned.map_err(|e| Error::LaunchFailure(format!("cannot spawn {cmd:?}: {e}")))?;

        let label = match mode {
            DispatchMode::UriHandler => "URI handler",
            DispatchMode::Subprocess => "mail client command",
        };
        Ok(LaunchHandle::watch(child, label.to_string()))
    }
}

fn wait_child(child: Child, label: &str) -> Result<()> {
    let output = child
        .wait_with_output()
        .map_err(|e| Error::LaunchFailure(format!("cannot wait for {label}: {e}")))?;

    let code = output.status.code().ok_or_else(|| {
        Error::LaunchFailure(format!("{label} terminated without exit status"))
    })?;

    if code == 0 {
        tracing::debug!(code, "{label} exited gracefully");
        Ok(())
    } else {
        let err = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::warn!(code, err, "{label} exited with failure");
        Err(Error::LaunchFailure(format!(
            "{label} exited with status {code}: {err}"
        )))
    }
}

fn shell(command: &str) -> Command {
    let (shell, arg) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
    let mut cmd = Command::new(shell);
    cmd.arg(arg).arg(command);
    cmd
}

/// Command opening `uri` with the desktop's handler.
///
/// The URI is always one argument of a program that does not go through a
/// shell: `cmd /C start` would split a `mailto:` URI at its first `&`.
fn uri_opener(uri: &str) -> Command {
    let mut cmd = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(windows) {
        let mut cmd = Command::new("rundll32");
        cmd.arg("url.dll,FileProtocolHandler");
        cmd
    } else {
        Command::new("xdg-open")
    };
    cmd.arg(uri);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_handle() {
        assert!(LaunchHandle::ready(Ok(())).wait().is_ok());
        let handle = LaunchHandle::ready(Err(Error::LaunchFailure("no".into())));
        assert!(matches!(handle.try_outcome(), Some(Err(Error::LaunchFailure(_)))));
    }

    #[test]
    fn test_uri_opener_passes_uri_as_one_argument() {
        let uri = "mailto:?subject=x&body=y&attachment=file:///tmp/a.png";
        let cmd = uri_opener(uri);
        let args: Vec<&std::ffi::OsStr> = cmd.get_args().collect();

        assert_eq!(args.last().copied(), Some(std::ffi::OsStr::new(uri)));
        assert_ne!(cmd.get_program(), "cmd");
        assert!(!args.iter().any(|a| *a == "start" || *a == "/C"));
    }

    #[test]
    fn test_wait_timeout() {
        let handle = LaunchHandle::ready(Ok(()));
        assert!(matches!(handle.wait_timeout(Duration::from_millis(10)), Some(Ok(()))));
    }

    #[cfg(unix)]
    #[test]
    fn test_wait_timeout_while_child_runs() {
        let msg = ComposedMessage::new("sleep 5", DispatchMode::Subprocess).unwrap();
        let handle = SystemLauncher.dispatch(&msg, DispatchMode::Subprocess).unwrap();
        assert!(handle.wait_timeout(Duration::from_millis(50)).is_none());
        assert!(handle.try_outcome().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_subprocess_success() {
        let msg = ComposedMessage::new("true", DispatchMode::Subprocess).unwrap();
        let handle = SystemLauncher.dispatch(&msg, DispatchMode::Subprocess).unwrap();
        assert!(handle.wait().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_subprocess_non_zero_exit_is_reported() {
        let msg = ComposedMessage::new("echo nope >&2; exit 3", DispatchMode::Subprocess).unwrap();
        let handle = SystemLauncher.dispatch(&msg, DispatchMode::Subprocess).unwrap();
        match handle.wait().unwrap_err() {
            Error::LaunchFailure(reason) => {
                assert!(reason.contains("status 3"), "{reason}");
                assert!(reason.contains("nope"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
