//! External command execution.
//!
//! Git and object-storage collaborators drive command-line tools. They do so
//! through [`CommandExecutor`] so tests can replay canned outputs instead of
//! spawning processes.

use std::io::{self, Read};
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Default timeout for a single external command (30 minutes).
///
/// A non-shallow clone of a large repository routinely takes several minutes.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs `program` with `args` and returns the captured output.
    ///
    /// A non-zero exit status is not an error at this level; callers inspect
    /// [`Output::status`].
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while spawning or waiting for the command,
    /// including [`io::ErrorKind::TimedOut`] when the command overruns. Output
    /// of a command that timed out is discarded.
    fn run(&self, program: &str, args: &[String]) -> io::Result<Output>;
}

/// Executes commands on the host system, killing any that exceed a timeout.
#[derive(Debug, Clone, Copy)]
pub struct SystemCommandExecutor {
    timeout: Duration,
}

impl Default for SystemCommandExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

impl SystemCommandExecutor {
    /// Creates an executor with the given per-command timeout.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, program: &str, args: &[String]) -> io::Result<Output> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Pipes are drained concurrently so a chatty child cannot block on a
        // full pipe buffer while we wait for it.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let Some(status) = child.wait_timeout(self.timeout)? else {
            // Best effort: the child may already have exited.
            let _ = child.kill();
            let _ = child.wait();
            // Readers are detached, not joined. A grandchild that inherited
            // the pipes (such as a git remote helper) keeps them open, and
            // each reader exits once the last writer closes its end.
            drop((stdout, stderr));
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!(
                    "{program} timed out after {} seconds",
                    self.timeout.as_secs()
                ),
            ));
        };

        Ok(Output {
            status,
            stdout: collect(stdout)?,
            stderr: collect(stderr)?,
        })
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(reader: Option<JoinHandle<io::Result<Vec<u8>>>>) -> io::Result<Vec<u8>> {
    match reader {
        Some(handle) => handle
            .join()
            .map_err(|_| io::Error::other("output reader thread panicked"))?,
        None => Ok(Vec::new()),
    }
}

/// Returns the trimmed stderr of a failed command, or a status description
/// when stderr is empty.
pub(crate) fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        format!("exited with {}", output.status)
    } else {
        trimmed.to_owned()
    }
}

/// Converts string slices into the owned argument list expected by
/// [`CommandExecutor::run`].
pub(crate) fn args<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_output_of_successful_command() {
        let executor = SystemCommandExecutor::default();
        let output = executor
            .run("sh", &args(["-c", "printf hello; printf oops >&2"]))
            .expect("sh should run");
        assert!(output.status.success());
        assert_eq!(output.stdout, b"hello");
        assert_eq!(failure_message(&output), "oops");
    }

    #[test]
    fn kills_commands_that_overrun() {
        let executor = SystemCommandExecutor::new(Duration::from_millis(100));
        let err = executor
            .run("sleep", &args(["5"]))
            .expect_err("sleep should time out");
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn timeout_is_not_held_up_by_inherited_pipes() {
        let executor = SystemCommandExecutor::new(Duration::from_millis(100));
        let started = std::time::Instant::now();
        let err = executor
            .run("sh", &args(["-c", "sleep 5 & sleep 5"]))
            .expect_err("sh should time out");
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(
            started.elapsed() < Duration::from_secs(4),
            "timed out after {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn missing_program_is_an_io_error() {
        let executor = SystemCommandExecutor::default();
        let result = executor.run("definitely-not-a-real-program-4711", &[]);
        assert!(result.is_err());
    }

    #[test]
    fn failure_message_falls_back_to_status() {
        let executor = SystemCommandExecutor::default();
        let output = executor
            .run("sh", &args(["-c", "exit 3"]))
            .expect("sh should run");
        assert!(failure_message(&output).contains('3'));
    }
}
