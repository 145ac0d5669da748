//! Shared test utilities for the crate's unit tests.

use crate::exec::CommandExecutor;
use camino::Utf8PathBuf;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::process::{ExitStatus, Output};
use tempfile::TempDir;

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with the given stdout.
pub fn success_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given exit code and stderr.
pub fn failure_output(code: i32, stderr: &str) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// An expected command invocation and the result to replay for it.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The program, e.g. `git`.
    pub program: &'static str,
    /// The exact argument list.
    pub args: Vec<String>,
    /// What the stub returns.
    pub result: io::Result<Output>,
}

impl ExpectedCall {
    /// Expects `program args` and replays `output`.
    pub fn new(program: &'static str, args: &[&str], output: Output) -> Self {
        Self {
            program,
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
            result: Ok(output),
        }
    }
}

/// A queue-based `CommandExecutor` that asserts invocations in order.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a stub that expects exactly `expected`, in order.
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that every expected invocation was consumed.
    ///
    /// # Panics
    ///
    /// Panics if expected calls remain.
    pub fn assert_finished(&self) {
        let remaining = self.expected.borrow();
        assert!(
            remaining.is_empty(),
            "expected no further command invocations, {} remaining: {:?}",
            remaining.len(),
            remaining.front().map(|call| (&call.program, &call.args))
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, program: &str, args: &[String]) -> io::Result<Output> {
        let call = self
            .expected
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected command invocation: {program} {args:?}"));

        assert_eq!(call.program, program);
        assert_eq!(call.args.as_slice(), args);

        call.result
    }
}

/// A temporary directory exposed as a UTF-8 path.
pub struct TempWorkspace {
    _temp: TempDir,
    /// UTF-8 path of the temporary directory.
    pub path: Utf8PathBuf,
}

/// Creates a fresh [`TempWorkspace`].
pub fn temp_workspace() -> TempWorkspace {
    let temp = TempDir::new().expect("failed to create temp dir");
    let path = Utf8PathBuf::try_from(temp.path().to_owned()).expect("non-UTF8 temp path");
    TempWorkspace { _temp: temp, path }
}
