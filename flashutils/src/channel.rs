// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

//! Transports for running shell commands with elevated privileges. Obtaining
//! root is not our concern. We only talk to an existing `su` binary (or `sh`
//! when already running as root).

use std::{
    ffi::{OsStr, OsString},
    fmt,
    io::{self, BufRead, BufReader, Write},
    process::{Child, ChildStdin, ChildStdout, Command, Stdio},
    sync::{Arc, Mutex, PoisonError},
};

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    command::shell_quote,
    util::{self, DebugString},
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to run command: {0:?}")]
    Spawn(DebugString, #[source] io::Error),
    #[error("Failed to communicate with shell session")]
    SessionIo(#[source] io::Error),
    #[error("Shell session exited while running command: {0:?}")]
    SessionExited(DebugString),
    #[error("Shell session is closed")]
    SessionClosed,
}

/// A channel that executes a single shell command string with elevated
/// privileges and returns the captured standard output.
///
/// Trailing newlines are removed from the output. The exit status of the
/// command is not reported. An error is returned only if the command could not
/// be run at all.
pub trait PrivilegedChannel {
    fn execute(&self, command: &str) -> Result<String, Error>;
}

macro_rules! channel_blanket_impl {
    ($type:ty) => {
        impl<C: ?Sized + PrivilegedChannel> PrivilegedChannel for $type {
            fn execute(&self, command: &str) -> Result<String, Error> {
                (**self).execute(command)
            }
        }
    };
}

channel_blanket_impl!(&C);
channel_blanket_impl!(Arc<C>);
channel_blanket_impl!(Box<C>);

/// Check if the current process is already running as root.
pub fn is_root() -> bool {
    #[cfg(unix)]
    {
        rustix::process::getuid().is_root()
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// A channel that spawns a new process for every command, eg. `su -c <cmd>`.
#[derive(Clone, Debug)]
pub struct ShellChannel {
    program: OsString,
    args: Vec<OsString>,
}

impl ShellChannel {
    /// Run commands as `<program> <args...> <command>`.
    pub fn new<I, S>(program: impl AsRef<OsStr>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Self {
            program: program.as_ref().to_owned(),
            args: args.into_iter().map(|a| a.as_ref().to_owned()).collect(),
        }
    }

    /// Run commands via `<su_program> -c <command>`.
    pub fn su(su_program: impl AsRef<OsStr>) -> Self {
        Self::new(su_program, ["-c"])
    }

    /// Run commands via `sh -c <command>` without changing privileges.
    pub fn sh() -> Self {
        Self::new("sh", ["-c"])
    }

    /// Use `sh` if we're already root. Otherwise, go through `su`.
    pub fn detect(su_program: impl AsRef<OsStr>) -> Self {
        if is_root() {
            debug!("Already running as root; not using su");
            Self::sh()
        } else {
            Self::su(su_program)
        }
    }
}

impl PrivilegedChannel for ShellChannel {
    fn execute(&self, command: &str) -> Result<String, Error> {
        let mut process = Command::new(&self.program);
        process.args(&self.args);
        process.arg(command);
        process.stdin(Stdio::null());
        process.stdout(Stdio::piped());
        process.stderr(Stdio::null());

        trace!("Executing: {process:?}");

        let output = process
            .output()
            .map_err(|e| Error::Spawn(DebugString::new(&process), e))?;

        trace!("Command exited with status: {}", output.status);

        let stdout = String::from_utf8_lossy(&output.stdout);

        Ok(util::trim_newlines(&stdout).to_owned())
    }
}

struct SessionState {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// A long-lived root shell that is reused across commands.
///
/// The session is owned by the caller. It should be released with
/// [`Self::close()`]. If it is dropped instead, the shell process is killed.
/// Each command runs in its own `sh -c` child of the session shell, so a
/// malformed command only fails itself and shell state such as the working
/// directory does not carry over between commands. Commands must not read from
/// stdin.
pub struct SuSession {
    program: OsString,
    marker: String,
    state: Mutex<Option<SessionState>>,
}

impl fmt::Debug for SuSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuSession")
            .field("program", &self.program)
            .field("marker", &self.marker)
            .finish_non_exhaustive()
    }
}

impl SuSession {
    /// Start a session with `su` (or any other shell-like program that reads
    /// commands from stdin).
    pub fn spawn(program: impl AsRef<OsStr>) -> Result<Self, Error> {
        let mut process = Command::new(program.as_ref());
        process.stdin(Stdio::piped());
        process.stdout(Stdio::piped());
        process.stderr(Stdio::null());

        let mut child = process
            .spawn()
            .map_err(|e| Error::Spawn(DebugString::new(&process), e))?;

        // These are always present since both were explicitly piped.
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::SessionClosed);
        };

        let marker = format!("__flashutils_{:016x}__", rand::random::<u64>());

        debug!("Started shell session: {process:?}");

        Ok(Self {
            program: program.as_ref().to_owned(),
            marker,
            state: Mutex::new(Some(SessionState {
                child,
                stdin,
                stdout: BufReader::new(stdout),
            })),
        })
    }

    /// Check if the shell process is still usable.
    pub fn is_open(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Ask the shell to exit and wait for it.
    pub fn close(self) -> Result<(), Error> {
        let state = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(SessionState {
            mut child,
            mut stdin,
            stdout,
        }) = state
        else {
            return Ok(());
        };

        // The shell may already be gone, in which case the write fails, but
        // waiting still reaps it.
        let _ = stdin.write_all(b"exit\n");
        drop(stdin);
        drop(stdout);

        let status = child.wait().map_err(Error::SessionIo)?;
        debug!("Shell session {:?} exited with status: {status}", self.program);

        Ok(())
    }

    fn run(&self, state: &mut SessionState, command: &str) -> Result<String, Error> {
        // The bare echo guarantees that the marker starts on its own line,
        // even if the command's output does not end in a newline. The command
        // is quoted as a whole so that unbalanced quotes inside it can't
        // swallow the marker.
        let script = format!(
            "sh -c {}\necho\necho {}\n",
            shell_quote(command),
            self.marker,
        );

        state
            .stdin
            .write_all(script.as_bytes())
            .and_then(|()| state.stdin.flush())
            .map_err(Error::SessionIo)?;

        let mut output = Vec::new();
        let mut line = Vec::new();

        loop {
            line.clear();

            let n = state
                .stdout
                .read_until(b'\n', &mut line)
                .map_err(Error::SessionIo)?;
            if n == 0 {
                return Err(Error::SessionExited(DebugString::new(command)));
            }

            if line.strip_suffix(b"\n") == Some(self.marker.as_bytes()) {
                break;
            }

            output.extend_from_slice(&line);
        }

        // Remove the newline from the bare echo.
        output.pop();

        let output = String::from_utf8_lossy(&output);

        Ok(util::trim_newlines(&output).to_owned())
    }
}

impl PrivilegedChannel for SuSession {
    fn execute(&self, command: &str) -> Result<String, Error> {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let state = guard.as_mut().ok_or(Error::SessionClosed)?;

        trace!("Executing in session: {command:?}");

        match self.run(state, command) {
            Ok(output) => Ok(output),
            Err(e) => {
                // The pipes are in an unknown state. Don't reuse them.
                if let Some(mut state) = guard.take() {
                    let _ = state.child.kill();
                    let _ = state.child.wait();
                }
                Err(e)
            }
        }
    }
}

impl Drop for SuSession {
    fn drop(&mut self) {
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(mut state) = state {
            let _ = state.child.kill();
            let _ = state.child.wait();
        }
    }
}
