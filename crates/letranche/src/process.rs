//! Child-process execution with a wall-clock timeout
//!
//! The slicer is run synchronously, but an unresponsive slicer must not block
//! the whole search, so the child is polled against a deadline and killed on
//! expiry. Output pipes are drained on helper threads to keep the child from
//! stalling on a full pipe buffer.
//!
//! On unix the child leads its own process group. Launcher wrappers
//! (`flatpak run`, `sh script`) start the real slicer as a grandchild, so the
//! whole group is killed on timeout, and anything still running in the group
//! once the direct child has exited is killed as well. Collecting the drained
//! output is bounded by the same deadline.

use std::ffi::OsStr;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Poll interval while waiting for the child to exit
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Errors that prevent a process run from producing output
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be started (missing binary, permissions, ...)
    #[error("failed to launch {program}: {source}")]
    Launch {
        /// Program that failed to start
        program: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The program did not exit within the allowed time and was killed
    #[error("{program} did not finish within {}s and was killed", .timeout.as_secs_f64())]
    Timeout {
        /// Program that timed out
        program: String,
        /// Timeout that expired
        timeout: Duration,
    },

    /// Waiting on the child failed
    #[error("failed while waiting for {program}: {source}")]
    Wait {
        /// Program being waited on
        program: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Captured result of a finished process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit status
    pub status: ExitStatus,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with status zero
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, `None` if terminated by a signal
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Standard output followed by standard error
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Run `program` with `args`, killing it if it outlives `timeout`
///
/// A timeout too large to represent as an [`Instant`] means no deadline.
pub fn run_with_timeout<S, I, A>(
    program: S,
    args: I,
    timeout: Duration,
) -> Result<ProcessOutput, ProcessError>
where
    S: AsRef<OsStr>,
    I: IntoIterator<Item = A>,
    A: AsRef<OsStr>,
{
    let program_name = program.as_ref().to_string_lossy().into_owned();
    let timed_out = |program: String| ProcessError::Timeout { program, timeout };

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    own_process_group(&mut command);

    let mut child = command.spawn().map_err(|source| ProcessError::Launch {
        program: program_name.clone(),
        source,
    })?;

    let deadline = Instant::now().checked_add(timeout);
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(source) => {
                kill_group(&mut child);
                return Err(ProcessError::Wait {
                    program: program_name,
                    source,
                });
            }
        }

        if deadline.is_some_and(|d| Instant::now() >= d) {
            kill_group(&mut child);
            let _ = child.wait();
            // Reader threads are left detached; they end once the pipes close.
            return Err(timed_out(program_name));
        }

        thread::sleep(POLL_INTERVAL);
    };

    // Stragglers left in the group would hold the pipes open.
    kill_group(&mut child);

    let stdout = collect(stdout, deadline).ok_or_else(|| timed_out(program_name.clone()))?;
    let stderr = collect(stderr, deadline).ok_or_else(|| timed_out(program_name))?;

    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
    })
}

#[cfg(unix)]
fn own_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_command: &mut Command) {}

/// Kill the child and every process in its group
#[cfg(unix)]
fn kill_group(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Ok(pid) = i32::try_from(child.id()) {
        // ESRCH just means the group is already empty.
        let _ = killpg(Pid::from_raw(pid), Signal::SIGKILL);
    }
    let _ = child.kill();
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) {
    let _ = child.kill();
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

/// Drained pipe contents, or `None` if the deadline passes first
fn collect(pipe: Option<Receiver<String>>, deadline: Option<Instant>) -> Option<String> {
    let Some(rx) = pipe else {
        return Some(String::new());
    };

    let received = match deadline {
        Some(deadline) => rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
        None => rx.recv().map_err(mpsc::RecvTimeoutError::from),
    };

    match received {
        Ok(text) => Some(text),
        Err(mpsc::RecvTimeoutError::Disconnected) => Some(String::new()),
        Err(mpsc::RecvTimeoutError::Timeout) => None,
    }
}
