//! Spawning a resolved [`Invocation`] and relaying its streams.
//!
//! The call is bounded by the request's timeout (30 seconds unless changed),
//! measured until the child has exited and, in [`StdioMode::Pipe`], both
//! captured streams have closed. When the deadline passes or the caller
//! cancels, the child is asked to terminate (SIGTERM on Unix), given
//! [`SHUTDOWN_GRACE`] to exit, then killed and reaped. Outside
//! [`StdioMode::Inherit`] the child leads its own process group on Unix, so
//! anything it started is signalled along with it.

use crate::resolver::{Invocation, ToolArgs};
use crate::tool::{INVOCATION_TIMEOUT, SHUTDOWN_GRACE};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

/// How often the wait loop checks for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Where the child's standard streams go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdioMode {
    /// Share the caller's stdin, stdout and stderr. Nothing is captured.
    Inherit,
    /// Capture stdout and stderr into the result.
    #[default]
    Pipe,
    /// Discard all output.
    Ignore,
}

/// Cooperative cancellation for an in-flight invocation.
///
/// Clones share the same flag, so one can be handed to a signal handler while
/// another travels with the request.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A single call into the tool.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub args: ToolArgs,
    pub stdio: StdioMode,
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub cancel: Option<CancelHandle>,
}

impl InvocationRequest {
    pub fn new(args: impl Into<ToolArgs>) -> Self {
        Self {
            args: args.into(),
            stdio: StdioMode::default(),
            cwd: None,
            env: BTreeMap::new(),
            timeout: Some(INVOCATION_TIMEOUT),
            cancel: None,
        }
    }

    pub fn stdio(mut self, stdio: StdioMode) -> Self {
        self.stdio = stdio;
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cancel_on(mut self, handle: CancelHandle) -> Self {
        self.cancel = Some(handle);
        self
    }
}

/// Outcome of a completed invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationResult {
    pub exit_code: i32,
    /// Empty unless the request used [`StdioMode::Pipe`].
    pub stdout: String,
    pub stderr: String,
}

impl InvocationResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Why a bounded wait gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    TimedOut,
    Cancelled,
}

type Capture = Receiver<io::Result<Vec<u8>>>;

/// Spawn `invocation` and wait for it according to `request`.
pub fn run(invocation: &Invocation, request: &InvocationRequest) -> Result<InvocationResult> {
    let mut command = Command::new(&invocation.program);
    command.args(&invocation.args).envs(&request.env);
    if let Some(cwd) = &request.cwd {
        command.current_dir(cwd);
    }

    match request.stdio {
        StdioMode::Inherit => {
            command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
        }
        StdioMode::Pipe => {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
        }
        StdioMode::Ignore => {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
        }
    }

    // An inherited terminal keeps the child in our group for job control.
    let group = cfg!(unix) && request.stdio != StdioMode::Inherit;
    #[cfg(unix)]
    if group {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    tracing::debug!(
        "spawning {} {:?}",
        invocation.program.display(),
        invocation.args
    );
    let mut child = command.spawn().map_err(|source| Error::Spawn {
        program: invocation.program.clone(),
        source,
    })?;

    let stdout = child.stdout.take().map(capture);
    let stderr = child.stderr.take().map(capture);

    let mut running = Running {
        child,
        program: &invocation.program,
        timeout: request.timeout,
        deadline: request.timeout.map(|limit| Instant::now() + limit),
        cancel: request.cancel.as_ref(),
        group,
    };
    running.finish(stdout, stderr)
}

/// A spawned child plus the bounds it runs under.
struct Running<'a> {
    child: Child,
    program: &'a Path,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
    cancel: Option<&'a CancelHandle>,
    group: bool,
}

impl Running<'_> {
    /// Wait for exit, then for both captured streams to close.
    ///
    /// Readers are left detached on the error paths: a grandchild may still
    /// hold the pipes open after the child is gone.
    fn finish(
        &mut self,
        stdout: Option<Capture>,
        stderr: Option<Capture>,
    ) -> Result<InvocationResult> {
        let (deadline, cancel) = (self.deadline, self.cancel);

        let waited = bounded(deadline, cancel, |slice| self.child.wait_timeout(slice));
        let status = self.settle(waited)?;

        let stdout = self.settle(drain(stdout, deadline, cancel))?;
        let stderr = self.settle(drain(stderr, deadline, cancel))?;

        Ok(InvocationResult {
            exit_code: exit_code(status),
            stdout,
            stderr,
        })
    }

    fn settle<T>(&mut self, outcome: io::Result<std::result::Result<T, Stop>>) -> Result<T> {
        let stop = match outcome {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(stop)) => stop,
            Err(e) => {
                terminate(&mut self.child, SHUTDOWN_GRACE, self.group);
                return Err(e.into());
            }
        };

        match stop {
            Stop::TimedOut => {
                let limit = self.timeout.unwrap_or(INVOCATION_TIMEOUT);
                tracing::warn!(
                    "{} exceeded {}s, terminating",
                    self.program.display(),
                    limit.as_secs()
                );
                terminate(&mut self.child, SHUTDOWN_GRACE, self.group);
                Err(Error::Timeout(limit))
            }
            Stop::Cancelled => {
                tracing::debug!("invocation cancelled, terminating child");
                terminate(&mut self.child, SHUTDOWN_GRACE, self.group);
                Err(Error::Cancelled)
            }
        }
    }
}

/// Call `step` in short slices until it yields, the deadline passes or the
/// handle is cancelled.
fn bounded<T>(
    deadline: Option<Instant>,
    cancel: Option<&CancelHandle>,
    mut step: impl FnMut(Duration) -> io::Result<Option<T>>,
) -> io::Result<std::result::Result<T, Stop>> {
    loop {
        if cancel.is_some_and(CancelHandle::is_cancelled) {
            return Ok(Err(Stop::Cancelled));
        }

        let slice = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Ok(Err(Stop::TimedOut));
                }
                (deadline - now).min(POLL_INTERVAL)
            }
            None => POLL_INTERVAL,
        };

        if let Some(value) = step(slice)? {
            return Ok(Ok(value));
        }
    }
}

fn capture<R: Read + Send + 'static>(mut stream: R) -> Capture {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let read = stream.read_to_end(&mut buf).map(|_| buf);
        // the receiver is gone once the call has given up
        let _ = tx.send(read);
    });
    rx
}

fn drain(
    capture: Option<Capture>,
    deadline: Option<Instant>,
    cancel: Option<&CancelHandle>,
) -> io::Result<std::result::Result<String, Stop>> {
    let Some(rx) = capture else {
        return Ok(Ok(String::new()));
    };

    let bytes = bounded(deadline, cancel, |slice| match rx.recv_timeout(slice) {
        Ok(read) => read.map(Some),
        Err(RecvTimeoutError::Timeout) => Ok(None),
        Err(RecvTimeoutError::Disconnected) => Err(io::Error::other("output reader panicked")),
    })?;
    Ok(bytes.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
}

/// Ask the child to exit, then kill it once `grace` has passed.
///
/// With `group` set the whole process group is signalled and anything left
/// in it after the grace period is killed too. Always reaps the child before
/// returning.
pub(crate) fn terminate(child: &mut Child, grace: Duration, group: bool) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, kill, killpg};
        use nix::unistd::Pid;

        let pid = Pid::from_raw(child.id() as i32);
        let signal = |sig: Signal| {
            let _ = if group { killpg(pid, sig) } else { kill(pid, sig) };
        };

        signal(Signal::SIGTERM);
        let exited = matches!(child.wait_timeout(grace), Ok(Some(_)));
        if group {
            signal(Signal::SIGKILL);
        }
        if exited {
            return;
        }
    }

    #[cfg(not(unix))]
    let _ = (grace, group);

    let _ = child.kill();
    let _ = child.wait();
}
/// The child's exit code; `128 + signal` for signal deaths on Unix, else 0.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    0
}
