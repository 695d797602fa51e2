use crate::trace::TraceWriter;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// The duration to wait after sending SIGINT before escalating to SIGTERM.
const SIGINT_TIMEOUT: Duration = Duration::from_millis(7500);
/// The duration to wait after sending SIGTERM before escalating to SIGKILL.
const SIGTERM_TIMEOUT: Duration = Duration::from_millis(2500);
/// How long the stream readers may keep draining once a process was stopped.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Failure modes of a subprocess run.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to start process '{file_name}'")]
    Spawn {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for process '{file_name}'")]
    Wait {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("exit code {exit_code} returned from process: file name '{file_name}', arguments '{arguments}'")]
    ExitCode {
        exit_code: i32,
        file_name: String,
        arguments: String,
    },

    #[error("process '{file_name}' did not finish within {timeout:?} and was killed")]
    TimedOut { file_name: String, timeout: Duration },

    #[error("process '{file_name}' was cancelled")]
    Cancelled { file_name: String },
}

impl ProcessError {
    /// Rewrite the program name and arguments carried by the error.
    pub fn map_text(self, f: impl Fn(&str) -> String) -> Self {
        match self {
            ProcessError::Spawn { file_name, source } => ProcessError::Spawn {
                file_name: f(&file_name),
                source,
            },
            ProcessError::Wait { file_name, source } => ProcessError::Wait {
                file_name: f(&file_name),
                source,
            },
            ProcessError::ExitCode {
                exit_code,
                file_name,
                arguments,
            } => ProcessError::ExitCode {
                exit_code,
                file_name: f(&file_name),
                arguments: f(&arguments),
            },
            ProcessError::TimedOut { file_name, timeout } => ProcessError::TimedOut {
                file_name: f(&file_name),
                timeout,
            },
            ProcessError::Cancelled { file_name } => ProcessError::Cancelled {
                file_name: f(&file_name),
            },
        }
    }
}

/// A line received from stdout or stderr, without its trailing newline.
#[derive(Debug, Clone)]
pub struct ProcessDataReceivedEventArgs {
    pub data: String,
}

/// Everything needed to launch one subprocess.
#[derive(Debug, Clone, Default)]
pub struct ProcessStartInfo {
    pub file_name: String,
    pub arguments: Vec<String>,
    /// Ignored when `None` or not an existing directory.
    pub working_directory: Option<PathBuf>,
    /// Merged over the inherited host environment.
    pub environment: HashMap<String, String>,
    /// Upper bound on the run; `None` waits forever.
    pub timeout: Option<Duration>,
    pub require_exit_code_zero: bool,
    /// Skip SIGINT/SIGTERM and kill immediately on cancel or timeout.
    pub kill_process_on_cancel: bool,
}

impl ProcessStartInfo {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.arguments.push(arg.into());
        self
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn environment(mut self, env: HashMap<String, String>) -> Self {
        self.environment = env;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn require_exit_code_zero(mut self, require: bool) -> Self {
        self.require_exit_code_zero = require;
        self
    }

    fn joined_arguments(&self) -> String {
        self.arguments.join(" ")
    }
}

/// Spawns a child process, drains stdout and stderr on two independent tasks,
/// and enforces the optional timeout and cancellation (SIGINT → SIGTERM → SIGKILL).
///
/// Output lines are delivered through unbounded channels. Take the receivers
/// before calling [`ProcessInvoker::execute`] and consume them concurrently;
/// both channels close once the invoker is dropped.
pub struct ProcessInvoker {
    trace: Arc<dyn TraceWriter>,
    stdout_tx: mpsc::UnboundedSender<ProcessDataReceivedEventArgs>,
    stdout_rx: Option<mpsc::UnboundedReceiver<ProcessDataReceivedEventArgs>>,
    stderr_tx: mpsc::UnboundedSender<ProcessDataReceivedEventArgs>,
    stderr_rx: Option<mpsc::UnboundedReceiver<ProcessDataReceivedEventArgs>>,
}

impl ProcessInvoker {
    pub fn new(trace: Arc<dyn TraceWriter>) -> Self {
        let (stdout_tx, stdout_rx) = mpsc::unbounded_channel();
        let (stderr_tx, stderr_rx) = mpsc::unbounded_channel();
        Self {
            trace,
            stdout_tx,
            stdout_rx: Some(stdout_rx),
            stderr_tx,
            stderr_rx: Some(stderr_rx),
        }
    }

    /// Take the stdout receiver. Can only be called once; subsequent calls return `None`.
    pub fn take_stdout_receiver(
        &mut self,
    ) -> Option<mpsc::UnboundedReceiver<ProcessDataReceivedEventArgs>> {
        self.stdout_rx.take()
    }

    /// Take the stderr receiver. Can only be called once; subsequent calls return `None`.
    pub fn take_stderr_receiver(
        &mut self,
    ) -> Option<mpsc::UnboundedReceiver<ProcessDataReceivedEventArgs>> {
        self.stderr_rx.take()
    }

    /// Run the process to completion and return its exit code.
    ///
    /// Both stream readers are started before the wait begins, so a child that
    /// fills one pipe can never deadlock against the parent.
    pub async fn execute(
        &self,
        info: &ProcessStartInfo,
        cancellation_token: CancellationToken,
    ) -> Result<i32, ProcessError> {
        let file_name = info.file_name.as_str();
        let arguments = info.joined_arguments();

        self.trace.info("Starting process:");
        self.trace.info(&format!("  File name: '{file_name}'"));
        self.trace.info(&format!("  Arguments: '{arguments}'"));
        if let Some(dir) = &info.working_directory {
            self.trace
                .info(&format!("  Working directory: '{}'", dir.display()));
        }
        self.trace.info(&format!(
            "  Require exit code zero: '{}'",
            info.require_exit_code_zero
        ));
        match info.timeout {
            Some(t) => self.trace.info(&format!("  Timeout: {t:?}")),
            None => self.trace.info("  Timeout: none"),
        }

        let mut cmd = Command::new(file_name);
        cmd.args(&info.arguments);

        if let Some(dir) = &info.working_directory {
            if dir.is_dir() {
                cmd.current_dir(dir);
            }
        }

        cmd.envs(&info.environment);

        // CI=true unless the host or the caller already decided otherwise
        if std::env::var_os("CI").is_none() && !info.environment.contains_key("CI") {
            cmd.env("CI", "true");
        }

        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd.stdin(std::process::Stdio::null());

        // Own process group, so a stop reaches everything the child forked.
        #[cfg(unix)]
        cmd.process_group(0);

        let start = std::time::Instant::now();
        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            file_name: file_name.to_string(),
            source,
        })?;

        let pid = child.id().unwrap_or(0);
        self.trace.info(&format!(
            "Process started with process id {pid}, waiting for process exit."
        ));

        let mut stdout_task = tokio::spawn(pump_lines(
            child.stdout.take(),
            self.stdout_tx.clone(),
            self.trace.clone(),
            "STDOUT",
        ));
        let mut stderr_task = tokio::spawn(pump_lines(
            child.stderr.take(),
            self.stderr_tx.clone(),
            self.trace.clone(),
            "STDERR",
        ));

        let exit_code: i32;
        let mut interrupted: Option<ProcessError> = None;

        tokio::select! {
            status = child.wait() => {
                match status {
                    Ok(s) => exit_code = s.code().unwrap_or(-1),
                    Err(source) => {
                        return Err(ProcessError::Wait {
                            file_name: file_name.to_string(),
                            source,
                        });
                    }
                }
            }
            _ = sleep_or_pending(info.timeout) => {
                let timeout = info.timeout.unwrap_or_default();
                self.trace.warning(&format!(
                    "Process {pid} exceeded its time limit of {timeout:?}."
                ));
                exit_code = self.cancel_and_kill_process(&mut child, pid, info.kill_process_on_cancel).await;
                interrupted = Some(ProcessError::TimedOut {
                    file_name: file_name.to_string(),
                    timeout,
                });
            }
            _ = cancellation_token.cancelled() => {
                self.trace.info("Cancellation requested.");
                exit_code = self.cancel_and_kill_process(&mut child, pid, info.kill_process_on_cancel).await;
                interrupted = Some(ProcessError::Cancelled {
                    file_name: file_name.to_string(),
                });
            }
        }

        // Readers end when the pipes close. After a stop, a straggler that
        // escaped the group may still hold them open.
        if interrupted.is_some() {
            let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
                let _ = (&mut stdout_task).await;
                let _ = (&mut stderr_task).await;
            })
            .await;
            if drained.is_err() {
                self.trace
                    .warning("Output streams still open after the process was stopped.");
                stdout_task.abort();
                stderr_task.abort();
            }
        } else {
            let _ = stdout_task.await;
            let _ = stderr_task.await;
        }

        let elapsed = start.elapsed();
        self.trace.info(&format!(
            "Finished process {pid} with exit code {exit_code}, and elapsed time {elapsed:.2?}."
        ));

        if let Some(err) = interrupted {
            return Err(err);
        }

        if exit_code != 0 && info.require_exit_code_zero {
            return Err(ProcessError::ExitCode {
                exit_code,
                file_name: file_name.to_string(),
                arguments,
            });
        }

        Ok(exit_code)
    }

    /// Attempt graceful termination of the process group led by `pgid`:
    /// SIGINT → SIGTERM → SIGKILL. If `kill_immediately` is true, skip
    /// straight to the kill.
    async fn cancel_and_kill_process(
        &self,
        child: &mut tokio::process::Child,
        pgid: u32,
        kill_immediately: bool,
    ) -> i32 {
        let exit_code = 'stopped: {
            if !kill_immediately {
                if self
                    .send_signal_and_wait(child, pgid, Signal::Int, SIGINT_TIMEOUT)
                    .await
                {
                    self.trace.info("Process stopped through SIGINT.");
                    break 'stopped wait_exit_code(child).await;
                }

                if self
                    .send_signal_and_wait(child, pgid, Signal::Term, SIGTERM_TIMEOUT)
                    .await
                {
                    self.trace.info("Process terminated through SIGTERM.");
                    break 'stopped wait_exit_code(child).await;
                }
            }

            self.trace.info("Killing process.");
            let _ = child.kill().await;
            wait_exit_code(child).await
        };

        // Descendants that ignored the softer signals.
        self.kill_group(pgid);
        exit_code
    }

    #[cfg(unix)]
    fn kill_group(&self, pgid: u32) {
        if pgid == 0 {
            return;
        }
        let group = nix::unistd::Pid::from_raw(pgid as i32);
        if nix::sys::signal::killpg(group, nix::sys::signal::Signal::SIGKILL).is_ok() {
            self.trace
                .verbose(&format!("Sent SIGKILL to process group {pgid}."));
        }
    }

    #[cfg(not(unix))]
    fn kill_group(&self, _pgid: u32) {}

    /// Send a signal to the child's process group and wait up to `timeout`
    /// for the child to exit. Returns `true` if it exited within the timeout.
    #[cfg(unix)]
    async fn send_signal_and_wait(
        &self,
        child: &mut tokio::process::Child,
        pgid: u32,
        signal: Signal,
        timeout: Duration,
    ) -> bool {
        if child.id().is_none() || pgid == 0 {
            // already reaped
            return true;
        }

        let sig = match signal {
            Signal::Int => nix::sys::signal::Signal::SIGINT,
            Signal::Term => nix::sys::signal::Signal::SIGTERM,
        };

        self.trace
            .info(&format!("Sending {sig:?} to process group {pgid}."));

        if nix::sys::signal::killpg(nix::unistd::Pid::from_raw(pgid as i32), sig).is_err() {
            self.trace
                .info(&format!("{sig:?} signal failed to send to process group {pgid}."));
            return false;
        }

        tokio::select! {
            result = child.wait() => result.is_ok(),
            _ = tokio::time::sleep(timeout) => {
                self.trace.info(&format!(
                    "Process did not honor {sig:?} within {:.1}s.",
                    timeout.as_secs_f64()
                ));
                false
            }
        }
    }

    #[cfg(not(unix))]
    async fn send_signal_and_wait(
        &self,
        child: &mut tokio::process::Child,
        _pgid: u32,
        _signal: Signal,
        timeout: Duration,
    ) -> bool {
        tokio::select! {
            result = child.wait() => result.is_ok(),
            _ = tokio::time::sleep(timeout) => false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    Int,
    Term,
}

async fn wait_exit_code(child: &mut tokio::process::Child) -> i32 {
    child
        .wait()
        .await
        .map(|s| s.code().unwrap_or(-1))
        .unwrap_or(-1)
}

async fn sleep_or_pending(timeout: Option<Duration>) {
    match timeout {
        Some(t) => tokio::time::sleep(t).await,
        None => std::future::pending::<()>().await,
    }
}

/// Forward every line of `stream` to `tx`. Invalid UTF-8 is replaced rather
/// than ending the stream early.
async fn pump_lines<R>(
    stream: Option<R>,
    tx: mpsc::UnboundedSender<ProcessDataReceivedEventArgs>,
    trace: Arc<dyn TraceWriter>,
    label: &'static str,
) where
    R: AsyncRead + Unpin,
{
    if let Some(stream) = stream {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    while matches!(buf.last(), Some(b'\n') | Some(b'\r')) {
                        buf.pop();
                    }
                    let data = String::from_utf8_lossy(&buf).into_owned();
                    let _ = tx.send(ProcessDataReceivedEventArgs { data });
                }
                Err(e) => {
                    trace.warning(&format!("{label} stream read failed: {e}"));
                    break;
                }
            }
        }
    }
    trace.verbose(&format!("{label} stream read finished."));
}
