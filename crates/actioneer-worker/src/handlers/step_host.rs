// StepHost: runs one subprocess for an action on the host, draining stdout
// and stderr concurrently and masking every line before it is printed or
// captured.

use actioneer_common::Terminal;
use actioneer_sdk::{ProcessDataReceivedEventArgs, ProcessError, ProcessInvoker, ProcessStartInfo};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::handlers::handler::ActionOutput;
use crate::run_context::RunContext;

type LineReceiver = UnboundedReceiver<ProcessDataReceivedEventArgs>;

pub struct StepHost<'a> {
    context: &'a RunContext,
    trace_name: &'a str,
}

impl<'a> StepHost<'a> {
    pub fn new(context: &'a RunContext, trace_name: &'a str) -> Self {
        Self {
            context,
            trace_name,
        }
    }

    /// A start info with the run's environment and step timeout applied.
    pub fn start_info(&self, file_name: impl Into<String>) -> ProcessStartInfo {
        ProcessStartInfo::new(file_name)
            .environment(self.context.store().environment())
            .timeout(self.context.settings().step_timeout())
            .require_exit_code_zero(true)
    }

    /// Run `info` to completion. Masked lines land in `output` even when the
    /// process fails.
    pub async fn execute(
        &self,
        info: &ProcessStartInfo,
        output: &mut ActionOutput,
    ) -> Result<i32, ProcessError> {
        let mut invoker = ProcessInvoker::new(self.context.trace(self.trace_name));
        let stdout_rx = invoker.take_stdout_receiver();
        let stderr_rx = invoker.take_stderr_receiver();

        let collector = tokio::spawn(collect_lines(
            stdout_rx,
            stderr_rx,
            self.context.terminal().clone(),
        ));

        let result = invoker.execute(info, self.context.cancel_token()).await;

        // Closing the senders lets the collector finish.
        drop(invoker);
        match collector.await {
            Ok(captured) => {
                output.stdout.push_str(&captured.stdout);
                output.stderr.push_str(&captured.stderr);
            }
            Err(e) => tracing::warn!("Output collector for '{}' failed: {}", info.file_name, e),
        }

        result
    }
}

async fn next_line(rx: &mut Option<LineReceiver>) -> Option<String> {
    match rx {
        Some(rx) => rx.recv().await.map(|e| e.data),
        None => None,
    }
}

async fn collect_lines(
    mut stdout_rx: Option<LineReceiver>,
    mut stderr_rx: Option<LineReceiver>,
    terminal: Terminal,
) -> ActionOutput {
    let mut output = ActionOutput::default();
    let mut stdout_open = stdout_rx.is_some();
    let mut stderr_open = stderr_rx.is_some();

    loop {
        tokio::select! {
            line = next_line(&mut stdout_rx), if stdout_open => match line {
                Some(line) => output.push_stdout_line(&terminal.write_line(&line)),
                None => stdout_open = false,
            },
            line = next_line(&mut stderr_rx), if stderr_open => match line {
                Some(line) => output.push_stderr_line(&terminal.write_error_line(&line)),
                None => stderr_open = false,
            },
            else => break,
        }
    }

    output
}
