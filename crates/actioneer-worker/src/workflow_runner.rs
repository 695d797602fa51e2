// WorkflowRunner: the single entry point a driver calls to execute a
// workflow. Jobs run one at a time in document order; the first failing job
// halts the run. Runs on one runner never overlap: they share its staging
// directories, execution log and state.
//
//   run_workflow → StepsRunner::run_job → StepsRunner::run_step
//     → with_timing(ActionHandler::execute)

use actioneer_common::{ConsoleColor, EngineSettings, ExecutionLog, WorkflowError};
use actioneer_sdk::StringUtil;
use parking_lot::Mutex;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::model::Workflow;
use crate::registry::ActionRegistry;
use crate::run_context::RunContext;
use crate::steps_runner::StepsRunner;

/// Lifecycle of the current (or last) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running { job: String, step: String },
    Completed,
    Failed,
}

pub struct WorkflowRunner {
    settings: EngineSettings,
    registry: ActionRegistry,
    log: ExecutionLog,
    state: Mutex<RunState>,
    cancel: CancellationToken,
    run_lock: tokio::sync::Mutex<()>,
}

impl WorkflowRunner {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            log: ExecutionLog::new(settings.log_file.clone()),
            settings,
            registry: ActionRegistry::new(),
            state: Mutex::new(RunState::Pending),
            cancel: CancellationToken::new(),
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Subprocesses of every run observe `token`.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn log(&self) -> &ExecutionLog {
        &self.log
    }

    pub fn state(&self) -> RunState {
        self.state.lock().clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute every job of `workflow`. `Ok` means all jobs completed.
    ///
    /// A call made while another run is in progress waits for it to finish.
    /// Errors carry no secure value of the run.
    pub async fn run_workflow(&self, workflow: &Workflow) -> Result<(), WorkflowError> {
        let _running = self.run_lock.lock().await;
        let context = RunContext::new(self.settings.clone(), self.cancel.clone());
        let run_id = context.run_id();
        let started = Instant::now();
        *self.state.lock() = RunState::Pending;

        tracing::info!(
            event = "workflow_execution_start",
            run_id = %run_id,
            workflow = workflow.name.as_deref().unwrap_or_default(),
            jobs = workflow.jobs.len(),
            steps = workflow.step_count(),
            "Workflow execution started"
        );

        let result = self.execute(workflow, &context).await;
        let duration = StringUtil::format_duration(started.elapsed());

        match &result {
            Ok(()) => {
                *self.state.lock() = RunState::Completed;
                tracing::info!(
                    event = "workflow_execution_completed",
                    run_id = %run_id,
                    duration = %duration,
                    entries = self.log.len(),
                    secure_variables = context.store().secure_count(),
                    "Workflow execution completed"
                );
                context.terminal().write_section(
                    &format!("Workflow completed in {duration}"),
                    ConsoleColor::Green,
                );
            }
            Err(err) => {
                *self.state.lock() = RunState::Failed;
                let message = context.store().mask_line(&error_chain(err));
                tracing::error!(
                    event = "workflow_execution_failed",
                    run_id = %run_id,
                    duration = %duration,
                    error = %message,
                    "Workflow execution failed"
                );
                context
                    .terminal()
                    .write_section(&format!("Workflow failed: {message}"), ConsoleColor::Red);
            }
        }
        result
    }

    async fn execute(&self, workflow: &Workflow, context: &RunContext) -> Result<(), WorkflowError> {
        if self.settings.truncate_log_on_start {
            self.log.reset()?;
        }
        context
            .staging()
            .prepare(self.settings.clean_staging_on_start)?;

        let steps = StepsRunner::new(&self.registry, &self.log, context, &self.state);
        for (name, job) in &workflow.jobs {
            steps.run_job(name, job).await?;
        }
        Ok(())
    }
}

/// `outer: cause: root` rendering of an error and its sources.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
