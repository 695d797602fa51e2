// StepsRunner: executes the steps of one job in declared order and stops at
// the first failure. Every step is resolved through the registry before
// anything runs, so an unknown action leaves no trace but its error.

use actioneer_common::{ConsoleColor, ExecutionLog, StepError, WorkflowError};
use parking_lot::Mutex;

use crate::handlers::ActionOutput;
use crate::model::{Job, Step};
use crate::registry::ActionRegistry;
use crate::run_context::RunContext;
use crate::timing::{with_timing, EntryLabel};
use crate::workflow_runner::RunState;

pub struct StepsRunner<'a> {
    registry: &'a ActionRegistry,
    log: &'a ExecutionLog,
    context: &'a RunContext,
    state: &'a Mutex<RunState>,
}

impl<'a> StepsRunner<'a> {
    pub fn new(
        registry: &'a ActionRegistry,
        log: &'a ExecutionLog,
        context: &'a RunContext,
        state: &'a Mutex<RunState>,
    ) -> Self {
        Self {
            registry,
            log,
            context,
            state,
        }
    }

    /// Run every step of `job`. The first failing step ends the job.
    pub async fn run_job(&self, job_name: &str, job: &Job) -> Result<(), WorkflowError> {
        tracing::info!(
            event = "job_start",
            job = job_name,
            steps = job.steps.len(),
            "Starting job"
        );

        for step in &job.steps {
            *self.state.lock() = RunState::Running {
                job: job_name.to_string(),
                step: step.label().to_string(),
            };

            let store = self.context.store();
            self.run_step(job_name, step)
                .await
                .map_err(|source| WorkflowError::JobFailed {
                    job: store.mask_line(job_name),
                    step: store.mask_line(step.label()),
                    action: store.mask_line(&step.uses),
                    source: source.masked(store),
                })?;
        }
        Ok(())
    }

    /// Resolve and invoke one step through the timing wrapper.
    pub async fn run_step(&self, job_name: &str, step: &Step) -> Result<ActionOutput, StepError> {
        if self.context.is_cancelled() {
            return Err(StepError::Cancelled);
        }

        let handler = self
            .registry
            .resolve(&step.uses)
            .ok_or_else(|| StepError::UnknownAction {
                action: step.uses.clone(),
            })?;

        tracing::info!(
            event = "step_start",
            job = job_name,
            step = step.label(),
            action = %step.uses,
            "Starting step"
        );
        self.context
            .terminal()
            .write_section(&format!("Run {}", step.label()), ConsoleColor::Cyan);

        // Descriptions may embed credentials (checkout URLs) or rejected secrets.
        let description = self
            .context
            .store()
            .mask_line(&handler.describe(step, self.context));
        let label = EntryLabel {
            job: job_name,
            step: step.label(),
            description: &description,
        };

        let handler = handler.as_ref();
        let context = self.context;
        with_timing(self.log, label, move || async move {
            let mut output = ActionOutput::default();
            let result = handler
                .execute(step, context, &mut output)
                .await
                .map_err(|err| err.masked(context.store()));
            (output, result)
        })
        .await
    }
}
