// ShellHandler: runs `<shell> -c <command>` in the workspace.
//
// The command text is checked for literal secure values before anything is
// spawned; the child still receives the true values through its environment.

use actioneer_common::constants::actions;
use actioneer_common::ActionError;
use async_trait::async_trait;

use crate::handlers::handler::{require_text, ActionHandler, ActionOutput};
use crate::handlers::step_host::StepHost;
use crate::model::Step;
use crate::run_context::RunContext;

pub struct ShellHandler;

#[async_trait]
impl ActionHandler for ShellHandler {
    fn id(&self) -> &'static str {
        actions::SHELL
    }

    fn describe(&self, step: &Step, _context: &RunContext) -> String {
        step.command.clone()
    }

    async fn execute(
        &self,
        step: &Step,
        context: &RunContext,
        output: &mut ActionOutput,
    ) -> Result<(), ActionError> {
        require_text("shell", "command", &step.command)?;

        if let Some(name) = context.store().contains_secure_reference(&step.command) {
            return Err(ActionError::SecretInCommand { name });
        }

        context.staging().ensure_workspace()?;

        let host = StepHost::new(context, "shell");
        let info = host
            .start_info(context.settings().shell.as_str())
            .arg("-c")
            .arg(step.command.as_str())
            .working_directory(context.staging().workspace());

        host.execute(&info, output).await?;
        Ok(())
    }
}
