// CheckoutHandler: clones a repository into a freshly emptied workspace.

use actioneer_common::constants::actions;
use actioneer_common::ActionError;
use actioneer_sdk::WhichUtil;
use async_trait::async_trait;

use crate::handlers::handler::{require_text, ActionHandler, ActionOutput};
use crate::handlers::step_host::StepHost;
use crate::model::Step;
use crate::run_context::RunContext;

pub struct CheckoutHandler;

#[async_trait]
impl ActionHandler for CheckoutHandler {
    fn id(&self) -> &'static str {
        actions::CHECKOUT
    }

    fn describe(&self, step: &Step, context: &RunContext) -> String {
        let branch = requested_branch(step)
            .map(|b| format!(" --branch {b}"))
            .unwrap_or_default();
        format!(
            "git clone{branch} {} {}",
            step.url,
            context.staging().workspace().display()
        )
    }

    async fn execute(
        &self,
        step: &Step,
        context: &RunContext,
        output: &mut ActionOutput,
    ) -> Result<(), ActionError> {
        require_text("checkout", "url", &step.url)?;

        let git = WhichUtil::which("git", false)
            .ok()
            .flatten()
            .ok_or(ActionError::ToolNotFound { tool: "git" })?;

        let workspace = context.staging().workspace();
        context.staging().reset_workspace()?;

        let host = StepHost::new(context, "checkout");
        let mut info = host
            .start_info(git.to_string_lossy())
            .arg("clone")
            .arg("--progress");
        if let Some(branch) = requested_branch(step) {
            info = info.arg("--branch").arg(branch);
        }
        let info = info
            .arg(step.url.as_str())
            .arg(workspace.to_string_lossy());

        host.execute(&info, output).await?;
        Ok(())
    }
}

/// The branch to clone, if one was given and is not blank.
fn requested_branch(step: &Step) -> Option<&str> {
    step.branch.as_deref().filter(|b| !b.trim().is_empty())
}
