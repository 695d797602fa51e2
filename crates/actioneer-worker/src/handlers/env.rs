// Environment actions: set, set-secure, unset and print.

use actioneer_common::constants::actions;
use actioneer_common::ActionError;
use async_trait::async_trait;

use crate::handlers::handler::{require_any, ActionHandler, ActionOutput};
use crate::model::Step;
use crate::run_context::RunContext;

fn names(step: &Step) -> String {
    step.env.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn require_env(action: &'static str, step: &Step) -> Result<(), ActionError> {
    if step.env.is_empty() {
        return Err(ActionError::MissingField { action, field: "env" });
    }
    Ok(())
}

pub struct SetEnvHandler;

#[async_trait]
impl ActionHandler for SetEnvHandler {
    fn id(&self) -> &'static str {
        actions::SET_ENV
    }

    fn describe(&self, step: &Step, _context: &RunContext) -> String {
        format!("set env {}", names(step))
    }

    async fn execute(
        &self,
        step: &Step,
        context: &RunContext,
        _output: &mut ActionOutput,
    ) -> Result<(), ActionError> {
        require_env("env", step)?;
        context
            .store()
            .set_many(step.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        Ok(())
    }
}

pub struct SetSecureEnvHandler;

#[async_trait]
impl ActionHandler for SetSecureEnvHandler {
    fn id(&self) -> &'static str {
        actions::SET_SECURE_ENV
    }

    fn describe(&self, step: &Step, _context: &RunContext) -> String {
        format!("set secure env {}", names(step))
    }

    async fn execute(
        &self,
        step: &Step,
        context: &RunContext,
        _output: &mut ActionOutput,
    ) -> Result<(), ActionError> {
        require_env("env-secure", step)?;
        context
            .store()
            .set_secure_many(step.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        Ok(())
    }
}

/// Removes the variables listed in the step's `files` field.
pub struct UnsetEnvHandler;

#[async_trait]
impl ActionHandler for UnsetEnvHandler {
    fn id(&self) -> &'static str {
        actions::UNSET_ENV
    }

    fn describe(&self, step: &Step, _context: &RunContext) -> String {
        format!("unset env {}", step.files.join(", "))
    }

    async fn execute(
        &self,
        step: &Step,
        context: &RunContext,
        _output: &mut ActionOutput,
    ) -> Result<(), ActionError> {
        require_any("env-unset", "files", &step.files)?;
        context.store().unset(step.files.iter().map(String::as_str));
        Ok(())
    }
}

/// Prints the masked environment as pretty JSON. Never fails on input.
pub struct PrintEnvHandler;

#[async_trait]
impl ActionHandler for PrintEnvHandler {
    fn id(&self) -> &'static str {
        actions::PRINT_ENV
    }

    fn describe(&self, _step: &Step, _context: &RunContext) -> String {
        "print env".to_string()
    }

    async fn execute(
        &self,
        _step: &Step,
        context: &RunContext,
        output: &mut ActionOutput,
    ) -> Result<(), ActionError> {
        let json = serde_json::to_string_pretty(&context.store().snapshot())?;
        for line in json.lines() {
            output.push_stdout_line(&context.terminal().write_line(line));
        }
        Ok(())
    }
}
