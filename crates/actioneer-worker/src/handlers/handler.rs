// ActionHandler trait: the contract every built-in action implements, plus
// the output buffer an invocation fills while it runs.

use actioneer_common::ActionError;
use async_trait::async_trait;

use crate::model::Step;
use crate::run_context::RunContext;

/// Output captured from one action invocation, already masked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ActionOutput {
    pub fn push_stdout_line(&mut self, line: &str) {
        self.stdout.push_str(line);
        self.stdout.push('\n');
    }

    pub fn push_stderr_line(&mut self, line: &str) {
        self.stderr.push_str(line);
        self.stderr.push('\n');
    }
}

/// A stateless, named unit of executable behavior.
///
/// `execute` fills `output` as it goes, so whatever was captured before a
/// failure still reaches the execution log. Required fields are validated
/// before any side effect.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Versioned identifier, e.g. `actions/shell@v1`.
    fn id(&self) -> &'static str;

    /// Human-readable description of what `step` will do, for the log entry.
    fn describe(&self, step: &Step, context: &RunContext) -> String;

    async fn execute(
        &self,
        step: &Step,
        context: &RunContext,
        output: &mut ActionOutput,
    ) -> Result<(), ActionError>;
}

/// Fail with `MissingField` unless `value` has non-whitespace content.
pub(crate) fn require_text(
    action: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ActionError> {
    if value.trim().is_empty() {
        return Err(ActionError::MissingField { action, field });
    }
    Ok(())
}

/// Fail with `MissingField` unless `values` has at least one entry.
pub(crate) fn require_any<T>(
    action: &'static str,
    field: &'static str,
    values: &[T],
) -> Result<(), ActionError> {
    if values.is_empty() {
        return Err(ActionError::MissingField { action, field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_lines_are_newline_terminated() {
        let mut out = ActionOutput::default();
        out.push_stdout_line("hi");
        out.push_stderr_line("warn");
        assert_eq!(out.stdout, "hi\n");
        assert_eq!(out.stderr, "warn\n");
    }

    #[test]
    fn required_field_checks() {
        assert!(require_text("shell", "command", "  ").is_err());
        assert!(require_text("shell", "command", "ls").is_ok());
        assert!(require_any::<String>("cat", "files", &[]).is_err());
        let err = require_any::<String>("cat", "files", &[]).unwrap_err();
        assert_eq!(err.to_string(), "cat requires a non-empty 'files' field");
    }
}
