// Timing wrapper: times one action invocation and records exactly one
// execution log entry for it, whether the action succeeded or not.

use actioneer_common::{ActionError, ActionResult, ExecutionLog, ExecutionLogEntry, StepError};
use actioneer_sdk::StringUtil;
use chrono::Utc;
use std::future::Future;

use crate::handlers::ActionOutput;

/// What a log entry is filed under.
#[derive(Debug, Clone, Copy)]
pub struct EntryLabel<'a> {
    pub job: &'a str,
    pub step: &'a str,
    pub description: &'a str,
}

/// Invoke `action`, then append its entry to `log`.
///
/// The action's own error is returned unchanged. A failure to persist the
/// entry is reported as [`StepError::Logging`] only when the action itself
/// succeeded; otherwise it is traced and the action error wins.
pub async fn with_timing<F, Fut>(
    log: &ExecutionLog,
    label: EntryLabel<'_>,
    action: F,
) -> Result<ActionOutput, StepError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = (ActionOutput, Result<(), ActionError>)>,
{
    let start_time = Utc::now();
    let (output, result) = action().await;
    let end_time = Utc::now();

    let entry = ExecutionLogEntry {
        job: label.job.to_string(),
        step: label.step.to_string(),
        description: label.description.to_string(),
        start_time,
        end_time,
        stdout: output.stdout.clone(),
        stderr: output.stderr.clone(),
        result: ActionResult::from_ok(result.is_ok()),
    };
    let duration = StringUtil::format_duration(entry.duration());
    let logged = log.append(entry);

    match result {
        Ok(()) => {
            tracing::info!(
                job = label.job,
                step = label.step,
                duration = %duration,
                "Completed step"
            );
            logged?;
            Ok(output)
        }
        Err(err) => {
            tracing::error!(
                job = label.job,
                step = label.step,
                duration = %duration,
                error = %err,
                "Action error"
            );
            if let Err(log_err) = logged {
                tracing::error!(error = %log_err, "Execution log entry could not be written");
            }
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label() -> EntryLabel<'static> {
        EntryLabel {
            job: "build",
            step: "Greet",
            description: "echo hi",
        }
    }

    #[tokio::test]
    async fn success_is_logged_with_output() {
        let log = ExecutionLog::in_memory();
        let output = with_timing(&log, label(), || async {
            let mut out = ActionOutput::default();
            out.push_stdout_line("hi");
            (out, Ok(()))
        })
        .await
        .unwrap();

        assert_eq!(output.stdout, "hi\n");
        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].stdout, "hi\n");
        assert_eq!(entries[0].result, ActionResult::Success);
        assert!(entries[0].end_time >= entries[0].start_time);
    }

    #[tokio::test]
    async fn failure_is_logged_and_returned_unchanged() {
        let log = ExecutionLog::in_memory();
        let err = with_timing(&log, label(), || async {
            let mut out = ActionOutput::default();
            out.push_stderr_line("nope");
            (
                out,
                Err(ActionError::MissingField {
                    action: "shell",
                    field: "command",
                }),
            )
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            StepError::Action(ActionError::MissingField { field: "command", .. })
        ));
        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].stderr, "nope\n");
        assert_eq!(entries[0].result, ActionResult::Failure);
    }

    #[tokio::test]
    async fn log_failure_is_distinct_and_does_not_hide_action_error() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the log file should be
        let blocked = dir.path().join("logs.md");
        std::fs::create_dir_all(&blocked).unwrap();
        let log = ExecutionLog::new(&blocked);

        let err = with_timing(&log, label(), || async { (ActionOutput::default(), Ok(())) })
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::Logging(_)));

        let err = with_timing(&log, label(), || async {
            (
                ActionOutput::default(),
                Err(ActionError::ToolNotFound { tool: "git" }),
            )
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            StepError::Action(ActionError::ToolNotFound { .. })
        ));
    }
}
