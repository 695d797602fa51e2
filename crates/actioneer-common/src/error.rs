// Error taxonomy of the engine: validation, I/O, subprocess, security and
// logging failures, plus the step- and workflow-level wrappers that carry
// job/step/action context up to the driver.

use crate::env_store::EnvironmentStore;
use actioneer_sdk::ProcessError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure of one action invocation.
#[derive(Debug, Error)]
pub enum ActionError {
    /// A field the action needs is absent or empty. Raised before any side effect.
    #[error("{action} requires a non-empty '{field}' field")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },

    #[error("{operation} '{}'", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Process(#[from] ProcessError),

    /// An artifact path with no file name component (`..`, `/`, empty).
    #[error("'{name}' does not name a file")]
    InvalidArtifactName { name: String },

    /// An absolute path, or one that climbs out through `..`.
    #[error("'{path}' is not a path inside the workspace")]
    PathOutsideWorkspace { path: String },

    #[error("{tool} is required but was not found on PATH")]
    ToolNotFound { tool: &'static str },

    /// The command text embeds a secure value. Only the variable name is reported.
    #[error("shell command contains the value of secure variable '{name}', which is not allowed")]
    SecretInCommand { name: String },

    #[error("failed to format environment: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ActionError {
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ActionError::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// True for failures detected before the action touched anything.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ActionError::MissingField { .. }
                | ActionError::InvalidArtifactName { .. }
                | ActionError::PathOutsideWorkspace { .. }
        )
    }

    /// Replace secure values in the paths and command text the error carries.
    pub fn masked(self, store: &EnvironmentStore) -> Self {
        match self {
            ActionError::Io {
                operation,
                path,
                source,
            } => ActionError::Io {
                operation,
                path: mask_path(store, path),
                source,
            },
            ActionError::Process(err) => ActionError::Process(err.map_text(|t| store.mask_line(t))),
            ActionError::InvalidArtifactName { name } => ActionError::InvalidArtifactName {
                name: store.mask_line(&name),
            },
            ActionError::PathOutsideWorkspace { path } => ActionError::PathOutsideWorkspace {
                path: store.mask_line(&path),
            },
            other => other,
        }
    }

    pub fn is_security(&self) -> bool {
        matches!(self, ActionError::SecretInCommand { .. })
    }
}

/// Failure to persist an execution log entry.
#[derive(Debug, Error)]
#[error("failed to write execution log '{}'", path.display())]
pub struct LogError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Failure of one step, as seen by the workflow runner.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("unknown action '{action}'")]
    UnknownAction { action: String },

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Logging(#[from] LogError),

    /// Cancellation was requested before the step started.
    #[error("run was cancelled before the step started")]
    Cancelled,
}

impl StepError {
    /// Replace secure values in the text the error carries.
    pub fn masked(self, store: &EnvironmentStore) -> Self {
        match self {
            StepError::UnknownAction { action } => StepError::UnknownAction {
                action: store.mask_line(&action),
            },
            StepError::Action(err) => StepError::Action(err.masked(store)),
            other => other,
        }
    }
}

fn mask_path(store: &EnvironmentStore, path: PathBuf) -> PathBuf {
    let text = path.to_string_lossy();
    let masked = store.mask_line(&text);
    if masked == text {
        path
    } else {
        Path::new(&masked).to_path_buf()
    }
}

/// Result of a workflow run reported to the driver.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("job '{job}' failed at step '{step}' ({action})")]
    JobFailed {
        job: String,
        step: String,
        action: String,
        #[source]
        source: StepError,
    },

    #[error("failed to prepare staging directory '{}'", path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The execution log could not be reset at run start.
    #[error(transparent)]
    Logging(#[from] LogError),
}

impl WorkflowError {
    /// The step-level cause, when a job failed.
    pub fn step_error(&self) -> Option<&StepError> {
        match self {
            WorkflowError::JobFailed { source, .. } => Some(source),
            WorkflowError::Staging { .. } | WorkflowError::Logging(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn missing_field_message() {
        let err = ActionError::MissingField {
            action: "checkout",
            field: "url",
        };
        assert_eq!(err.to_string(), "checkout requires a non-empty 'url' field");
        assert!(err.is_validation());
    }

    #[test]
    fn io_error_names_path() {
        let err = ActionError::io(
            "failed to read artifact",
            "ws/a.txt",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.to_string().contains("ws/a.txt"));
        assert!(err.source().is_some());
    }

    #[test]
    fn io_cause_is_rendered_once() {
        let err = ActionError::io(
            "failed to read file",
            "ws/a.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.to_string(), "failed to read file 'ws/a.txt'");
        assert_eq!(err.source().unwrap().to_string(), "gone");

        let log = LogError {
            path: "logs.md".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(!log.to_string().contains("disk full"));
    }

    #[test]
    fn masking_hides_values_in_paths_and_arguments() {
        let store = EnvironmentStore::new();
        store.set_secure_many([("TOKEN", "abc123xyz")]);

        let err = ActionError::Process(ProcessError::ExitCode {
            exit_code: 128,
            file_name: "git".into(),
            arguments: "clone https://abc123xyz@example.com/r.git ws".into(),
        })
        .masked(&store);
        assert!(err.to_string().contains("https://***@example.com/r.git"));

        let err = StepError::Action(ActionError::io(
            "failed to read file",
            "ws/abc123xyz.txt",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        ))
        .masked(&store);
        assert_eq!(err.to_string(), "failed to read file 'ws/***.txt'");

        let err = ActionError::PathOutsideWorkspace {
            path: "/tmp/x".into(),
        }
        .masked(&store);
        assert!(err.is_validation());
    }

    #[test]
    fn secret_error_reports_name_only() {
        let err = ActionError::SecretInCommand {
            name: "TOKEN".into(),
        };
        assert!(err.to_string().contains("TOKEN"));
        assert!(err.is_security());
    }

    #[test]
    fn job_failure_preserves_cause_chain() {
        let err = WorkflowError::JobFailed {
            job: "build".into(),
            step: "compile".into(),
            action: "actions/shell@v1".into(),
            source: StepError::Action(ActionError::MissingField {
                action: "shell",
                field: "command",
            }),
        };
        assert_eq!(
            err.to_string(),
            "job 'build' failed at step 'compile' (actions/shell@v1)"
        );
        let cause = err.source().unwrap().to_string();
        assert!(cause.contains("'command'"));
        assert!(matches!(
            err.step_error(),
            Some(StepError::Action(ActionError::MissingField { .. }))
        ));
    }
}
