// Workflow model: steps, jobs and the workflow document they are read from.
//
// Two document shapes are accepted:
//
//   jobs:                         pipeline:
//     build:                        name: build
//       steps: [...]                steps: [...]
//
// Jobs keep their document order.

use actioneer_common::constants::defaults;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One declarative unit of work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Display name; falls back to the action identifier.
    #[serde(default)]
    pub name: String,

    /// Action identifier, e.g. `actions/shell@v1`.
    #[serde(alias = "action")]
    pub uses: String,

    #[serde(default, alias = "repo", skip_serializing_if = "String::is_empty")]
    pub url: String,

    /// Ref to check out instead of the remote's default branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Workspace-relative paths, artifact names, or variable names to unset.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,
}

impl Step {
    pub fn new(uses: impl Into<String>) -> Self {
        Self {
            uses: uses.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_env<I, K, V>(mut self, env: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = env.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// Label used in logs and the execution log summary.
    pub fn label(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.uses
        } else {
            &self.name
        }
    }
}

/// A named, ordered sequence of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Job {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }
}

/// Errors raised while reading a workflow document.
#[derive(Debug, Error)]
pub enum WorkflowLoadError {
    #[error("failed to read workflow '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid workflow document")]
    Parse(#[from] serde_yaml::Error),

    #[error("workflow document has neither 'jobs' nor 'pipeline'")]
    Empty,

    #[error("workflow document may not contain both 'jobs' and 'pipeline'")]
    Ambiguous,
}

/// The full set of jobs for one run, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workflow {
    pub name: Option<String>,
    pub jobs: IndexMap<String, Job>,
}

#[derive(Debug, Deserialize)]
struct WorkflowDocument {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    jobs: Option<IndexMap<String, Job>>,
    #[serde(default)]
    pipeline: Option<PipelineDocument>,
}

#[derive(Debug, Deserialize)]
struct PipelineDocument {
    name: String,
    #[serde(default)]
    steps: Vec<Step>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job. A job with the same name is replaced in place.
    pub fn with_job(mut self, name: impl Into<String>, job: Job) -> Self {
        self.jobs.insert(name.into(), job);
        self
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, WorkflowLoadError> {
        let doc: WorkflowDocument = serde_yaml::from_str(text)?;
        match (doc.jobs, doc.pipeline) {
            (Some(jobs), None) => Ok(Self {
                name: doc.name,
                jobs,
            }),
            (None, Some(pipeline)) => {
                let mut jobs = IndexMap::new();
                jobs.insert(pipeline.name.clone(), Job::new(pipeline.steps));
                Ok(Self {
                    name: Some(doc.name.unwrap_or(pipeline.name)),
                    jobs,
                })
            }
            (Some(_), Some(_)) => Err(WorkflowLoadError::Ambiguous),
            (None, None) => Err(WorkflowLoadError::Empty),
        }
    }

    pub fn load(path: &Path) -> Result<Self, WorkflowLoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| WorkflowLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Resolve a CLI workflow argument: the path itself when it exists,
    /// otherwise a file of that name under `workflows_dir`, trying the
    /// `.yml` and `.yaml` extensions as well.
    pub fn resolve_path(arg: &Path, workflows_dir: &Path) -> PathBuf {
        if arg.is_file() {
            return arg.to_path_buf();
        }
        let candidate = workflows_dir.join(arg);
        if candidate.is_file() || candidate.extension().is_some() {
            return candidate;
        }
        for ext in ["yml", "yaml"] {
            let with_ext = candidate.with_extension(ext);
            if with_ext.is_file() {
                return with_ext;
            }
        }
        candidate
    }

    /// [`Workflow::resolve_path`] against the default workflows directory.
    pub fn resolve_default_path(arg: &Path) -> PathBuf {
        Self::resolve_path(arg, Path::new(defaults::WORKFLOWS_DIR))
    }

    pub fn step_count(&self) -> usize {
        self.jobs.values().map(|j| j.steps.len()).sum()
    }
}
