// ExecutionLog: the append-only record of every invoked action.
// Entries are kept in memory in invocation order and, when a path is
// configured, appended to a Markdown file as collapsible <details> blocks.

use crate::action_result::ActionResult;
use crate::error::LogError;
use actioneer_sdk::{IOUtil, StringUtil};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One invoked action: what ran, when, what it printed and how it ended.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionLogEntry {
    pub job: String,
    pub step: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub stdout: String,
    pub stderr: String,
    pub result: ActionResult,
}

impl ExecutionLogEntry {
    pub fn duration(&self) -> Duration {
        (self.end_time - self.start_time)
            .to_std()
            .unwrap_or_default()
    }

    /// Render as the Markdown block appended to the log file.
    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "<details><summary>{} > {} > {}</summary>\n\n",
            self.job, self.step, self.description
        );
        out.push_str(&format!(
            "- Start Time: `{}`\n",
            self.start_time.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        out.push_str(&format!(
            "- End Time: `{}`\n",
            self.end_time.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        out.push_str(&format!(
            "- Duration: `{}`\n",
            StringUtil::format_duration(self.duration())
        ));
        out.push_str(&format!("- Result: `{}`\n", self.result));
        if !self.stdout.is_empty() {
            out.push_str(&format!("<pre>{}</pre>\n", self.stdout));
        }
        if !self.stderr.is_empty() {
            out.push_str(&format!("<pre>{}</pre>\n", self.stderr));
        }
        out.push_str("</details>\n\n");
        out
    }
}

/// Append-only execution log for one run.
#[derive(Debug)]
pub struct ExecutionLog {
    path: Option<PathBuf>,
    entries: Mutex<Vec<ExecutionLogEntry>>,
}

impl ExecutionLog {
    /// A log persisted to `path` (created on first append).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// A log that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Start over: drop retained entries and delete the log file left by a
    /// previous run. A missing file is fine.
    pub fn reset(&self) -> Result<(), LogError> {
        self.entries.lock().clear();
        let Some(path) = &self.path else {
            return Ok(());
        };
        match IOUtil::delete_file(path) {
            Ok(()) => {
                tracing::debug!(event = "log_file_cleanup", path = %path.display());
                Ok(())
            }
            Err(source) => Err(LogError {
                path: path.clone(),
                source,
            }),
        }
    }

    /// Record an entry. It is retained in memory even when persisting fails,
    /// so the in-memory view always has one entry per invoked action.
    pub fn append(&self, entry: ExecutionLogEntry) -> Result<(), LogError> {
        let rendered = self.path.as_ref().map(|_| entry.to_markdown());
        let (job, step, description) = (
            entry.job.clone(),
            entry.step.clone(),
            entry.description.clone(),
        );
        self.entries.lock().push(entry);

        if let (Some(path), Some(rendered)) = (&self.path, rendered) {
            write_block(path, &rendered).map_err(|source| LogError {
                path: path.clone(),
                source,
            })?;
        }

        tracing::info!(
            event = "log_entry_written",
            job = %job,
            step = %step,
            command = %description,
            "Execution details logged"
        );
        Ok(())
    }

    /// Every entry so far, oldest first.
    pub fn entries(&self) -> Vec<ExecutionLogEntry> {
        self.entries.lock().clone()
    }

    /// Entries belonging to `job`, oldest first.
    pub fn entries_for_job(&self, job: &str) -> Vec<ExecutionLogEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.job == job)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

fn write_block(path: &Path, block: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            IOUtil::ensure_directory(parent)?;
        }
    }
    let mut file = OpenOptions::new().append(true).create(true).open(path)?;
    file.write_all(block.as_bytes())?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn entry(job: &str, step: &str, stdout: &str) -> ExecutionLogEntry {
        let start = Utc::now();
        ExecutionLogEntry {
            job: job.into(),
            step: step.into(),
            description: "echo hi".into(),
            start_time: start,
            end_time: start + ChronoDuration::milliseconds(250),
            stdout: stdout.into(),
            stderr: String::new(),
            result: ActionResult::Success,
        }
    }

    #[test]
    fn markdown_block_layout() {
        let md = entry("build", "Shell", "hi\n").to_markdown();
        assert!(md.starts_with("<details><summary>build > Shell > echo hi</summary>"));
        assert!(md.contains("- Duration: `250.00 ms`"));
        assert!(md.contains("<pre>hi\n</pre>"));
        assert!(md.ends_with("</details>\n\n"));
        // stderr block omitted when empty
        assert_eq!(md.matches("<pre>").count(), 1);
    }

    #[test]
    fn append_persists_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.md");
        let log = ExecutionLog::new(&path);

        log.append(entry("a", "one", "")).unwrap();
        log.append(entry("a", "two", "")).unwrap();
        log.append(entry("b", "three", "")).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let one = text.find("a > one").unwrap();
        let two = text.find("a > two").unwrap();
        assert!(one < two);
        assert_eq!(log.len(), 3);
        assert_eq!(log.entries_for_job("a").len(), 2);
    }

    #[test]
    fn reset_removes_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.md");
        std::fs::write(&path, "stale").unwrap();

        let log = ExecutionLog::new(&path);
        log.append(entry("a", "one", "")).unwrap();
        log.reset().unwrap();
        assert!(!path.exists());
        assert!(log.is_empty());
        // second reset on a missing file is fine
        log.reset().unwrap();
    }

    #[test]
    fn write_failure_is_a_log_error_but_entry_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the file should be
        let path = dir.path().join("blocked");
        std::fs::create_dir_all(&path).unwrap();

        let log = ExecutionLog::new(&path);
        let err = log.append(entry("a", "one", "")).unwrap_err();

        assert_eq!(err.path, path);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn in_memory_log_never_touches_disk() {
        let log = ExecutionLog::in_memory();
        log.append(entry("a", "one", "x")).unwrap();
        assert!(log.path().is_none());
        assert_eq!(log.entries()[0].stdout, "x");
    }
}
