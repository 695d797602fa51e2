// Engine settings: defaults, an optional JSON settings file and
// ACTIONEER_* environment overrides, applied in that order.

use crate::constants::{defaults, variables, WellKnownDirectory};
use actioneer_sdk::{IOUtil, StringUtil};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Persisted engine configuration. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct EngineSettings {
    /// Root of the artifact staging area.
    pub work_root: PathBuf,

    /// Execution log path.
    pub log_file: PathBuf,

    /// Program the shell action runs as `<shell> -c <command>`.
    pub shell: String,

    /// Bound on every subprocess. `0` means unbounded.
    pub step_timeout_minutes: u64,

    pub clean_staging_on_start: bool,

    pub truncate_log_on_start: bool,

    /// Echo action output to the host console.
    pub print_to_stdout: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            work_root: PathBuf::from(defaults::WORK_ROOT),
            log_file: PathBuf::from(defaults::LOG_FILE),
            shell: defaults::SHELL.to_string(),
            step_timeout_minutes: defaults::STEP_TIMEOUT_MINUTES,
            clean_staging_on_start: true,
            truncate_log_on_start: true,
            print_to_stdout: true,
        }
    }
}

impl EngineSettings {
    pub fn step_timeout(&self) -> Option<Duration> {
        match self.step_timeout_minutes {
            0 => None,
            minutes => Some(Duration::from_secs(minutes.saturating_mul(60))),
        }
    }

    pub fn directory(&self, dir: WellKnownDirectory) -> PathBuf {
        self.work_root.join(dir.dir_name())
    }

    pub fn workspace_dir(&self) -> PathBuf {
        self.directory(WellKnownDirectory::Workspace)
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.directory(WellKnownDirectory::Upload)
    }

    /// Apply ACTIONEER_* overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = present(variables::WORK_ROOT) {
            self.work_root = PathBuf::from(v);
        }
        if let Some(v) = present(variables::LOG_FILE) {
            self.log_file = PathBuf::from(v);
        }
        if let Some(v) = present(variables::SHELL) {
            self.shell = v;
        }
        if let Some(v) = present(variables::STEP_TIMEOUT_MINUTES) {
            self.step_timeout_minutes = v.trim().parse().with_context(|| {
                format!("{} must be a whole number of minutes, got '{v}'", variables::STEP_TIMEOUT_MINUTES)
            })?;
        }
        if let Some(v) = present(variables::CLEAN_STAGING) {
            match StringUtil::convert_to_bool(&v) {
                Some(b) => self.clean_staging_on_start = b,
                None => bail!("{} must be a boolean, got '{v}'", variables::CLEAN_STAGING),
            }
        }
        Ok(())
    }
}

/// Resolves the effective [`EngineSettings`] for a run.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    settings_file: Option<PathBuf>,
}

impl SettingsStore {
    /// Use `path` when given, otherwise the default settings file if it exists.
    pub fn new(settings_file: Option<PathBuf>) -> Self {
        Self { settings_file }
    }

    pub fn settings_file(&self) -> Option<&Path> {
        self.settings_file.as_deref()
    }

    /// Load from file (if any) and apply process environment overrides.
    pub fn load(&self) -> Result<EngineSettings> {
        self.load_with(|name| std::env::var(name).ok())
    }

    pub fn load_with<F>(&self, lookup: F) -> Result<EngineSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match &self.settings_file {
            // An explicit path must exist.
            Some(path) => Self::read_file(path)?,
            None => {
                let default_path = Path::new(defaults::SETTINGS_FILE);
                if default_path.is_file() {
                    Self::read_file(default_path)?
                } else {
                    EngineSettings::default()
                }
            }
        };
        settings.apply_overrides(lookup)?;

        tracing::debug!(
            work_root = %settings.work_root.display(),
            log_file = %settings.log_file.display(),
            shell = %settings.shell,
            step_timeout_minutes = settings.step_timeout_minutes,
            "Engine settings resolved"
        );
        Ok(settings)
    }

    fn read_file(path: &Path) -> Result<EngineSettings> {
        IOUtil::load_object(path).context("Failed to load engine settings")
    }

    /// Write `settings` as pretty JSON.
    pub fn save(path: &Path, settings: &EngineSettings) -> Result<()> {
        IOUtil::save_object(path, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let s = EngineSettings::default();
        assert_eq!(s.work_root, PathBuf::from(".actioneer-tmp"));
        assert_eq!(s.workspace_dir(), PathBuf::from(".actioneer-tmp/checkout"));
        assert_eq!(s.upload_dir(), PathBuf::from(".actioneer-tmp/upload"));
        assert_eq!(s.step_timeout(), Some(Duration::from_secs(360 * 60)));
        assert!(s.clean_staging_on_start);
    }

    #[test]
    fn zero_timeout_is_unbounded() {
        let s = EngineSettings {
            step_timeout_minutes: 0,
            ..Default::default()
        };
        assert_eq!(s.step_timeout(), None);
    }

    #[test]
    fn file_then_env_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "Shell": "bash", "LogFile": "file.md" }"#).unwrap();

        let store = SettingsStore::new(Some(path));
        let s = store
            .load_with(env(&[("ACTIONEER_LOG_FILE", "env.md")]))
            .unwrap();

        assert_eq!(s.shell, "bash");
        assert_eq!(s.log_file, PathBuf::from("env.md"));
        // untouched keys keep their defaults
        assert_eq!(s.step_timeout_minutes, 360);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(Some(dir.path().join("nope.json")));
        assert!(store.load_with(env(&[])).is_err());
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let mut s = EngineSettings::default();
        assert!(s
            .apply_overrides(env(&[("ACTIONEER_STEP_TIMEOUT_MINUTES", "soon")]))
            .is_err());
        assert!(s
            .apply_overrides(env(&[("ACTIONEER_CLEAN_STAGING", "maybe")]))
            .is_err());

        s.apply_overrides(env(&[
            ("ACTIONEER_CLEAN_STAGING", "no"),
            ("ACTIONEER_STEP_TIMEOUT_MINUTES", "5"),
            ("ACTIONEER_SHELL", "  "),
        ]))
        .unwrap();
        assert!(!s.clean_staging_on_start);
        assert_eq!(s.step_timeout_minutes, 5);
        assert_eq!(s.shell, "sh");
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let s = EngineSettings {
            print_to_stdout: false,
            ..Default::default()
        };
        SettingsStore::save(&path, &s).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"PrintToStdout\": false"));

        let loaded = SettingsStore::new(Some(path)).load_with(env(&[])).unwrap();
        assert_eq!(loaded, s);
    }
}
