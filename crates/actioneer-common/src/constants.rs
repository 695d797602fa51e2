// Well-known names shared across the engine: action identifiers, staging
// directory layout, settings defaults and environment variable names.

use std::fmt;

/// Replacement text for secure values in any displayed output.
pub const MASK: &str = "***";

// ---------------------------------------------------------------------------
// Staging layout
// ---------------------------------------------------------------------------

/// Directories of the artifact staging area, relative to the work root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownDirectory {
    /// Checked-out repository content; working directory of shell steps.
    Workspace,
    /// Artifacts staged for reuse by later steps, keyed by base name.
    Upload,
}

impl WellKnownDirectory {
    pub fn dir_name(&self) -> &'static str {
        match self {
            WellKnownDirectory::Workspace => "checkout",
            WellKnownDirectory::Upload => "upload",
        }
    }
}

impl fmt::Display for WellKnownDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

// ---------------------------------------------------------------------------
// Built-in action identifiers
// ---------------------------------------------------------------------------

pub mod actions {
    pub const CHECKOUT: &str = "actions/checkout@v1";
    pub const CAT: &str = "actions/cat@v1";
    pub const SHELL: &str = "actions/shell@v1";
    pub const SET_ENV: &str = "actions/env@v1";
    pub const SET_SECURE_ENV: &str = "actions/env-secure@v1";
    pub const UNSET_ENV: &str = "actions/env-unset@v1";
    pub const PRINT_ENV: &str = "actions/print-env@v1";
    pub const UPLOAD_ARTIFACT: &str = "actions/upload-artifact@v1";
    pub const DOWNLOAD_ARTIFACT: &str = "actions/download-artifact@v1";

    /// Every identifier the registry resolves.
    pub const ALL: &[&str] = &[
        CHECKOUT,
        CAT,
        SHELL,
        SET_ENV,
        SET_SECURE_ENV,
        UNSET_ENV,
        PRINT_ENV,
        UPLOAD_ARTIFACT,
        DOWNLOAD_ARTIFACT,
    ];
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

pub mod defaults {
    pub const WORK_ROOT: &str = ".actioneer-tmp";
    pub const LOG_FILE: &str = "logs.md";
    pub const SHELL: &str = "sh";
    /// Six hours, the same ceiling hosted CI runners apply to a job.
    pub const STEP_TIMEOUT_MINUTES: u64 = 360;
    /// Looked up relative to the current directory when no `--settings` is given.
    pub const SETTINGS_FILE: &str = ".actioneer/settings.json";
    /// Bare workflow names resolve under this directory.
    pub const WORKFLOWS_DIR: &str = ".actioneer/workflows";
}

pub mod variables {
    pub const WORK_ROOT: &str = "ACTIONEER_WORK_ROOT";
    pub const LOG_FILE: &str = "ACTIONEER_LOG_FILE";
    pub const SHELL: &str = "ACTIONEER_SHELL";
    pub const STEP_TIMEOUT_MINUTES: &str = "ACTIONEER_STEP_TIMEOUT_MINUTES";
    pub const CLEAN_STAGING: &str = "ACTIONEER_CLEAN_STAGING";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_dir_names() {
        assert_eq!(WellKnownDirectory::Workspace.to_string(), "checkout");
        assert_eq!(WellKnownDirectory::Upload.to_string(), "upload");
    }

    #[test]
    fn action_ids_are_versioned_and_unique() {
        for id in actions::ALL {
            assert!(id.starts_with("actions/"), "{id}");
            assert!(id.ends_with("@v1"), "{id}");
        }
        let mut sorted: Vec<_> = actions::ALL.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), actions::ALL.len());
    }
}
