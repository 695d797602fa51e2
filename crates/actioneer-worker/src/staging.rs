// ArtifactStaging: the workspace and upload directories under the work root.
// The upload directory is a flat, one-slot-per-base-name relay between steps.

use actioneer_common::{ActionError, EngineSettings, WellKnownDirectory, WorkflowError};
use actioneer_sdk::IOUtil;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ArtifactStaging {
    workspace: PathBuf,
    upload: PathBuf,
}

impl ArtifactStaging {
    pub fn new(work_root: &Path) -> Self {
        Self {
            workspace: work_root.join(WellKnownDirectory::Workspace.dir_name()),
            upload: work_root.join(WellKnownDirectory::Upload.dir_name()),
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            workspace: settings.workspace_dir(),
            upload: settings.upload_dir(),
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload
    }

    /// Run-start preparation: optionally purge both directories, then make
    /// sure the workspace exists so shell steps have a working directory.
    pub fn prepare(&self, clean: bool) -> Result<(), WorkflowError> {
        if clean {
            for dir in [&self.workspace, &self.upload] {
                IOUtil::delete_directory(dir).map_err(|source| WorkflowError::Staging {
                    path: dir.clone(),
                    source,
                })?;
            }
            tracing::debug!(
                workspace = %self.workspace.display(),
                upload = %self.upload.display(),
                "Staging directories purged"
            );
        }
        IOUtil::ensure_directory(&self.workspace).map_err(|source| WorkflowError::Staging {
            path: self.workspace.clone(),
            source,
        })
    }

    /// Empty the workspace (or create it) ahead of a checkout.
    pub fn reset_workspace(&self) -> Result<(), ActionError> {
        IOUtil::reset_directory(&self.workspace)
            .map_err(|e| ActionError::io("failed to reset workspace", &self.workspace, e))
    }

    pub fn ensure_workspace(&self) -> Result<(), ActionError> {
        IOUtil::ensure_directory(&self.workspace)
            .map_err(|e| ActionError::io("failed to create workspace", &self.workspace, e))
    }

    /// `relative` resolved under the workspace. Absolute paths and `..`
    /// components are rejected.
    pub fn workspace_path(&self, relative: &str) -> Result<PathBuf, ActionError> {
        Ok(self.workspace.join(inside(relative)?))
    }

    /// Reject an artifact entry that has no base name or leaves the workspace.
    pub fn check_artifact(&self, relative: &str) -> Result<(), ActionError> {
        base_name(relative)?;
        inside(relative)?;
        Ok(())
    }

    /// Copy a workspace-relative file into the upload directory under its
    /// base name, overwriting an earlier artifact of the same name.
    pub fn upload(&self, relative: &str) -> Result<PathBuf, ActionError> {
        let name = base_name(relative)?;
        let src = self.workspace_path(relative)?;
        let dst = self.upload.join(name);

        IOUtil::ensure_directory(&self.upload)
            .map_err(|e| ActionError::io("failed to create upload directory", &self.upload, e))?;
        copy(&src, &dst)?;
        Ok(dst)
    }

    /// Copy the artifact with `relative`'s base name back into the workspace.
    pub fn download(&self, relative: &str) -> Result<PathBuf, ActionError> {
        let name = base_name(relative)?;
        inside(relative)?;
        let src = self.upload.join(name);
        let dst = self.workspace.join(name);

        self.ensure_workspace()?;
        copy(&src, &dst)?;
        Ok(dst)
    }
}

fn base_name(relative: &str) -> Result<&str, ActionError> {
    Path::new(relative)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ActionError::InvalidArtifactName {
            name: relative.to_string(),
        })
}

fn inside(relative: &str) -> Result<&Path, ActionError> {
    let path = Path::new(relative);
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::RootDir | Component::Prefix(_) | Component::ParentDir
        )
    });
    if escapes {
        return Err(ActionError::PathOutsideWorkspace {
            path: relative.to_string(),
        });
    }
    Ok(path)
}

fn copy(src: &Path, dst: &Path) -> Result<(), ActionError> {
    if !src.is_file() {
        return Err(ActionError::io(
            "failed to read artifact",
            src,
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        ));
    }
    IOUtil::copy_file(src, dst).map_err(|e| ActionError::io("failed to copy artifact", dst, e))?;
    tracing::debug!(src = %src.display(), dst = %dst.display(), "Artifact copied");
    Ok(())
}
