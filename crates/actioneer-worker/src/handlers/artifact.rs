// Artifact actions: relay files between the workspace and the upload directory.

use actioneer_common::constants::actions;
use actioneer_common::ActionError;
use async_trait::async_trait;

use crate::handlers::handler::{require_any, ActionHandler, ActionOutput};
use crate::model::Step;
use crate::run_context::RunContext;

pub struct UploadArtifactHandler;

#[async_trait]
impl ActionHandler for UploadArtifactHandler {
    fn id(&self) -> &'static str {
        actions::UPLOAD_ARTIFACT
    }

    fn describe(&self, step: &Step, _context: &RunContext) -> String {
        format!("upload {}", step.files.join(", "))
    }

    async fn execute(
        &self,
        step: &Step,
        context: &RunContext,
        output: &mut ActionOutput,
    ) -> Result<(), ActionError> {
        require_any("upload-artifact", "files", &step.files)?;
        for file in &step.files {
            context.staging().check_artifact(file)?;
        }
        for file in &step.files {
            let dst = context.staging().upload(file)?;
            let line = format!("Uploaded '{}' to '{}'", file, dst.display());
            output.push_stdout_line(&context.terminal().write_line(&line));
        }
        Ok(())
    }
}

pub struct DownloadArtifactHandler;

#[async_trait]
impl ActionHandler for DownloadArtifactHandler {
    fn id(&self) -> &'static str {
        actions::DOWNLOAD_ARTIFACT
    }

    fn describe(&self, step: &Step, _context: &RunContext) -> String {
        format!("download {}", step.files.join(", "))
    }

    async fn execute(
        &self,
        step: &Step,
        context: &RunContext,
        output: &mut ActionOutput,
    ) -> Result<(), ActionError> {
        require_any("download-artifact", "files", &step.files)?;
        for file in &step.files {
            context.staging().check_artifact(file)?;
        }
        for file in &step.files {
            let dst = context.staging().download(file)?;
            let line = format!("Downloaded '{}' to '{}'", file, dst.display());
            output.push_stdout_line(&context.terminal().write_line(&line));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::context;
    use std::fs;

    #[tokio::test]
    async fn upload_then_download_round_trips_bytes() {
        let (_dir, ctx) = context();
        let staging = ctx.staging();
        fs::create_dir_all(staging.workspace()).unwrap();
        let a: Vec<u8> = (0u8..=255).collect();
        let b = b"second file\n".to_vec();
        fs::write(staging.workspace().join("a.txt"), &a).unwrap();
        fs::write(staging.workspace().join("b.txt"), &b).unwrap();

        let mut output = ActionOutput::default();
        UploadArtifactHandler
            .execute(
                &Step::new(actions::UPLOAD_ARTIFACT).with_files(["a.txt", "b.txt"]),
                &ctx,
                &mut output,
            )
            .await
            .unwrap();

        staging.reset_workspace().unwrap();
        DownloadArtifactHandler
            .execute(
                &Step::new(actions::DOWNLOAD_ARTIFACT).with_files(["a.txt", "b.txt"]),
                &ctx,
                &mut output,
            )
            .await
            .unwrap();

        assert_eq!(fs::read(staging.workspace().join("a.txt")).unwrap(), a);
        assert_eq!(fs::read(staging.workspace().join("b.txt")).unwrap(), b);
        assert_eq!(output.stdout.lines().count(), 4);
    }

    #[tokio::test]
    async fn empty_files_touch_nothing() {
        let (_dir, ctx) = context();
        let mut output = ActionOutput::default();

        let err = UploadArtifactHandler
            .execute(&Step::new(actions::UPLOAD_ARTIFACT), &ctx, &mut output)
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = DownloadArtifactHandler
            .execute(&Step::new(actions::DOWNLOAD_ARTIFACT), &ctx, &mut output)
            .await
            .unwrap_err();
        assert!(err.is_validation());

        assert!(!ctx.staging().upload_dir().exists());
        assert!(!ctx.staging().workspace().exists());
    }

    #[tokio::test]
    async fn escaping_entries_are_rejected_before_any_copy() {
        let (dir, ctx) = context();
        fs::create_dir_all(ctx.staging().workspace()).unwrap();
        fs::write(ctx.staging().workspace().join("a.txt"), "a").unwrap();
        let outside = dir.path().join("outside.txt");
        fs::write(&outside, "host").unwrap();
        let mut output = ActionOutput::default();

        let step = Step::new(actions::UPLOAD_ARTIFACT)
            .with_files(["a.txt".to_string(), outside.to_string_lossy().into_owned()]);
        let err = UploadArtifactHandler
            .execute(&step, &ctx, &mut output)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::PathOutsideWorkspace { .. }));
        assert!(!ctx.staging().upload_dir().exists());

        let step = Step::new(actions::DOWNLOAD_ARTIFACT).with_files(["../a.txt"]);
        let err = DownloadArtifactHandler
            .execute(&step, &ctx, &mut output)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(output.stdout.is_empty());
    }

    #[tokio::test]
    async fn download_of_unknown_artifact_fails_with_path() {
        let (_dir, ctx) = context();
        let mut output = ActionOutput::default();
        let err = DownloadArtifactHandler
            .execute(
                &Step::new(actions::DOWNLOAD_ARTIFACT).with_files(["ghost.bin"]),
                &ctx,
                &mut output,
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ghost.bin"));
    }
}
