// CatHandler: prints workspace files to stdout in list order.

use actioneer_common::constants::actions;
use actioneer_common::ActionError;
use async_trait::async_trait;

use crate::handlers::handler::{require_any, ActionHandler, ActionOutput};
use crate::model::Step;
use crate::run_context::RunContext;

pub struct CatHandler;

#[async_trait]
impl ActionHandler for CatHandler {
    fn id(&self) -> &'static str {
        actions::CAT
    }

    fn describe(&self, step: &Step, _context: &RunContext) -> String {
        format!("cat {}", step.files.join(" "))
    }

    async fn execute(
        &self,
        step: &Step,
        context: &RunContext,
        output: &mut ActionOutput,
    ) -> Result<(), ActionError> {
        require_any("cat", "files", &step.files)?;

        let paths = step
            .files
            .iter()
            .map(|file| context.staging().workspace_path(file))
            .collect::<Result<Vec<_>, _>>()?;

        for path in paths {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| ActionError::io("failed to read file", &path, e))?;
            let masked = context.terminal().write_bytes(&bytes);
            output.stdout.push_str(&String::from_utf8_lossy(&masked));
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
    async fn prints_files_in_order_and_masks() {
        let (_dir, ctx) = context();
        ctx.store().set_secure_many([("PW", "hunter2")]);
        fs::create_dir_all(ctx.staging().workspace()).unwrap();
        fs::write(ctx.staging().workspace().join("a.txt"), "first\n").unwrap();
        fs::write(ctx.staging().workspace().join("b.txt"), "pw=hunter2\n").unwrap();

        let step = Step::new(actions::CAT).with_files(["a.txt", "b.txt"]);
        let mut output = ActionOutput::default();
        CatHandler.execute(&step, &ctx, &mut output).await.unwrap();

        assert_eq!(output.stdout, "first\npw=***\n");
    }

    #[tokio::test]
    async fn missing_file_aborts_the_rest() {
        let (_dir, ctx) = context();
        fs::create_dir_all(ctx.staging().workspace()).unwrap();
        fs::write(ctx.staging().workspace().join("a.txt"), "a\n").unwrap();
        fs::write(ctx.staging().workspace().join("c.txt"), "c\n").unwrap();

        let step = Step::new(actions::CAT).with_files(["a.txt", "missing.txt", "c.txt"]);
        let mut output = ActionOutput::default();
        let err = CatHandler.execute(&step, &ctx, &mut output).await.unwrap_err();

        assert!(err.to_string().contains("missing.txt"));
        assert_eq!(output.stdout, "a\n");
    }

    #[tokio::test]
    async fn refuses_files_outside_the_workspace() {
        let (dir, ctx) = context();
        let outside = dir.path().join("outside.txt");
        fs::write(&outside, "OUTSIDE-CONTENT\n").unwrap();
        fs::create_dir_all(ctx.staging().workspace()).unwrap();
        fs::write(ctx.staging().workspace().join("a.txt"), "a\n").unwrap();

        for file in [outside.to_string_lossy().into_owned(), "../outside.txt".to_string()] {
            let step = Step::new(actions::CAT).with_files(["a.txt".to_string(), file]);
            let mut output = ActionOutput::default();
            let err = CatHandler.execute(&step, &ctx, &mut output).await.unwrap_err();

            assert!(matches!(err, ActionError::PathOutsideWorkspace { .. }));
            assert!(err.is_validation());
            assert!(output.stdout.is_empty());
        }
    }

    #[tokio::test]
    async fn binary_content_is_captured_lossily() {
        let (_dir, ctx) = context();
        fs::create_dir_all(ctx.staging().workspace()).unwrap();
        fs::write(ctx.staging().workspace().join("bin"), b"ok\xff\n").unwrap();

        let step = Step::new(actions::CAT).with_files(["bin"]);
        let mut output = ActionOutput::default();
        CatHandler.execute(&step, &ctx, &mut output).await.unwrap();

        assert_eq!(output.stdout, "ok\u{FFFD}\n");
    }

    #[tokio::test]
    async fn empty_files_is_a_validation_error() {
        let (_dir, ctx) = context();
        let mut output = ActionOutput::default();
        let err = CatHandler
            .execute(&Step::new(actions::CAT), &ctx, &mut output)
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
