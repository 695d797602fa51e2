// actioneer-worker: the workflow engine. Loads a workflow document, resolves
// each step to a built-in action and runs jobs sequentially.
//
// Architecture:
//   WorkflowRunner::run_workflow → StepsRunner::run_job
//     → ActionRegistry::resolve → timing::with_timing(ActionHandler::execute)

pub mod handlers;
pub mod model;
pub mod registry;
pub mod run_context;
pub mod staging;
pub mod steps_runner;
pub mod timing;
pub mod workflow_runner;

pub use handlers::{ActionHandler, ActionOutput};
pub use model::{Job, Step, Workflow, WorkflowLoadError};
pub use registry::ActionRegistry;
pub use run_context::RunContext;
pub use staging::ArtifactStaging;
pub use workflow_runner::{RunState, WorkflowRunner};
