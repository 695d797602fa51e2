// actioneer-common: the shared building blocks of a workflow run. Secure
// environment store, execution log, settings, masked console and tracing,
// plus the error taxonomy every action reports through.

pub mod action_result;
pub mod constants;
pub mod env_store;
pub mod error;
pub mod logging;
pub mod settings;
pub mod terminal;
pub mod tracing;

// ---------------------------------------------------------------------------
// Re-exports for convenient access
// ---------------------------------------------------------------------------

pub use action_result::ActionResult;
pub use constants::{WellKnownDirectory, MASK};
pub use env_store::EnvironmentStore;
pub use error::{ActionError, LogError, StepError, WorkflowError};
pub use logging::{ExecutionLog, ExecutionLogEntry};
pub use settings::{EngineSettings, SettingsStore};
pub use terminal::{ConsoleColor, Terminal};
pub use self::tracing::{TraceEventType, Tracing};
