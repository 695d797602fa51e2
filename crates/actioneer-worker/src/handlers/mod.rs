// Handlers module - the built-in actions and the host they run subprocesses on.

pub mod artifact;
pub mod cat;
pub mod checkout;
pub mod env;
pub mod handler;
pub mod shell;
pub mod step_host;

pub use artifact::{DownloadArtifactHandler, UploadArtifactHandler};
pub use cat::CatHandler;
pub use checkout::CheckoutHandler;
pub use env::{PrintEnvHandler, SetEnvHandler, SetSecureEnvHandler, UnsetEnvHandler};
pub use handler::{ActionHandler, ActionOutput};
pub use shell::ShellHandler;
pub use step_host::StepHost;
