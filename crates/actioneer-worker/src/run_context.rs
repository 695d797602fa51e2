// RunContext: everything one workflow run threads through its actions.
// A run owns its own EnvironmentStore, so nothing leaks between runs.

use actioneer_common::{EngineSettings, EnvironmentStore, Terminal, Tracing};
use actioneer_sdk::TraceWriter;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::staging::ArtifactStaging;

pub struct RunContext {
    run_id: Uuid,
    settings: EngineSettings,
    store: EnvironmentStore,
    staging: ArtifactStaging,
    terminal: Terminal,
    cancel: CancellationToken,
}

impl RunContext {
    pub fn new(settings: EngineSettings, cancel: CancellationToken) -> Self {
        let store = EnvironmentStore::new();
        let terminal = if settings.print_to_stdout {
            Terminal::new(store.clone())
        } else {
            Terminal::silent(store.clone())
        };
        Self {
            run_id: Uuid::new_v4(),
            staging: ArtifactStaging::from_settings(&settings),
            settings,
            store,
            terminal,
            cancel,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn store(&self) -> &EnvironmentStore {
        &self.store
    }

    pub fn staging(&self) -> &ArtifactStaging {
        &self.staging
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A masked trace source named `name`, suitable for the process invoker.
    pub fn trace(&self, name: &str) -> Arc<dyn TraceWriter> {
        Arc::new(Tracing::new(name, self.store.clone()))
    }
}
