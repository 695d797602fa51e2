// Named trace sources that mask secure values before anything is emitted.

use crate::env_store::EnvironmentStore;
use actioneer_sdk::TraceWriter;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEventType {
    Verbose,
    Information,
    Warning,
    Error,
}

impl std::fmt::Display for TraceEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraceEventType::Verbose => write!(f, "VERB"),
            TraceEventType::Information => write!(f, "INFO"),
            TraceEventType::Warning => write!(f, "WARN"),
            TraceEventType::Error => write!(f, "ERR "),
        }
    }
}

/// A trace source bound to one run's [`EnvironmentStore`].
///
/// Every message goes through [`EnvironmentStore::mask_line`] and is then
/// dispatched to the `tracing` crate with the source name as a field, or to
/// an explicit sink when one is attached. Components such as the process
/// invoker can therefore be handed a `TraceWriter` without any risk of
/// echoing a secret.
#[derive(Clone)]
pub struct Tracing {
    name: String,
    store: EnvironmentStore,
    sink: Option<Arc<dyn TraceWriter>>,
}

impl Tracing {
    pub fn new(name: impl Into<String>, store: EnvironmentStore) -> Self {
        Self {
            name: name.into(),
            store,
            sink: None,
        }
    }

    /// Forward masked messages to `sink` instead of the `tracing` crate.
    pub fn with_sink(mut self, sink: Arc<dyn TraceWriter>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn trace(&self, event_type: TraceEventType, message: &str) {
        let masked = self.store.mask_line(message);

        if let Some(sink) = &self.sink {
            match event_type {
                TraceEventType::Error => sink.error(&masked),
                TraceEventType::Warning => sink.warning(&masked),
                TraceEventType::Information => sink.info(&masked),
                TraceEventType::Verbose => sink.verbose(&masked),
            }
            return;
        }

        let source = self.name.as_str();
        match event_type {
            TraceEventType::Error => tracing::error!(source, "{}", masked),
            TraceEventType::Warning => tracing::warn!(source, "{}", masked),
            TraceEventType::Information => tracing::info!(source, "{}", masked),
            TraceEventType::Verbose => tracing::debug!(source, "{}", masked),
        }
    }
}

impl TraceWriter for Tracing {
    fn info(&self, message: &str) {
        self.trace(TraceEventType::Information, message);
    }

    fn verbose(&self, message: &str) {
        self.trace(TraceEventType::Verbose, message);
    }

    fn warning(&self, message: &str) {
        self.trace(TraceEventType::Warning, message);
    }

    fn error(&self, message: &str) {
        self.trace(TraceEventType::Error, message);
    }
}
