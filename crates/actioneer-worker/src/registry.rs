// ActionRegistry: the closed set of built-in actions, keyed by identifier.

use std::collections::HashMap;
use std::sync::Arc;

use crate::handlers::{
    ActionHandler, CatHandler, CheckoutHandler, DownloadArtifactHandler, PrintEnvHandler,
    SetEnvHandler, SetSecureEnvHandler, ShellHandler, UnsetEnvHandler, UploadArtifactHandler,
};

/// Populated once at construction and read-only afterwards.
#[derive(Clone)]
pub struct ActionRegistry {
    handlers: HashMap<&'static str, Arc<dyn ActionHandler>>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionRegistry {
    /// Registry of the nine built-in actions.
    pub fn new() -> Self {
        let builtins: Vec<Arc<dyn ActionHandler>> = vec![
            Arc::new(CheckoutHandler),
            Arc::new(CatHandler),
            Arc::new(ShellHandler),
            Arc::new(SetEnvHandler),
            Arc::new(SetSecureEnvHandler),
            Arc::new(UnsetEnvHandler),
            Arc::new(PrintEnvHandler),
            Arc::new(UploadArtifactHandler),
            Arc::new(DownloadArtifactHandler),
        ];
        Self {
            handlers: builtins.into_iter().map(|h| (h.id(), h)).collect(),
        }
    }

    pub fn resolve(&self, action_id: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(action_id).cloned()
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.handlers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actioneer_common::constants::actions;

    #[test]
    fn resolves_every_builtin() {
        let registry = ActionRegistry::new();
        assert_eq!(registry.len(), actions::ALL.len());
        for id in actions::ALL {
            let handler = registry.resolve(id).unwrap();
            assert_eq!(handler.id(), *id);
        }
    }

    #[test]
    fn unknown_and_unversioned_ids_do_not_resolve() {
        let registry = ActionRegistry::new();
        assert!(registry.resolve("actions/shell").is_none());
        assert!(registry.resolve("actions/shell@v2").is_none());
        assert!(registry.resolve("").is_none());
    }
}
