//! Handler registry.
//!
//! Job manifests name their implementation by handler id; the host process
//! registers the actual implementations here before catalog load. Built
//! once at startup, read-only afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use cadence_engine::JobHandler;

/// Registry mapping handler ids to implementations.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under an id. Replaces any previous registration.
    pub fn register(&mut self, id: impl Into<String>, handler: Arc<dyn JobHandler>) -> &mut Self {
        self.handlers.insert(id.into(), handler);
        self
    }

    /// Builder-style registration.
    pub fn with(mut self, id: impl Into<String>, handler: Arc<dyn JobHandler>) -> Self {
        self.register(id, handler);
        self
    }

    /// Look up a handler by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(id).cloned()
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
