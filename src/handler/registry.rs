//! Handler registry for dispatching responses by request type.
//!
//! The registry is filled before the dispatcher starts and is read-only
//! afterwards. Lookups for unknown request types fall back to the
//! [`UnhandledHandler`].
//!
//! # Example
//!
//! ```
//! use webhook_dispatch::handler::{HandlerRegistry, UnhandledHandler};
//! use webhook_dispatch::request::RequestType;
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register(UnhandledHandler);
//!
//! assert!(registry.get(&RequestType::UNHANDLED).is_some());
//! assert!(registry.get(&RequestType::SERVICE_CALL).is_none());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use super::{ResponseHandler, UnhandledHandler};
use crate::request::RequestType;

/// Registry mapping request types to handlers.
pub struct HandlerRegistry {
    /// Handlers by request type.
    handlers: HashMap<RequestType, Arc<dyn ResponseHandler>>,
    /// Used for every type without an entry.
    fallback: Arc<dyn ResponseHandler>,
}

impl HandlerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            fallback: Arc::new(UnhandledHandler),
        }
    }

    /// Register a handler under its own identifier.
    ///
    /// A later registration for the same identifier replaces the earlier one.
    pub fn register<H: ResponseHandler>(&mut self, handler: H) {
        self.register_arc(Arc::new(handler));
    }

    /// Register an already shared handler.
    pub fn register_arc(&mut self, handler: Arc<dyn ResponseHandler>) {
        let identifier = handler.identifier();
        if self.handlers.insert(identifier.clone(), handler).is_some() {
            tracing::warn!(request_type = %identifier, "Replacing previously registered handler");
        }
    }

    /// Get the handler registered for a request type, if any.
    pub fn get(&self, request_type: &RequestType) -> Option<&Arc<dyn ResponseHandler>> {
        self.handlers.get(request_type)
    }

    /// Get the handler for a request type, falling back to the unhandled handler.
    pub fn resolve(&self, request_type: &RequestType) -> &Arc<dyn ResponseHandler> {
        self.handlers.get(request_type).unwrap_or(&self.fallback)
    }

    /// Whether a handler is registered for the request type.
    pub fn contains(&self, request_type: &RequestType) -> bool {
        self.handlers.contains_key(request_type)
    }

    /// Registered request types.
    pub fn request_types(&self) -> impl Iterator<Item = &RequestType> {
        self.handlers.keys()
    }

    /// Number of registered handlers (the fallback is not counted).
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("request_types", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
