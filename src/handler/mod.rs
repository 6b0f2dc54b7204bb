//! Handler module - typed response handling and dispatch by request type.
//!
//! Provides:
//! - [`ResponseHandler`] - one implementation per request type
//! - [`HandlerRegistry`] - maps request types to handlers
//! - [`HandlerOutcome`] - what the caller should do after a response
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use webhook_dispatch::event_log::MemoryEventLog;
//! use webhook_dispatch::handler::{HandlerRegistry, ServiceCallHandler};
//! use webhook_dispatch::request::RequestType;
//!
//! let log = Arc::new(MemoryEventLog::new());
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register(ServiceCallHandler::new(log));
//!
//! assert_eq!(
//!     registry.resolve(&RequestType::SERVICE_CALL).identifier(),
//!     RequestType::SERVICE_CALL
//! );
//! // Unknown types fall back to the unhandled handler.
//! assert_eq!(
//!     registry.resolve(&RequestType::new("mystery")).identifier(),
//!     RequestType::UNHANDLED
//! );
//! ```

mod outcome;
mod registry;
mod service_call;
mod unhandled;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub use outcome::HandlerOutcome;
pub use registry::HandlerRegistry;
pub use service_call::{ServiceCallHandler, UNKNOWN_FIELD};
pub use unhandled::UnhandledHandler;

use crate::error::Result;
use crate::request::{RequestType, WebhookRequest};
use crate::transport::RawResult;

/// Boxed future used at the handler and transport seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result type for handler invocations.
pub type HandlerResult = Result<HandlerOutcome>;

/// Type-specific interpretation of a hub response.
///
/// Handlers may fail by returning `Err` (or even by panicking); the
/// dispatcher converts every such failure into [`HandlerOutcome::Default`],
/// so implementations should not swallow their own errors.
pub trait ResponseHandler: Send + Sync + 'static {
    /// The request type this handler serves.
    fn identifier(&self) -> RequestType;

    /// Whether `proposed` makes the pending `current` request redundant.
    ///
    /// Only called with two requests of this handler's type. The default
    /// never replaces, so every submission is sent.
    fn should_replace(&self, _current: &WebhookRequest, _proposed: &WebhookRequest) -> bool {
        false
    }

    /// Process the hub's result for `request`.
    fn handle(&self, request: Arc<WebhookRequest>, result: RawResult) -> BoxFuture<'static, HandlerResult>;
}
