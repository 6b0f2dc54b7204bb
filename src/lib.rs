//! # webhook-dispatch
//!
//! Outbound request orchestration for a device talking to a single
//! automation hub over its webhook endpoint.
//!
//! Requests come from many independent producers (user actions, push
//! triggered fetches, periodic updates). This crate coalesces redundant
//! pending requests, hands the rest to a [`Transport`](transport::Transport),
//! and routes every hub response to a per-type
//! [`ResponseHandler`](handler::ResponseHandler) that performs side effects
//! and yields a [`HandlerOutcome`].
//!
//! ## Architecture
//!
//! ```text
//! submit ─► Coalescer ─► pending set ─► Transport ─┐
//!                             │                    │
//!                             └── join(accepted, result)
//!                                          │
//!                       HandlerRegistry ─► ResponseHandler ─► HandlerOutcome
//! ```
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use webhook_dispatch::{transport, Dispatcher, HandlerOutcome, WebhookRequest};
//! use webhook_dispatch::event_log::MemoryEventLog;
//! use webhook_dispatch::handler::ServiceCallHandler;
//! use webhook_dispatch::request::RequestType;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let log = Arc::new(MemoryEventLog::new());
//! let dispatcher = Dispatcher::builder()
//!     .handler(ServiceCallHandler::new(log.clone()))
//!     .build(transport::from_fn(|_request| async { Ok(json!({})) }));
//!
//! let request = WebhookRequest::builder(RequestType::SERVICE_CALL)
//!     .field("domain", json!("light"))
//!     .field("service", json!("turn_on"))
//!     .build();
//!
//! let outcome = dispatcher.submit(request).await.unwrap();
//! assert_eq!(outcome, HandlerOutcome::Default);
//! assert_eq!(log.events()[0].text, "Called service: light.turn_on");
//! # }
//! ```

pub mod coalesce;
pub mod error;
pub mod event_log;
pub mod handler;
pub mod request;
pub mod transport;

mod dispatcher;
mod pending;

pub use dispatcher::{
    Dispatcher, DispatcherBuilder, DispatcherConfig, ResponseFuture, DEFAULT_MAX_IN_FLIGHT,
};
pub use error::{TransportError, WebhookError};
pub use handler::HandlerOutcome;
pub use pending::SubmissionId;
pub use request::{RequestType, WebhookRequest};
