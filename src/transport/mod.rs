//! Transport module - the seam to whatever actually talks HTTP to the hub.
//!
//! The dispatcher only needs one completion per send: a JSON value on
//! success, a [`TransportError`] otherwise. Retries, backoff and
//! authentication live behind this trait.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use webhook_dispatch::transport::{self, Transport};
//!
//! let transport = transport::from_fn(|_request| async { Ok(json!({})) });
//! # let _: &dyn Transport = &transport;
//! ```

mod function;

use std::sync::Arc;

use serde_json::Value;

pub use function::{from_fn, FnTransport};

use crate::error::TransportError;
use crate::handler::BoxFuture;
use crate::request::WebhookRequest;

/// Raw outcome of one send: the hub's decoded response body or a failure.
pub type RawResult = std::result::Result<Value, TransportError>;

/// Sends webhook requests to the hub.
pub trait Transport: Send + Sync + 'static {
    /// Send one request. Must complete exactly once.
    fn send(&self, request: Arc<WebhookRequest>) -> BoxFuture<'static, RawResult>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: Arc<WebhookRequest>) -> BoxFuture<'static, RawResult> {
        (**self).send(request)
    }
}
