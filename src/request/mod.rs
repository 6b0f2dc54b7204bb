//! Request module - webhook request envelopes and their type tags.
//!
//! Provides:
//! - [`RequestType`] - the identifier used to pick a response handler
//! - [`WebhookRequest`] - one immutable logical request
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use webhook_dispatch::request::{RequestType, WebhookRequest};
//!
//! let request = WebhookRequest::builder(RequestType::SERVICE_CALL)
//!     .field("domain", json!("light"))
//!     .field("service", json!("turn_on"))
//!     .build();
//!
//! assert_eq!(request.request_type(), &RequestType::SERVICE_CALL);
//! assert_eq!(request.get_str("domain"), Some("light"));
//! ```

mod envelope;
mod identifier;

pub use envelope::{WebhookRequest, WebhookRequestBuilder};
pub use identifier::RequestType;
