//! The webhook request envelope.
//!
//! On the wire a request body is `{"type": "<identifier>", "data": {...}}`.
//! The data mapping keeps insertion order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RequestType;
use crate::error::Result;

/// One immutable logical request for the hub.
///
/// Requests have no `PartialEq`. Whether two requests are equivalent is
/// decided only by the per-type
/// [`should_replace`](crate::handler::ResponseHandler::should_replace)
/// predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookRequest {
    #[serde(rename = "type")]
    request_type: RequestType,
    #[serde(default)]
    data: Map<String, Value>,
}

impl WebhookRequest {
    /// Create a request from a type and its data mapping.
    pub fn new(request_type: impl Into<RequestType>, data: Map<String, Value>) -> Self {
        Self {
            request_type: request_type.into(),
            data,
        }
    }

    /// Start building a request of the given type.
    pub fn builder(request_type: impl Into<RequestType>) -> WebhookRequestBuilder {
        WebhookRequestBuilder {
            request_type: request_type.into(),
            data: Map::new(),
        }
    }

    /// The request type identifier.
    #[inline]
    pub fn request_type(&self) -> &RequestType {
        &self.request_type
    }

    /// The request data mapping.
    #[inline]
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Look up a data field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Look up a data field that holds a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Look up a data field that holds an object.
    pub fn get_object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.data.get(key).and_then(Value::as_object)
    }

    /// Encode the webhook body as JSON bytes.
    pub fn to_body(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a webhook body from JSON bytes.
    pub fn from_body(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Builder for [`WebhookRequest`].
#[derive(Debug)]
pub struct WebhookRequestBuilder {
    request_type: RequestType,
    data: Map<String, Value>,
}

impl WebhookRequestBuilder {
    /// Set a data field, replacing any earlier value for the key.
    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Finish the request.
    pub fn build(self) -> WebhookRequest {
        WebhookRequest {
            request_type: self.request_type,
            data: self.data,
        }
    }
}
