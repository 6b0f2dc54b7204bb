//! Error types for webhook-dispatch.

use std::time::Duration;

use thiserror::Error;

/// Main error type for all dispatch operations.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The request was replaced by a newer equivalent request before its
    /// result reached a handler.
    #[error("Request superseded by a newer request of the same type")]
    Superseded,

    /// Sending the request or receiving its response failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A response handler failed while processing a result.
    #[error("Handler error: {0}")]
    Handler(String),

    /// The dispatcher dropped the request without settling it.
    #[error("Request cancelled")]
    Cancelled,

    /// JSON serialization/deserialization error (request bodies).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure reported by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No response arrived within the configured send timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The hub answered with a non-success HTTP status.
    #[error("unexpected status {0}")]
    Status(u16),

    /// Connection-level failure.
    #[error("network failure: {0}")]
    Network(String),
}

/// Result type alias using WebhookError.
pub type Result<T> = std::result::Result<T, WebhookError>;
