//! Fallback handler for request types nothing else serves.

use std::sync::Arc;

use super::{BoxFuture, HandlerOutcome, HandlerResult, ResponseHandler};
use crate::request::{RequestType, WebhookRequest};
use crate::transport::RawResult;

/// Handler used for unknown request types.
///
/// No side effects, never replaces, always [`HandlerOutcome::Default`].
#[derive(Debug, Default, Clone, Copy)]
pub struct UnhandledHandler;

impl ResponseHandler for UnhandledHandler {
    fn identifier(&self) -> RequestType {
        RequestType::UNHANDLED
    }

    fn handle(&self, request: Arc<WebhookRequest>, _result: RawResult) -> BoxFuture<'static, HandlerResult> {
        tracing::debug!(request_type = %request.request_type(), "No handler registered, using default outcome");
        Box::pin(async { Ok(HandlerOutcome::Default) })
    }
}
