//! Service call response handler.
//!
//! The hub acknowledges a service call with an empty-ish body, so the
//! interesting part is the request itself: each acknowledged call is
//! recorded in the client event log as `Called service: <domain>.<service>`.

use std::sync::Arc;

use serde_json::Map;

use super::{BoxFuture, HandlerOutcome, HandlerResult, ResponseHandler};
use crate::event_log::{ClientEvent, EventCategory, EventLog};
use crate::request::{RequestType, WebhookRequest};
use crate::transport::RawResult;

/// Placeholder recorded for a missing or non-string `domain`/`service`.
pub const UNKNOWN_FIELD: &str = "(unknown)";

/// Handler for `serviceCall` requests.
#[derive(Clone)]
pub struct ServiceCallHandler {
    events: Arc<dyn EventLog>,
}

impl ServiceCallHandler {
    /// Create a handler recording into `events`.
    pub fn new(events: Arc<dyn EventLog>) -> Self {
        Self { events }
    }

    fn event_for(request: &WebhookRequest) -> ClientEvent {
        let domain = request.get_str("domain").unwrap_or(UNKNOWN_FIELD);
        let service = request.get_str("service").unwrap_or(UNKNOWN_FIELD);
        let payload = request.get_object("service_data").cloned().unwrap_or_else(Map::new);

        ClientEvent::new(
            format!("Called service: {}.{}", domain, service),
            EventCategory::ServiceCall,
            payload,
        )
    }
}

impl std::fmt::Debug for ServiceCallHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCallHandler").finish_non_exhaustive()
    }
}

impl ResponseHandler for ServiceCallHandler {
    fn identifier(&self) -> RequestType {
        RequestType::SERVICE_CALL
    }

    /// Every service call is a distinct action; none is ever merged.
    fn should_replace(&self, _current: &WebhookRequest, _proposed: &WebhookRequest) -> bool {
        false
    }

    fn handle(&self, request: Arc<WebhookRequest>, result: RawResult) -> BoxFuture<'static, HandlerResult> {
        let events = self.events.clone();
        Box::pin(async move {
            // A failed send was never acknowledged, so there is nothing to record.
            result?;
            events.record(Self::event_for(&request));
            Ok(HandlerOutcome::Default)
        })
    }
}
