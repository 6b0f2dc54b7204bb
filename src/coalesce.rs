//! Pending-request coalescing.
//!
//! When a request is submitted, the pending requests of the same type are
//! checked against the type's
//! [`should_replace`](crate::handler::ResponseHandler::should_replace)
//! policy. Every pending request the new one makes redundant is superseded.
//! Requests of other types are never compared.

use crate::handler::ResponseHandler;
use crate::pending::SubmissionId;
use crate::request::WebhookRequest;

/// Applies one request type's replacement policy.
pub struct Coalescer<'a> {
    policy: &'a dyn ResponseHandler,
}

impl<'a> Coalescer<'a> {
    /// Coalesce using the policy of `handler`.
    pub fn new(handler: &'a dyn ResponseHandler) -> Self {
        Self { policy: handler }
    }

    /// Whether `proposed` replaces `current`.
    ///
    /// Always `false` when the two requests have different types.
    pub fn replaces(&self, current: &WebhookRequest, proposed: &WebhookRequest) -> bool {
        current.request_type() == proposed.request_type()
            && self.policy.should_replace(current, proposed)
    }

    /// Ids of the pending requests that `proposed` supersedes.
    pub fn superseded<'p, I>(&self, proposed: &WebhookRequest, pending: I) -> Vec<SubmissionId>
    where
        I: IntoIterator<Item = (SubmissionId, &'p WebhookRequest)>,
    {
        pending
            .into_iter()
            .filter(|(_, current)| self.replaces(current, proposed))
            .map(|(id, _)| id)
            .collect()
    }
}
