//! The dispatcher's pending set.
//!
//! An entry lives here from the moment `submit` accepts it until it is
//! either superseded or claimed by its send task once the hub's result is
//! in. Whoever removes an entry settles it; removal happens under the
//! dispatcher's lock, so every entry is settled exactly once.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use crate::error::{Result, WebhookError};
use crate::handler::HandlerOutcome;
use crate::request::{RequestType, WebhookRequest};

/// Opaque identifier of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubmissionId(u64);

impl SubmissionId {
    /// Raw numeric value, for logging.
    #[inline]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A submitted request that has not been resolved yet.
pub(crate) struct PendingEntry {
    request: Arc<WebhookRequest>,
    outcome: oneshot::Sender<Result<HandlerOutcome>>,
    task: AbortHandle,
}

impl PendingEntry {
    pub(crate) fn new(
        request: Arc<WebhookRequest>,
        outcome: oneshot::Sender<Result<HandlerOutcome>>,
        task: AbortHandle,
    ) -> Self {
        Self {
            request,
            outcome,
            task,
        }
    }

    /// Settle the caller's future. The caller may have stopped waiting.
    pub(crate) fn settle(self, result: Result<HandlerOutcome>) {
        let _ = self.outcome.send(result);
    }

    /// Settle as superseded and stop the send task.
    pub(crate) fn supersede(self) {
        self.task.abort();
        self.settle(Err(WebhookError::Superseded));
    }
}

/// Submitted-but-unresolved requests, in submission order.
#[derive(Default)]
pub(crate) struct PendingSet {
    entries: BTreeMap<SubmissionId, PendingEntry>,
    next_id: u64,
}

impl PendingSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Allocate the next submission id.
    pub(crate) fn next_id(&mut self) -> SubmissionId {
        self.next_id += 1;
        SubmissionId(self.next_id)
    }

    pub(crate) fn insert(&mut self, id: SubmissionId, entry: PendingEntry) {
        self.entries.insert(id, entry);
    }

    /// Remove an entry. `None` means someone else already settled it.
    pub(crate) fn take(&mut self, id: SubmissionId) -> Option<PendingEntry> {
        self.entries.remove(&id)
    }

    /// Pending requests of one type, oldest first.
    pub(crate) fn of_type<'a>(
        &'a self,
        request_type: &'a RequestType,
    ) -> impl Iterator<Item = (SubmissionId, &'a WebhookRequest)> + 'a {
        self.entries
            .iter()
            .filter(move |(_, entry)| entry.request.request_type() == request_type)
            .map(|(id, entry)| (*id, entry.request.as_ref()))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn len_for(&self, request_type: &RequestType) -> usize {
        self.of_type(request_type).count()
    }
}
