//! Dispatcher builder and request lifecycle.
//!
//! The [`DispatcherBuilder`] registers response handlers and tunes send
//! limits. The [`Dispatcher`] manages each request's lifecycle:
//! 1. Coalesce against pending requests of the same type
//! 2. Accept into the pending set
//! 3. Send through the [`Transport`]
//! 4. Once both acceptance and the send result are in, claim the entry and
//!    run the type's handler
//! 5. Settle the caller's [`ResponseFuture`]
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use webhook_dispatch::{Dispatcher, WebhookRequest};
//! use webhook_dispatch::event_log::MemoryEventLog;
//! use webhook_dispatch::handler::ServiceCallHandler;
//! use webhook_dispatch::request::RequestType;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let log = Arc::new(MemoryEventLog::new());
//!     let dispatcher = Dispatcher::builder()
//!         .handler(ServiceCallHandler::new(log))
//!         .build(my_http_transport());
//!
//!     let outcome = dispatcher
//!         .submit(WebhookRequest::builder(RequestType::SERVICE_CALL).build())
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinSet;

use crate::coalesce::Coalescer;
use crate::error::{Result, TransportError, WebhookError};
use crate::handler::{HandlerOutcome, HandlerRegistry, ResponseHandler};
use crate::pending::{PendingEntry, PendingSet, SubmissionId};
use crate::request::{RequestType, WebhookRequest};
use crate::transport::{RawResult, Transport};

/// Default maximum number of concurrent transport sends.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// Configuration for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Maximum concurrent sends. Requests beyond this wait (still pending).
    pub max_in_flight: usize,
    /// Optional per-send timeout. `None` leaves timeouts to the transport
    /// and waits for it indefinitely.
    pub send_timeout: Option<Duration>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            send_timeout: None,
        }
    }
}

/// Builder for configuring and creating a [`Dispatcher`].
pub struct DispatcherBuilder {
    registry: HandlerRegistry,
    config: DispatcherConfig,
}

impl DispatcherBuilder {
    /// Create a new dispatcher builder.
    pub fn new() -> Self {
        Self {
            registry: HandlerRegistry::new(),
            config: DispatcherConfig::default(),
        }
    }

    /// Register a response handler under its identifier.
    pub fn handler<H: ResponseHandler>(mut self, handler: H) -> Self {
        self.registry.register(handler);
        self
    }

    /// Register an already shared response handler.
    pub fn handler_arc(mut self, handler: Arc<dyn ResponseHandler>) -> Self {
        self.registry.register_arc(handler);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the maximum number of concurrent sends (at least one).
    ///
    /// Default: 16
    pub fn max_in_flight(mut self, limit: usize) -> Self {
        self.config.max_in_flight = limit;
        self
    }

    /// Fail a send with [`TransportError::Timeout`] after `timeout`.
    ///
    /// The timeout reaches the handler like any other send failure.
    /// Default: none, the transport owns its timeout policy.
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.config.send_timeout = Some(timeout);
        self
    }

    /// Wait for the transport indefinitely (the default).
    pub fn no_send_timeout(mut self) -> Self {
        self.config.send_timeout = None;
        self
    }

    /// Build the dispatcher. The handler registry is frozen from here on.
    pub fn build<T: Transport>(self, transport: T) -> Dispatcher {
        Dispatcher::new(self.registry, Arc::new(transport), self.config)
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared dispatcher state.
struct Inner {
    /// Read-only after construction.
    registry: HandlerRegistry,
    transport: Arc<dyn Transport>,
    /// The only mutable shared state; never held across an await.
    pending: Mutex<PendingSet>,
    send_permits: Semaphore,
    send_timeout: Option<Duration>,
}

impl Inner {
    fn pending(&self) -> MutexGuard<'_, PendingSet> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Coalesces, sends and routes webhook requests.
///
/// Cheap to clone; clones share the pending set.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    /// Create a new dispatcher builder.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    fn new(registry: HandlerRegistry, transport: Arc<dyn Transport>, config: DispatcherConfig) -> Self {
        tracing::debug!(
            handlers = registry.len(),
            max_in_flight = config.max_in_flight,
            send_timeout = ?config.send_timeout,
            "Dispatcher created"
        );

        Self {
            inner: Arc::new(Inner {
                registry,
                transport,
                pending: Mutex::new(PendingSet::new()),
                send_permits: Semaphore::new(config.max_in_flight.max(1)),
                send_timeout: config.send_timeout,
            }),
        }
    }

    /// Submit a request.
    ///
    /// Pending requests of the same type that this one replaces are settled
    /// with [`WebhookError::Superseded`] before this returns. The returned
    /// future resolves to the handler's outcome, to the default outcome if
    /// the handler failed, or to `Superseded` if a later submission replaces
    /// this one first. Dropping the future does not cancel the request.
    /// If the transport never completes the future stays pending; wrap it
    /// in a timeout to give up.
    ///
    /// Outcomes of one request type follow the order in which their send
    /// tasks observe transport completion. On a multi-threaded runtime two
    /// sends finishing at nearly the same time may be handled in either
    /// order.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn submit(&self, request: WebhookRequest) -> ResponseFuture {
        let request = Arc::new(request);
        let handler = self.inner.registry.resolve(request.request_type()).clone();
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (accepted_tx, accepted_rx) = oneshot::channel();

        let id = {
            let mut pending = self.inner.pending();

            let superseded = Coalescer::new(handler.as_ref())
                .superseded(&request, pending.of_type(request.request_type()));
            for old in superseded {
                if let Some(entry) = pending.take(old) {
                    tracing::debug!(
                        request_type = %request.request_type(),
                        submission_id = %old,
                        "Superseding pending request"
                    );
                    entry.supersede();
                }
            }

            let id = pending.next_id();
            let task = tokio::spawn(Self::run(
                self.inner.clone(),
                id,
                request.clone(),
                handler,
                accepted_rx,
            ));
            pending.insert(id, PendingEntry::new(request.clone(), outcome_tx, task.abort_handle()));
            id
        };

        tracing::debug!(
            request_type = %request.request_type(),
            submission_id = %id,
            "Request accepted"
        );
        let _ = accepted_tx.send(());

        ResponseFuture { id, rx: outcome_rx }
    }

    /// Number of unresolved requests.
    pub fn pending_count(&self) -> usize {
        self.inner.pending().len()
    }

    /// Number of unresolved requests of one type.
    pub fn pending_count_for(&self, request_type: &RequestType) -> usize {
        self.inner.pending().len_for(request_type)
    }

    /// The frozen handler registry.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.inner.registry
    }

    /// Send task for one submission.
    async fn run(
        inner: Arc<Inner>,
        id: SubmissionId,
        request: Arc<WebhookRequest>,
        handler: Arc<dyn ResponseHandler>,
        accepted: oneshot::Receiver<()>,
    ) {
        // The handler may only run once the request is in the pending set
        // and the transport has completed.
        let (accepted, result) = tokio::join!(accepted, Self::send(&inner, request.clone()));
        if accepted.is_err() {
            return;
        }

        let Some(entry) = inner.pending().take(id) else {
            tracing::debug!(submission_id = %id, "Result arrived for superseded request");
            return;
        };

        let outcome = Self::invoke(handler, request, result).await;
        entry.settle(Ok(outcome));
    }

    /// Send through the transport within the in-flight limit and timeout.
    ///
    /// The transport runs on its own task so a panic in it becomes a send
    /// failure. Dropping the `JoinSet` (supersede, timeout) aborts that task.
    async fn send(inner: &Inner, request: Arc<WebhookRequest>) -> RawResult {
        // `send_permits` is never closed, so acquiring only waits.
        let _permit = inner
            .send_permits
            .acquire()
            .await
            .map_err(|_| TransportError::Network("send permits closed".into()))?;

        let request_type = request.request_type().clone();
        let transport = inner.transport.clone();
        let mut send = JoinSet::new();
        send.spawn(async move { transport.send(request).await });

        let joined = match inner.send_timeout {
            Some(limit) => match tokio::time::timeout(limit, send.join_next()).await {
                Ok(joined) => joined,
                Err(_) => return Err(TransportError::Timeout(limit)),
            },
            None => send.join_next().await,
        };

        match joined {
            Some(Ok(result)) => result,
            Some(Err(e)) if e.is_panic() => {
                tracing::error!(request_type = %request_type, "Transport panicked");
                Err(TransportError::Network("transport panicked".into()))
            }
            Some(Err(e)) => Err(TransportError::Network(e.to_string())),
            None => Err(TransportError::Network("send task missing".into())),
        }
    }

    /// Run the handler on its own task; any failure becomes the default outcome.
    async fn invoke(
        handler: Arc<dyn ResponseHandler>,
        request: Arc<WebhookRequest>,
        result: RawResult,
    ) -> HandlerOutcome {
        let request_type = request.request_type().clone();
        if let Err(e) = &result {
            tracing::warn!(request_type = %request_type, error = %e, "Webhook send failed");
        }

        let task = tokio::spawn(async move { handler.handle(request, result).await });
        match task.await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                tracing::warn!(request_type = %request_type, error = %e, "Handler error, using default outcome");
                HandlerOutcome::Default
            }
            Err(e) if e.is_panic() => {
                tracing::error!(request_type = %request_type, "Handler panicked, using default outcome");
                HandlerOutcome::Default
            }
            Err(e) => {
                tracing::warn!(request_type = %request_type, error = %e, "Handler task cancelled, using default outcome");
                HandlerOutcome::Default
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.inner.registry)
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// Future for the outcome of one submitted request.
#[must_use = "the outcome tells the caller what to do next"]
#[derive(Debug)]
pub struct ResponseFuture {
    id: SubmissionId,
    rx: oneshot::Receiver<Result<HandlerOutcome>>,
}

impl ResponseFuture {
    /// The submission this future belongs to.
    pub fn id(&self) -> SubmissionId {
        self.id
    }
}

impl Future for ResponseFuture {
    type Output = Result<HandlerOutcome>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|settled| settled.unwrap_or(Err(WebhookError::Cancelled)))
    }
}
