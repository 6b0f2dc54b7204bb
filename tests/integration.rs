//! Integration tests for webhook-dispatch.
//!
//! These tests drive the dispatcher end to end through a transport whose
//! completions are controlled by the test.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};

use webhook_dispatch::event_log::{EventCategory, MemoryEventLog};
use webhook_dispatch::handler::{BoxFuture, HandlerResult, ResponseHandler, ServiceCallHandler};
use webhook_dispatch::transport::{self, RawResult, Transport};
use webhook_dispatch::{
    Dispatcher, HandlerOutcome, RequestType, TransportError, WebhookError, WebhookRequest,
};

/// One send waiting for the test to complete it.
struct PendingSend {
    request: Arc<WebhookRequest>,
    reply: oneshot::Sender<RawResult>,
}

/// Transport that hands every send to the test.
struct ManualTransport {
    sends: mpsc::UnboundedSender<PendingSend>,
}

impl ManualTransport {
    fn new() -> (Self, mpsc::UnboundedReceiver<PendingSend>) {
        let (sends, rx) = mpsc::unbounded_channel();
        (Self { sends }, rx)
    }
}

impl Transport for ManualTransport {
    fn send(&self, request: Arc<WebhookRequest>) -> BoxFuture<'static, RawResult> {
        let (reply, rx) = oneshot::channel();
        let _ = self.sends.send(PendingSend { request, reply });
        Box::pin(async move {
            rx.await
                .unwrap_or(Err(TransportError::Network("reply dropped".into())))
        })
    }
}

/// Handler recording the `n` field of every request it handles.
struct RecordingHandler {
    identifier: &'static str,
    replace: bool,
    outcome: HandlerOutcome,
    seen: Arc<Mutex<Vec<i64>>>,
}

impl RecordingHandler {
    fn new(identifier: &'static str, replace: bool, outcome: HandlerOutcome) -> (Self, Arc<Mutex<Vec<i64>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handler = Self {
            identifier,
            replace,
            outcome,
            seen: seen.clone(),
        };
        (handler, seen)
    }
}

impl ResponseHandler for RecordingHandler {
    fn identifier(&self) -> RequestType {
        RequestType::from_static(self.identifier)
    }

    fn should_replace(&self, _current: &WebhookRequest, _proposed: &WebhookRequest) -> bool {
        self.replace
    }

    fn handle(&self, request: Arc<WebhookRequest>, _result: RawResult) -> BoxFuture<'static, HandlerResult> {
        let seen = self.seen.clone();
        let outcome = self.outcome;
        Box::pin(async move {
            let n = request.get("n").and_then(Value::as_i64).unwrap_or(-1);
            seen.lock().unwrap().push(n);
            Ok(outcome)
        })
    }
}

/// Handler that fails (or panics) on every response.
struct BrokenHandler {
    panic: bool,
}

impl ResponseHandler for BrokenHandler {
    fn identifier(&self) -> RequestType {
        RequestType::from_static("broken")
    }

    fn handle(&self, _request: Arc<WebhookRequest>, _result: RawResult) -> BoxFuture<'static, HandlerResult> {
        if self.panic {
            panic!("handler bug");
        }
        Box::pin(async { Err(WebhookError::Handler("malformed payload".into())) })
    }
}

fn numbered(request_type: &'static str, n: i64) -> WebhookRequest {
    WebhookRequest::builder(request_type).field("n", json!(n)).build()
}

fn light_on() -> WebhookRequest {
    WebhookRequest::builder(RequestType::SERVICE_CALL)
        .field("domain", json!("light"))
        .field("service", json!("turn_on"))
        .field("service_data", json!({"entity_id": "light.kitchen"}))
        .build()
}

/// Service call through the full pipeline records exactly one event.
#[tokio::test]
async fn test_service_call_records_event() {
    let log = Arc::new(MemoryEventLog::new());
    let dispatcher = Dispatcher::builder()
        .handler(ServiceCallHandler::new(log.clone()))
        .build(transport::from_fn(|_| async { Ok(json!({})) }));

    let outcome = dispatcher.submit(light_on()).await.unwrap();

    assert_eq!(outcome, HandlerOutcome::Default);
    let events = log.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].text, "Called service: light.turn_on");
    assert_eq!(events[0].category, EventCategory::ServiceCall);
    assert_eq!(
        Value::Object(events[0].payload.clone()),
        json!({"entity_id": "light.kitchen"})
    );
}

/// A failed send still acknowledges the service call with the default outcome.
#[tokio::test]
async fn test_service_call_transport_failure_is_default() {
    let log = Arc::new(MemoryEventLog::new());
    let dispatcher = Dispatcher::builder()
        .handler(ServiceCallHandler::new(log.clone()))
        .build(transport::from_fn(|_| async { Err(TransportError::Status(500)) }));

    let outcome = dispatcher.submit(light_on()).await.unwrap();

    assert_eq!(outcome, HandlerOutcome::Default);
    assert!(log.is_empty());
    assert_eq!(dispatcher.pending_count(), 0);
}

/// N concurrent service calls produce N sends and N outcomes.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_service_calls_are_never_coalesced() {
    const N: usize = 25;

    let log = Arc::new(MemoryEventLog::new());
    let sends = Arc::new(AtomicUsize::new(0));
    let counter = sends.clone();
    let dispatcher = Dispatcher::builder()
        .handler(ServiceCallHandler::new(log.clone()))
        .max_in_flight(4)
        .build(transport::from_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(json!({}))
            }
        }));

    let mut tasks = Vec::new();
    for _ in 0..N {
        let dispatcher = dispatcher.clone();
        tasks.push(tokio::spawn(async move { dispatcher.submit(light_on()).await }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), HandlerOutcome::Default);
    }

    assert_eq!(sends.load(Ordering::SeqCst), N);
    assert_eq!(log.len(), N);
    assert_eq!(dispatcher.pending_count(), 0);
}

/// The handler runs only after the transport has completed.
#[tokio::test]
async fn test_handler_waits_for_transport_completion() {
    let (transport, mut sends) = ManualTransport::new();
    let (handler, seen) = RecordingHandler::new("poll", false, HandlerOutcome::RefreshNow);
    let dispatcher = Dispatcher::builder()
        .handler(handler)
        .no_send_timeout()
        .build(transport);

    let future = dispatcher.submit(numbered("poll", 1));
    let send = sends.recv().await.unwrap();
    assert_eq!(send.request.get("n"), Some(&json!(1)));

    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(dispatcher.pending_count(), 1);

    send.reply.send(Ok(json!({"ok": true}))).unwrap();

    assert_eq!(future.await.unwrap(), HandlerOutcome::RefreshNow);
    assert_eq!(*seen.lock().unwrap(), vec![1]);
    assert_eq!(dispatcher.pending_count(), 0);
}

/// A replacing policy supersedes the older entry before the newer send starts.
#[tokio::test]
async fn test_replacement_supersedes_older_request() {
    let (transport, mut sends) = ManualTransport::new();
    let (handler, seen) = RecordingHandler::new("poll", true, HandlerOutcome::RefreshNow);
    let dispatcher = Dispatcher::builder()
        .handler(handler)
        .no_send_timeout()
        .build(transport);

    let first = dispatcher.submit(numbered("poll", 1));
    let first_send = sends.recv().await.unwrap();

    let second = dispatcher.submit(numbered("poll", 2));
    assert!(matches!(first.await, Err(WebhookError::Superseded)));
    assert!(sends.try_recv().is_err());
    assert_eq!(dispatcher.pending_count(), 1);

    let second_send = sends.recv().await.unwrap();
    assert_eq!(second_send.request.get("n"), Some(&json!(2)));

    let _ = first_send.reply.send(Ok(json!({})));
    second_send.reply.send(Ok(json!({}))).unwrap();

    assert_eq!(second.await.unwrap(), HandlerOutcome::RefreshNow);
    assert_eq!(*seen.lock().unwrap(), vec![2]);
    assert_eq!(dispatcher.pending_count(), 0);
}

/// Requests waiting for a send slot are still pending and can be superseded.
#[tokio::test]
async fn test_request_waiting_for_send_slot_can_be_superseded() {
    let (transport, mut sends) = ManualTransport::new();
    let (poll, seen) = RecordingHandler::new("poll", true, HandlerOutcome::Default);
    let (service, _) = RecordingHandler::new("other", false, HandlerOutcome::Default);
    let dispatcher = Dispatcher::builder()
        .handler(poll)
        .handler(service)
        .max_in_flight(1)
        .no_send_timeout()
        .build(transport);

    let blocker = dispatcher.submit(numbered("other", 0));
    let blocker_send = sends.recv().await.unwrap();

    let stale = dispatcher.submit(numbered("poll", 1));
    let fresh = dispatcher.submit(numbered("poll", 2));
    assert!(matches!(stale.await, Err(WebhookError::Superseded)));
    assert_eq!(dispatcher.pending_count_for(&RequestType::new("poll")), 1);
    assert_eq!(dispatcher.pending_count_for(&RequestType::new("other")), 1);

    blocker_send.reply.send(Ok(json!({}))).unwrap();
    blocker.await.unwrap();

    let fresh_send = sends.recv().await.unwrap();
    assert_eq!(fresh_send.request.get("n"), Some(&json!(2)));
    fresh_send.reply.send(Ok(json!({}))).unwrap();

    fresh.await.unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![2]);
}

/// Replacement never crosses request types.
#[tokio::test]
async fn test_replacement_is_per_type() {
    let (transport, mut sends) = ManualTransport::new();
    let (poll, _) = RecordingHandler::new("poll", true, HandlerOutcome::Default);
    let dispatcher = Dispatcher::builder()
        .handler(poll)
        .no_send_timeout()
        .build(transport);

    let poll_future = dispatcher.submit(numbered("poll", 1));
    let other_future = dispatcher.submit(numbered("status", 2));
    assert_eq!(dispatcher.pending_count(), 2);

    for _ in 0..2 {
        sends.recv().await.unwrap().reply.send(Ok(json!({}))).unwrap();
    }

    assert!(poll_future.await.is_ok());
    assert!(other_future.await.is_ok());
}

/// Outcomes for one type follow transport completion order.
#[tokio::test]
async fn test_outcomes_follow_completion_order() {
    let (transport, mut sends) = ManualTransport::new();
    let (handler, seen) = RecordingHandler::new("poll", false, HandlerOutcome::Default);
    let dispatcher = Dispatcher::builder()
        .handler(handler)
        .no_send_timeout()
        .build(transport);

    let first = dispatcher.submit(numbered("poll", 1));
    let second = dispatcher.submit(numbered("poll", 2));
    let first_send = sends.recv().await.unwrap();
    let second_send = sends.recv().await.unwrap();

    second_send.reply.send(Ok(json!({}))).unwrap();
    second.await.unwrap();
    first_send.reply.send(Ok(json!({}))).unwrap();
    first.await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![2, 1]);
}

/// A handler error becomes the default outcome and does not leak the entry.
#[tokio::test]
async fn test_handler_error_yields_default() {
    let dispatcher = Dispatcher::builder()
        .handler(BrokenHandler { panic: false })
        .build(transport::from_fn(|_| async { Ok(json!({"valid": true})) }));

    let outcome = dispatcher.submit(WebhookRequest::builder("broken").build()).await;

    assert_eq!(outcome.unwrap(), HandlerOutcome::Default);
    assert_eq!(dispatcher.pending_count(), 0);
}

/// A panicking handler becomes the default outcome and does not leak the entry.
#[tokio::test]
async fn test_handler_panic_yields_default() {
    let dispatcher = Dispatcher::builder()
        .handler(BrokenHandler { panic: true })
        .build(transport::from_fn(|_| async { Ok(json!({})) }));

    let outcome = dispatcher.submit(WebhookRequest::builder("broken").build()).await;
    assert_eq!(outcome.unwrap(), HandlerOutcome::Default);

    // The dispatcher keeps working afterwards.
    let outcome = dispatcher.submit(WebhookRequest::builder("broken").build()).await;
    assert_eq!(outcome.unwrap(), HandlerOutcome::Default);
    assert_eq!(dispatcher.pending_count(), 0);
}

/// Unknown request types get the default outcome and no side effects.
#[tokio::test]
async fn test_unknown_type_uses_unhandled_handler() {
    let log = Arc::new(MemoryEventLog::new());
    let dispatcher = Dispatcher::builder()
        .handler(ServiceCallHandler::new(log.clone()))
        .build(transport::from_fn(|_| async { Ok(json!({"unexpected": 1})) }));

    let outcome = dispatcher
        .submit(WebhookRequest::builder("mystery").field("x", json!(1)).build())
        .await
        .unwrap();

    assert_eq!(outcome, HandlerOutcome::Default);
    assert!(log.is_empty());
    assert_eq!(dispatcher.pending_count(), 0);
}

/// Dropping the outcome future does not cancel the request.
#[tokio::test]
async fn test_dropped_future_still_sends() {
    let (transport, mut sends) = ManualTransport::new();
    let (handler, seen) = RecordingHandler::new("poll", false, HandlerOutcome::Default);
    let dispatcher = Dispatcher::builder()
        .handler(handler)
        .no_send_timeout()
        .build(transport);

    drop(dispatcher.submit(numbered("poll", 7)));
    let kept = dispatcher.submit(numbered("poll", 8));

    for _ in 0..2 {
        sends.recv().await.unwrap().reply.send(Ok(json!({}))).unwrap();
    }
    kept.await.unwrap();

    while seen.lock().unwrap().len() < 2 {
        tokio::task::yield_now().await;
    }
    assert_eq!(dispatcher.pending_count(), 0);
    let mut seen = seen.lock().unwrap().clone();
    seen.sort_unstable();
    assert_eq!(seen, vec![7, 8]);
}
