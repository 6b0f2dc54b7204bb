//! Client event log collaborator.
//!
//! Handlers record diagnostic events (e.g. "Called service: light.turn_on")
//! through an [`EventLog`] handed to them at construction. Persistence is
//! someone else's job; this module ships an in-memory store and a
//! `tracing` forwarder.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default number of events kept by [`MemoryEventLog`].
pub const DEFAULT_EVENT_CAPACITY: usize = 500;

/// Kind of a client event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventCategory {
    /// A service call was acknowledged by the hub.
    ServiceCall,
    /// A push notification was received or acted on.
    Notification,
    /// A location update was sent.
    LocationUpdate,
    /// Connectivity changes and request failures.
    Networking,
    /// Settings changed locally.
    Settings,
    /// Anything else.
    Unknown,
}

/// A diagnostic event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientEvent {
    /// Human readable description.
    pub text: String,
    /// Event kind.
    #[serde(rename = "type")]
    pub category: EventCategory,
    /// Structured details.
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl ClientEvent {
    /// Create an event.
    pub fn new(text: impl Into<String>, category: EventCategory, payload: Map<String, Value>) -> Self {
        Self {
            text: text.into(),
            category,
            payload,
        }
    }
}

/// Sink for client events. Fire and forget.
pub trait EventLog: Send + Sync + 'static {
    /// Record an event.
    fn record(&self, event: ClientEvent);
}

/// Bounded in-memory event store.
///
/// Once `capacity` events are held, recording a new one drops the oldest.
#[derive(Debug)]
pub struct MemoryEventLog {
    events: Mutex<VecDeque<ClientEvent>>,
    capacity: usize,
}

impl MemoryEventLog {
    /// Create a store holding up to [`DEFAULT_EVENT_CAPACITY`] events.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a store holding up to `capacity` events (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity,
        }
    }

    /// Snapshot of the stored events, oldest first.
    pub fn events(&self) -> Vec<ClientEvent> {
        self.lock().iter().cloned().collect()
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop all stored events.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<ClientEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog for MemoryEventLog {
    fn record(&self, event: ClientEvent) {
        let mut events = self.lock();
        while events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Forwards every event to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventLog;

impl EventLog for TracingEventLog {
    fn record(&self, event: ClientEvent) {
        let ClientEvent {
            text,
            category,
            payload,
        } = event;
        let payload = Value::Object(payload);
        tracing::info!(category = ?category, payload = %payload, "{}", text);
    }
}
