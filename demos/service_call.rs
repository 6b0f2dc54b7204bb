//! Service call demo - submit a burst of webhook requests.
//!
//! This example demonstrates:
//! - Building a dispatcher with the service call handler
//! - A stand-in transport that prints the webhook body it would POST
//! - Unknown request types falling back to the default outcome
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=webhook_dispatch=debug cargo run --example service_call
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing_subscriber::EnvFilter;
use webhook_dispatch::event_log::{EventLog, MemoryEventLog, TracingEventLog};
use webhook_dispatch::handler::ServiceCallHandler;
use webhook_dispatch::transport::{self, RawResult};
use webhook_dispatch::{Dispatcher, RequestType, TransportError, WebhookRequest};

/// Records into memory and mirrors to the log output.
struct DemoLog {
    memory: MemoryEventLog,
}

impl EventLog for DemoLog {
    fn record(&self, event: webhook_dispatch::event_log::ClientEvent) {
        TracingEventLog.record(event.clone());
        self.memory.record(event);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let log = Arc::new(DemoLog {
        memory: MemoryEventLog::new(),
    });

    let dispatcher = Dispatcher::builder()
        .handler(ServiceCallHandler::new(log.clone()))
        .send_timeout(Duration::from_secs(2))
        .build(transport::from_fn(|request| async move {
            let body = request
                .to_body()
                .map_err(|e| TransportError::Network(e.to_string()))?;
            eprintln!("POST /api/webhook/<id> {}", String::from_utf8_lossy(&body));
            tokio::time::sleep(Duration::from_millis(20)).await;
            RawResult::Ok(json!({}))
        }));

    let calls = [("light", "turn_on"), ("switch", "toggle"), ("scene", "turn_on")];
    let futures: Vec<_> = calls
        .iter()
        .map(|(domain, service)| {
            dispatcher.submit(
                WebhookRequest::builder(RequestType::SERVICE_CALL)
                    .field("domain", json!(domain))
                    .field("service", json!(service))
                    .field("service_data", json!({"entity_id": format!("{}.demo", domain)}))
                    .build(),
            )
        })
        .collect();

    let unknown = dispatcher.submit(WebhookRequest::builder("get_zones").build());

    for future in futures {
        eprintln!("service call outcome: {:?}", future.await?);
    }
    eprintln!("get_zones outcome: {:?}", unknown.await?);

    for event in log.memory.events() {
        eprintln!("event: {}", event.text);
    }

    Ok(())
}
