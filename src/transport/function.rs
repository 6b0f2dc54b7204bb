//! Closure-backed transport.

use std::future::Future;
use std::sync::Arc;

use super::{RawResult, Transport};
use crate::handler::BoxFuture;
use crate::request::WebhookRequest;

/// Transport wrapping an async closure.
pub struct FnTransport<F> {
    send: F,
}

/// Build a [`Transport`] from an async closure.
pub fn from_fn<F, Fut>(send: F) -> FnTransport<F>
where
    F: Fn(Arc<WebhookRequest>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RawResult> + Send + 'static,
{
    FnTransport { send }
}

impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(Arc<WebhookRequest>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RawResult> + Send + 'static,
{
    fn send(&self, request: Arc<WebhookRequest>) -> BoxFuture<'static, RawResult> {
        Box::pin((self.send)(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::from_fn;
    use serde_json::json;

    #[tokio::test]
    async fn test_closure_transport() {
        let transport = from_fn(|request: Arc<WebhookRequest>| async move {
            Ok(json!({ "echo": request.request_type().as_str() }))
        });

        let request = Arc::new(WebhookRequest::builder("ping").build());
        assert_eq!(transport.send(request).await.unwrap(), json!({"echo": "ping"}));
    }

    #[tokio::test]
    async fn test_shared_transport() {
        let transport: Arc<dyn Transport> =
            Arc::new(from_fn(|_| async { Err(TransportError::Status(503)) }));

        let request = Arc::new(WebhookRequest::builder("ping").build());
        assert_eq!(
            transport.send(request).await,
            Err(TransportError::Status(503))
        );
    }
}
