//! The poll loop.

use crate::dispatch::RequestDispatcher;
use crate::dispatch::protocol::RequestEnvelope;
use crate::gateway::transport::Transport;
use std::time::Duration;

/// Bounded poll keeps the loop responsive without busy-waiting when the
/// request topic is idle.
const POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// Single-threaded request loop over one transport.
///
/// Exactly one request is in flight at a time: the loop does not poll again
/// until the previous response has been published and flushed. Malformed
/// payloads and transport errors are logged and skipped; only decoded
/// requests are owed a response.
pub struct Gateway<T: Transport> {
    transport: T,
    dispatcher: RequestDispatcher,
    poll_timeout: Duration,
}

impl<T: Transport> Gateway<T> {
    pub fn new(transport: T, dispatcher: RequestDispatcher) -> Self {
        Gateway {
            transport,
            dispatcher,
            poll_timeout: POLL_TIMEOUT,
        }
    }

    /// Mainly for tests, where waiting out the full poll timeout on an idle
    /// transport would be wasted time.
    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    /// Serve forever.
    pub async fn run(&self) {
        tracing::info!("Gateway serving, poll timeout {:?}", self.poll_timeout);
        loop {
            self.step().await;
        }
    }

    /// One poll cycle: at most one request received, dispatched and
    /// answered.
    pub async fn step(&self) {
        let payload = match self.transport.poll(self.poll_timeout).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("Transport poll failed: {}", e);
                return;
            }
        };

        let request: RequestEnvelope = match serde_json::from_slice(&payload) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("Discarding malformed request payload: {}", e);
                return;
            }
        };

        tracing::info!(
            "Request {} received (action {}, index {})",
            request.request_id,
            request.action,
            request.index_id
        );
        let response = self.dispatcher.process(request).await;

        let encoded = match serde_json::to_vec(&response) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::error!("Failed to encode response for {}: {}", response.request_id, e);
                return;
            }
        };
        if let Err(e) = self.transport.publish(&encoded).await {
            tracing::error!("Failed to publish response for {}: {}", response.request_id, e);
            return;
        }
        if let Err(e) = self.transport.flush().await {
            tracing::error!("Failed to flush response for {}: {}", response.request_id, e);
        }
    }
}
