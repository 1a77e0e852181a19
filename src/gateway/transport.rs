//! Message transport contract and implementations.

use anyhow::Result;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::sync::mpsc;

/// At-least-once message channel between the gateway and its clients.
///
/// `poll` returns `Ok(None)` on timeout so the caller can keep its loop
/// alive without blocking forever. Published responses are not considered
/// delivered until `flush` returns; duplicate delivery is the client's
/// problem, reordering is prevented by the gateway only ever having one
/// response in flight.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Wait up to `timeout` for the next inbound payload.
    async fn poll(&self, timeout: Duration) -> Result<Option<Vec<u8>>>;

    /// Publish one response payload.
    async fn publish(&self, payload: &[u8]) -> Result<()>;

    /// Block until previously published payloads are on the wire.
    async fn flush(&self) -> Result<()>;
}

/// Datagram transport: requests arrive on the bound socket, responses go to
/// the fixed respond address. Datagrams leave on send, so `flush` is a
/// no-op.
pub struct UdpTransport {
    socket: UdpSocket,
    respond_to: SocketAddr,
}

impl UdpTransport {
    pub async fn bind(bind_addr: SocketAddr, respond_to: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(bind_addr).await?;
        Ok(UdpTransport { socket, respond_to })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn poll(&self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; 65536];
        match tokio::time::timeout(timeout, self.socket.recv_from(&mut buf)).await {
            Err(_) => Ok(None),
            Ok(Err(e)) => Err(e.into()),
            Ok(Ok((len, src))) => {
                tracing::debug!("Received {} bytes from {}", len, src);
                buf.truncate(len);
                Ok(Some(buf))
            }
        }
    }

    async fn publish(&self, payload: &[u8]) -> Result<()> {
        let sent = self.socket.send_to(payload, self.respond_to).await?;
        if sent != payload.len() {
            anyhow::bail!("short datagram write: {} of {} bytes", sent, payload.len());
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// In-process transport over tokio channels, for tests and local mode.
pub struct ChannelTransport {
    requests: Mutex<mpsc::Receiver<Vec<u8>>>,
    responses: mpsc::Sender<Vec<u8>>,
}

impl ChannelTransport {
    /// Returns the transport plus the client-side handles: the request
    /// sender and the response receiver.
    pub fn new(capacity: usize) -> (Self, mpsc::Sender<Vec<u8>>, mpsc::Receiver<Vec<u8>>) {
        let (request_tx, request_rx) = mpsc::channel(capacity);
        let (response_tx, response_rx) = mpsc::channel(capacity);
        let transport = ChannelTransport {
            requests: Mutex::new(request_rx),
            responses: response_tx,
        };
        (transport, request_tx, response_rx)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn poll(&self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        let mut requests = self.requests.lock().await;
        match tokio::time::timeout(timeout, requests.recv()).await {
            Err(_) => Ok(None),
            Ok(Some(payload)) => Ok(Some(payload)),
            Ok(None) => Err(anyhow::anyhow!("request channel closed")),
        }
    }

    async fn publish(&self, payload: &[u8]) -> Result<()> {
        self.responses
            .send(payload.to_vec())
            .await
            .map_err(|_| anyhow::anyhow!("response channel closed"))
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}
