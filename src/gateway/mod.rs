//! Gateway Module
//!
//! The single-threaded front door of the node. The gateway owns the request
//! topic: it polls the transport with a bounded timeout, decodes one
//! request, hands it to the dispatcher, and publishes the response before
//! polling again.
//!
//! ## Core Mechanisms
//! - **Bounded poll**: A timeout on every receive keeps the loop alive
//!   through idle periods and transport hiccups without busy-waiting.
//! - **One in flight**: The next poll only happens after the previous
//!   response is published and flushed, so responses come back in request
//!   order.
//! - **Malformed payloads**: Logged and discarded without a response; only
//!   decoded requests are owed one.
//! - **Transport seam**: A small at-least-once pub/sub contract with a
//!   datagram implementation for deployment and a channel one for tests.

pub mod gateway;
pub mod transport;

pub use gateway::Gateway;
pub use transport::{ChannelTransport, Transport, UdpTransport};

#[cfg(test)]
mod tests;
