//! Outbound ports for the link client.
//!
//! The client only needs a way to push text frames and to be told about
//! inbound frames; the WebSocket session and the loopback test transport both
//! implement these traits.

use crate::domain::LinkError;
use async_trait::async_trait;
use std::sync::Arc;

/// Receives every inbound text frame of a session.
pub trait InboundHandler: Send + Sync {
    /// One inbound text frame.
    fn on_message(&self, text: &str);

    /// The connection ended. Called at most once per connection.
    fn on_closed(&self);
}

/// A persistent, message-oriented duplex connection.
///
/// No buffering and no retry: once the connection drops, sends fail until a
/// fresh `connect()` succeeds.
#[async_trait]
pub trait LinkTransport: Send + Sync {
    /// Open the connection. Fails fast if the attempt errors before opening.
    async fn connect(&self) -> Result<(), LinkError>;

    /// Send one text frame. Fails with `NotConnected` when no connection is open.
    async fn send_text(&self, text: String) -> Result<(), LinkError>;

    /// Close the connection. Idempotent; safe when never connected.
    async fn close(&self);

    fn is_connected(&self) -> bool;

    /// Register the single inbound handler. Replaces any previous one.
    fn set_handler(&self, handler: Arc<dyn InboundHandler>);
}
