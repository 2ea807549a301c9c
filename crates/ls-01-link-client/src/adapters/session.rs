//! WebSocket session.
//!
//! Owns one `tokio-tungstenite` connection. The write half sits behind an
//! async mutex so only one frame is written at a time; the read half is
//! drained by a background task that hands text frames to the registered
//! [`InboundHandler`].

use crate::domain::LinkError;
use crate::ports::{InboundHandler, LinkTransport};
use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// One persistent WebSocket connection to the host.
pub struct WsSession {
    endpoint: String,
    sink: tokio::sync::Mutex<Option<WsSink>>,
    connected: Arc<AtomicBool>,
    handler: RwLock<Option<Arc<dyn InboundHandler>>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl WsSession {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            sink: tokio::sync::Mutex::new(None),
            connected: Arc::new(AtomicBool::new(false)),
            handler: RwLock::new(None),
            reader: Mutex::new(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LinkTransport for WsSession {
    async fn connect(&self) -> Result<(), LinkError> {
        // Held until the reader is in place so concurrent connects dial once.
        let mut sink = self.sink.lock().await;
        if sink.is_some() && self.is_connected() {
            return Ok(());
        }

        let (stream, _) = connect_async(self.endpoint.as_str())
            .await
            .map_err(|e| LinkError::Connect {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })?;
        let (write, mut read) = stream.split();
        if let Some(previous) = self.reader.lock().take() {
            previous.abort();
        }

        *sink = Some(write);
        self.connected.store(true, Ordering::SeqCst);
        info!(endpoint = %self.endpoint, "Link connected");

        let handler = self.handler.read().clone();
        let connected = Arc::clone(&self.connected);
        let endpoint = self.endpoint.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => match &handler {
                        Some(handler) => handler.on_message(text.as_str()),
                        None => debug!("Inbound frame with no handler registered"),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(Message::Binary(bytes)) => {
                        debug!(len = bytes.len(), "Ignoring binary frame");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(endpoint = %endpoint, error = %e, "Link read failed");
                        break;
                    }
                }
            }

            connected.store(false, Ordering::SeqCst);
            info!(endpoint = %endpoint, "Link closed");
            if let Some(handler) = &handler {
                handler.on_closed();
            }
        });
        *self.reader.lock() = Some(reader);

        Ok(())
    }

    async fn send_text(&self, text: String) -> Result<(), LinkError> {
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }

        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(LinkError::NotConnected)?;
        sink.send(Message::Text(text.into()))
            .await
            .map_err(|e| LinkError::Transport(e.to_string()))
    }

    async fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);

        if let Some(mut sink) = self.sink.lock().await.take() {
            if let Err(e) = sink.close().await {
                debug!(error = %e, "Close handshake failed");
            }
        }
        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn set_handler(&self, handler: Arc<dyn InboundHandler>) {
        *self.handler.write() = Some(handler);
    }
}
