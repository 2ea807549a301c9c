//! Link client service.
//!
//! Multiplexes any number of concurrent calls over one transport. Each call
//! gets its own correlation ID and suspends until its reply, its timeout, or
//! the loss of the connection, whichever comes first.

use crate::adapters::WsSession;
use crate::domain::{
    CallOutcome, CorrelationId, LinkConfig, LinkError, LinkRequest, NewNode, PendingCallStore,
    PendingStatsSnapshot,
};
use crate::ports::{InboundHandler, LinkTransport};
use serde_json::{Map, Value};
use shared_types::{Envelope, MemberPatch, OperationTag, Reply};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Routes inbound frames into the pending table.
struct ReplyDispatcher {
    pending: Arc<PendingCallStore>,
}

impl InboundHandler for ReplyDispatcher {
    fn on_message(&self, text: &str) {
        let reply = match Reply::parse(text) {
            Ok(reply) => reply,
            Err(e) => {
                self.pending.record_discarded();
                warn!(error = %e, "Dropping malformed inbound message");
                return;
            }
        };

        match CorrelationId::parse(&reply.source_message_id) {
            Ok(id) => {
                self.pending.complete(id, reply);
            }
            Err(_) => {
                self.pending.record_discarded();
                warn!(
                    source_message_id = %reply.source_message_id,
                    "Dropping reply with foreign message id"
                );
            }
        }
    }

    fn on_closed(&self) {
        let failed = self.pending.fail_all();
        if failed > 0 {
            warn!(failed, "Connection lost with calls in flight");
        }
    }
}

/// Removes the pending entry if the caller stops waiting early.
struct CallGuard<'a> {
    pending: &'a PendingCallStore,
    id: CorrelationId,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.pending.cancel(&self.id);
    }
}

/// Correlated request/response client.
pub struct LinkClient {
    transport: Arc<dyn LinkTransport>,
    pending: Arc<PendingCallStore>,
    config: LinkConfig,
}

impl LinkClient {
    /// Build a client over any transport and register its reply dispatcher.
    pub fn new(transport: Arc<dyn LinkTransport>, config: LinkConfig) -> Self {
        let pending = Arc::new(PendingCallStore::new(config.call_timeout()));
        transport.set_handler(Arc::new(ReplyDispatcher {
            pending: Arc::clone(&pending),
        }));

        Self {
            transport,
            pending,
            config,
        }
    }

    /// Client over a WebSocket session to `config.endpoint`.
    pub fn websocket(config: LinkConfig) -> Self {
        let session = Arc::new(WsSession::new(config.endpoint.clone()));
        Self::new(session, config)
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub async fn connect(&self) -> Result<(), LinkError> {
        self.transport.connect().await
    }

    /// Close the connection and fail anything still waiting.
    pub async fn close(&self) {
        self.transport.close().await;
        self.pending.fail_all();
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.pending_count()
    }

    pub fn stats(&self) -> PendingStatsSnapshot {
        self.pending.stats()
    }

    /// Send one call and wait for its reply.
    ///
    /// A reply with `success: false` is returned as `Ok`; only link failures
    /// (not connected, send failure, timeout, connection loss) are errors.
    pub async fn call(
        &self,
        operation: OperationTag,
        payload: Map<String, Value>,
    ) -> Result<Reply, LinkError> {
        if !self.transport.is_connected() {
            return Err(LinkError::NotConnected);
        }

        let (id, mut rx) = self.pending.register(operation);
        let _guard = CallGuard {
            pending: &self.pending,
            id,
        };

        let text = Envelope::new(operation, id.to_string(), payload).to_text()?;
        self.transport.send_text(text).await?;
        debug!(correlation_id = %id, operation = %operation, "Sent call");

        let timeout = self.pending.timeout();
        match tokio::time::timeout(timeout, &mut rx).await {
            Ok(received) => flatten(received),
            Err(_) if self.pending.expire(&id) => Err(LinkError::Timeout {
                operation,
                timeout_ms: timeout.as_millis() as u64,
            }),
            // The reply won the race against the timer.
            Err(_) => flatten(rx.await),
        }
    }

    /// Send a typed request.
    pub async fn request(&self, request: LinkRequest) -> Result<Reply, LinkError> {
        let operation = request.operation();
        self.call(operation, request.into_payload()?).await
    }

    /// Upload a local image file. A successful reply carries `assetURL`.
    pub async fn import_texture(&self, file_path: &Path) -> Result<Reply, LinkError> {
        self.request(LinkRequest::ImportTexture {
            file_path: file_path.to_path_buf(),
        })
        .await
    }

    /// Create a node. The reply does not carry the new node's id.
    pub async fn add_node(&self, node: NewNode) -> Result<Reply, LinkError> {
        self.request(LinkRequest::AddNode(node)).await
    }

    pub async fn get_node(
        &self,
        node_id: &str,
        depth: u32,
        include_components: bool,
    ) -> Result<Reply, LinkError> {
        self.request(LinkRequest::GetNode {
            node_id: node_id.to_string(),
            depth,
            include_components,
        })
        .await
    }

    pub async fn add_component(
        &self,
        node_id: &str,
        component_type: &str,
    ) -> Result<Reply, LinkError> {
        self.request(LinkRequest::AddComponent {
            node_id: node_id.to_string(),
            component_type: component_type.to_string(),
        })
        .await
    }

    pub async fn get_component(&self, component_id: &str) -> Result<Reply, LinkError> {
        self.request(LinkRequest::GetComponent {
            component_id: component_id.to_string(),
        })
        .await
    }

    pub async fn update_component(
        &self,
        component_id: &str,
        members: MemberPatch,
    ) -> Result<Reply, LinkError> {
        self.request(LinkRequest::UpdateComponent {
            component_id: component_id.to_string(),
            members,
        })
        .await
    }
}

fn flatten(received: Result<CallOutcome, oneshot::error::RecvError>) -> CallOutcome {
    received.unwrap_or(Err(LinkError::ConnectionClosed))
}
