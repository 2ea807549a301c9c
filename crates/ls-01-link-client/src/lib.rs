//! LS-01 Link Client - correlated request/response over one WebSocket.
//!
//! Every outbound call is an [`Envelope`](shared_types::Envelope) carrying a
//! fresh message id. The host answers asynchronously with a
//! [`Reply`](shared_types::Reply) naming that id; replies can arrive in any
//! order and are matched back to the waiting caller through the pending-call
//! table.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    LINK CLIENT (ls-01)                    │
//! ├──────────────────────────────────────────────────────────┤
//! │  import_texture  add_node  get_node  add_component  ...   │
//! │                         │                                 │
//! │  ┌──────────────────────┴───────────────────────┐         │
//! │  │              Pending Call Store              │         │
//! │  │  message id → oneshot sender (+ deadline)    │         │
//! │  └──────────────────────┬───────────────────────┘         │
//! │                         │ send / ReplyDispatcher          │
//! │  ┌──────────────────────┴───────────────────────┐         │
//! │  │        LinkTransport (WsSession)             │         │
//! │  └──────────────────────┬───────────────────────┘         │
//! └─────────────────────────┼────────────────────────────────┘
//!                           │ text frames
//!                      remote host
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use ls_01_link_client::{LinkClient, LinkConfig};
//!
//! let client = LinkClient::websocket(LinkConfig::new("ws://localhost:8765"));
//! client.connect().await?;
//! let reply = client.get_node("Root", 1, false).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::WsSession;
pub use domain::{
    CallOutcome, ConfigError, CorrelationId, LinkConfig, LinkError, LinkRequest, LinkResult,
    NewNode, PendingCallStore, PendingStatsSnapshot, DEFAULT_CALL_TIMEOUT_MS, DEFAULT_ENDPOINT,
};
pub use ports::{InboundHandler, LinkTransport};
pub use service::LinkClient;
