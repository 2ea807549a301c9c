//! Ports for the link client.

pub mod outbound;

pub use outbound::{InboundHandler, LinkTransport};
