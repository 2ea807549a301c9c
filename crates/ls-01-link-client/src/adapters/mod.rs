//! Adapters implementing the transport port.

pub mod session;

pub use session::WsSession;
