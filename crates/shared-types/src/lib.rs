//! # Shared Types Crate
//!
//! Wire model for the scene link. Every JSON document that crosses the socket
//! is described here, so the RPC client, the scene builder and the test
//! doubles agree on one shape.
//!
//! ## Design Principles
//!
//! - **Self-describing frames**: each text frame is one JSON document whose
//!   `$type` names the operation (outbound) or the reply kind (inbound).
//! - **Correlation by id**: the transport has no request ids of its own; the
//!   outbound `messageId` is echoed back as `sourceMessageId`.
//! - **Tagged members**: component members are a tagged union of scalar field,
//!   reference, and collection, each carrying its own identifier.

pub mod envelope;
pub mod scene;
pub mod updates;

pub use envelope::{Envelope, OperationTag, Reply};
pub use scene::{Float3, Member, RemoteComponent, RemoteNode, ROOT_NODE_ID};
pub use updates::{ElementUpdate, MemberPatch, MemberUpdate};
