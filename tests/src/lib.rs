//! # Link-Sync Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support.rs        # WebSocket server in front of a SimulatedHost
//! └── integration/      # Cross-crate flows
//!     ├── link_flows.rs     # correlation, timeouts, connection loss
//!     ├── scene_flows.rs    # construct/refresh against the wire
//!     └── folder_sync.rs    # image folder to scene, whole runtime
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ls-tests
//! cargo test -p ls-tests integration::folder_sync
//! ```

pub mod integration;
pub mod support;
