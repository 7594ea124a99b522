//! HTTP server for room management and signaling
//!
//! Exposes the room endpoints, the signaling WebSocket, health checks and
//! metrics.

pub mod shared;
pub use shared::SharedState;

pub mod http_server;
pub use http_server::{build_router, run_http_server};
