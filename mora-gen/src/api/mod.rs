//! HTTP API handlers for mora-gen
//!
//! REST for session creation and snapshots, SSE for progress streaming.

pub mod health;
pub mod session;
pub mod sse;

pub use health::health_routes;
pub use session::session_routes;
pub use sse::session_event_stream;
