//! # Mora Common Library
//!
//! Shared code for the Mora services including:
//! - Error types
//! - Pipeline payload types and the session event enum
//! - Per-session event channel (replay + live fan-out)
//! - SSE helpers
//! - Configuration file and data folder resolution

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
