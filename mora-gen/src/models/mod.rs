//! Data models for mora-gen

pub mod session;

pub use session::{Session, SessionError, SessionSnapshot, SessionStatus};
