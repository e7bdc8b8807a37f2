//! Error types for the promise library.
//!
//! `Error` doubles as the default rejection-reason type for [`crate::Promise`];
//! callers with structured failure data substitute their own reason type.

use std::time::Duration;

/// Standard error type for promise operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A blocking wait gave up before the promise settled
    #[error("timed out after {waited:?} waiting for settlement")]
    Timeout { waited: Duration },

    /// A background producer failed
    #[error("task failed: {0}")]
    Task(String),
}

impl Error {
    /// Check if this error indicates the promise may still settle later
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

/// Result type for promise operations
pub type Result<T> = std::result::Result<T, Error>;
