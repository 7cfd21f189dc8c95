//! Centralized error types for shared service plumbing.
//!
//! Outbound HTTP failures are classified into a small set of variants so that
//! services can map them onto their own response codes without inspecting
//! `reqwest` internals.

use thiserror::Error;

/// Common error type for platform operations.
///
/// All errors are classified as either retryable or non-retryable. Services
/// are free to ignore the classification; a pass-through proxy does.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    /// Remote service could not be reached or dropped the connection
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Timeout occurred
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlatformError {
    /// Check if this error is retryable.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_common::PlatformError;
    ///
    /// let err = PlatformError::Timeout("idp".to_string());
    /// assert!(err.is_retryable());
    ///
    /// let err = PlatformError::invalid_input("header");
    /// assert!(!err.is_retryable());
    /// ```
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }

    /// Create an unavailable error with the given message.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create an invalid input error with the given message.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Classify a `reqwest` transport error.
    ///
    /// Timeouts map to [`PlatformError::Timeout`]; connect, request and body
    /// failures map to [`PlatformError::Unavailable`]. Builder errors are
    /// treated as invalid input because they stem from a malformed request.
    #[must_use]
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_builder() {
            Self::InvalidInput(err.to_string())
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}
