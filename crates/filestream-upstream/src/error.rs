//! Error types for upstream operations.

use thiserror::Error;

/// Failures reported by an upstream source.
///
/// The set is closed: every failure is one of these kinds, and callers
/// match on [`UpstreamError::kind`] rather than on message text.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The upstream asked us to back off.
    #[error("rate limited; retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds the upstream asked us to wait.
        retry_after_secs: u64,
    },

    /// The requested offset lies outside the object.
    #[error("offset {offset} is invalid for this object")]
    OffsetInvalid {
        /// The rejected byte offset.
        offset: u64,
    },

    /// The upstream answered, but not with what the protocol promises.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The connection failed (reset, broken pipe, timeout, OS-level I/O).
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Anything not covered above.
    #[error("unexpected upstream error: {0}")]
    Other(String),
}

/// Discriminant of an [`UpstreamError`], for logging and dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimit,
    OffsetInvalid,
    Protocol,
    Transport,
    Other,
}

impl UpstreamError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UpstreamError::RateLimited { .. } => ErrorKind::RateLimit,
            UpstreamError::OffsetInvalid { .. } => ErrorKind::OffsetInvalid,
            UpstreamError::Protocol(_) => ErrorKind::Protocol,
            UpstreamError::Transport(_) => ErrorKind::Transport,
            UpstreamError::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether this failure is part of normal operation (backoff signals,
    /// disconnects) rather than a sign of a bug or misconfiguration.
    pub fn is_expected(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Other)
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
            UpstreamError::Transport(std::io::Error::other(e))
        } else if e.is_decode() || e.is_status() || e.is_redirect() {
            UpstreamError::Protocol(e.to_string())
        } else {
            UpstreamError::Other(e.to_string())
        }
    }
}

/// Result alias for upstream operations.
pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;
