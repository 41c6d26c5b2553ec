//! Error types for the execution engine.

use meridian_crypto::CryptoError;
use meridian_proto::{ProtoError, ResponseStatus};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Engine error categories.
#[derive(Debug, Error)]
pub enum Error {
    // === Business errors (never retried) ===
    /// The network rejected the request itself.
    #[error("request rejected with status {status:?}")]
    Status {
        /// Status returned by the node.
        status: ResponseStatus,
    },

    /// A mirror endpoint rejected the request.
    #[error("mirror rejected request (http {code}): {message}")]
    MirrorRejected {
        /// HTTP status code.
        code: u16,
        /// Response body, if any.
        message: String,
    },

    // === Node-transient errors (trigger backoff + retry elsewhere) ===
    /// Framing, connection, or decoding failure on the node channel.
    #[error("transport error: {0}")]
    Transport(String),

    /// A mirror endpoint is temporarily unavailable.
    #[error("mirror unavailable (http {code})")]
    MirrorUnavailable {
        /// HTTP status code.
        code: u16,
    },

    /// The per-attempt deadline expired before the node answered.
    #[error("attempt deadline of {deadline:?} exceeded")]
    DeadlineExceeded {
        /// The effective per-attempt deadline.
        deadline: Duration,
    },

    /// I/O failure while talking to a node.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    // === Terminal engine errors ===
    /// The retry loop's own bound was hit, distinct from any node failure.
    #[error("retry budget exhausted after {attempts} attempts over {elapsed:?}")]
    AttemptsExhausted {
        /// Attempts made before giving up.
        attempts: u32,
        /// Wall-clock time since the first attempt.
        elapsed: Duration,
        /// The failure observed on the final attempt, if any.
        last: Option<Box<Error>>,
    },

    /// Every candidate node is excluded or unhealthy.
    #[error("no healthy node available")]
    NoHealthyNode,

    /// The chunk plan exceeds the configured maximum.
    #[error("request of {chunks} chunks exceeds maximum of {max_chunks}")]
    RequestTooLarge {
        /// Chunks the request would need.
        chunks: usize,
        /// Configured ceiling.
        max_chunks: usize,
    },

    /// The client was shut down while the call was in flight.
    #[error("request cancelled by client shutdown")]
    Cancelled,

    // === Local errors ===
    /// The request is in the wrong state for the operation.
    #[error("invalid request state: {0}")]
    State(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Wire schema decode failure.
    #[error("decode error: {0}")]
    Decode(#[from] ProtoError),

    /// Key or signature handling failure.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl Error {
    /// Create a transport error.
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport(reason.into())
    }

    /// Create a request-state error.
    pub fn state(reason: impl Into<String>) -> Self {
        Self::State(reason.into())
    }

    /// Whether the failure indicts the chosen node rather than the request.
    ///
    /// Transient failures are recorded against the node and the call moves
    /// on to a different one. Decode failures count: a malformed response
    /// is the node's fault until it recurs across the whole pool, at which
    /// point the retry bound surfaces it.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::MirrorUnavailable { .. }
                | Self::DeadlineExceeded { .. }
                | Self::Io(_)
                | Self::Decode(_)
        )
    }
}
