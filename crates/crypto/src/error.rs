//! Crypto error types.

use thiserror::Error;

/// Errors from key handling and signature parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Public key bytes do not describe a valid curve point.
    #[error("invalid public key")]
    InvalidPublicKey,

    /// Signature bytes have the wrong length.
    #[error("invalid signature length: expected 64, got {0}")]
    InvalidSignatureLength(usize),

    /// Key or signature hex string failed to parse.
    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),
}
