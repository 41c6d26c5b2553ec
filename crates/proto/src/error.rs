//! Schema-level decode errors.

use thiserror::Error;

/// Errors raised while mapping wire messages to domain values.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// A required message field was absent.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A tagged union carried no known discriminant.
    #[error("unknown discriminant for `{field}`")]
    UnknownDiscriminant {
        /// The oneof field that failed to decode.
        field: &'static str,
    },

    /// The response status value is outside the known enumeration.
    #[error("unrecognized response status code {0}")]
    UnknownStatus(i32),

    /// Protobuf decoding failed.
    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),
}
