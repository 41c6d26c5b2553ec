//! Explicit decode registry for transaction payloads.
//!
//! The registry maps wire discriminants to decoder functions and is
//! constructed at startup and passed by reference wherever generic decoding
//! is needed. There is deliberately no module-level singleton: decode paths
//! stay testable and callers can restrict or extend the accepted payload
//! set.

use crate::error::ProtoError;
use crate::wire::{transaction_body, MessageSubmit, StorageUpdateList, TransactionBody};
use prost::Message;
use std::collections::HashMap;

/// Wire discriminant of the message-submit payload.
pub const MESSAGE_SUBMIT: u32 = 10;
/// Wire discriminant of the storage-update payload.
pub const STORAGE_UPDATE: u32 = 11;

/// A transaction payload decoded through the registry.
#[derive(Clone, Debug, PartialEq)]
pub enum DecodedBody {
    /// Topic message submission.
    MessageSubmit(MessageSubmit),
    /// Contract storage update batch.
    StorageUpdate(StorageUpdateList),
}

/// Decoder for one payload discriminant, taking serialized body bytes.
pub type BodyDecoder = fn(&[u8]) -> Result<DecodedBody, ProtoError>;

/// Registry of payload decoders keyed by wire discriminant.
pub struct BodyRegistry {
    decoders: HashMap<u32, BodyDecoder>,
}

impl BodyRegistry {
    /// Registry with no decoders; payloads must be registered explicitly.
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Registry covering every payload this crate defines.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(MESSAGE_SUBMIT, decode_message_submit);
        registry.register(STORAGE_UPDATE, decode_storage_update);
        registry
    }

    /// Register (or replace) the decoder for a discriminant.
    pub fn register(&mut self, discriminant: u32, decoder: BodyDecoder) {
        self.decoders.insert(discriminant, decoder);
    }

    /// Decode the payload of serialized [`TransactionBody`] bytes.
    ///
    /// Fails if the body does not decode, carries no payload, or carries a
    /// payload no decoder is registered for.
    pub fn decode(&self, body_bytes: &[u8]) -> Result<DecodedBody, ProtoError> {
        let body = TransactionBody::decode(body_bytes)?;
        let tag = discriminant(&body).ok_or(ProtoError::UnknownDiscriminant {
            field: "TransactionBody.data",
        })?;
        let decoder = self
            .decoders
            .get(&tag)
            .ok_or(ProtoError::UnknownDiscriminant {
                field: "TransactionBody.data",
            })?;
        decoder(body_bytes)
    }
}

/// Wire discriminant of a body's payload, if one is set.
pub fn discriminant(body: &TransactionBody) -> Option<u32> {
    match body.data {
        Some(transaction_body::Data::MessageSubmit(_)) => Some(MESSAGE_SUBMIT),
        Some(transaction_body::Data::StorageUpdate(_)) => Some(STORAGE_UPDATE),
        None => None,
    }
}

fn decode_message_submit(body_bytes: &[u8]) -> Result<DecodedBody, ProtoError> {
    match TransactionBody::decode(body_bytes)?.data {
        Some(transaction_body::Data::MessageSubmit(msg)) => Ok(DecodedBody::MessageSubmit(msg)),
        _ => Err(ProtoError::UnknownDiscriminant {
            field: "TransactionBody.data",
        }),
    }
}

fn decode_storage_update(body_bytes: &[u8]) -> Result<DecodedBody, ProtoError> {
    match TransactionBody::decode(body_bytes)?.data {
        Some(transaction_body::Data::StorageUpdate(list)) => Ok(DecodedBody::StorageUpdate(list)),
        _ => Err(ProtoError::UnknownDiscriminant {
            field: "TransactionBody.data",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{AccountId, RequestId, Timestamp, TopicId};

    fn submit_body() -> TransactionBody {
        TransactionBody {
            request_id: Some(RequestId::new(AccountId::new(2), Timestamp::new(50, 0))),
            node_id: 1,
            fee_limit: 0,
            memo: String::new(),
            data: Some(transaction_body::Data::MessageSubmit(MessageSubmit {
                topic: Some(TopicId::new(9)),
                message: b"m".to_vec(),
                chunk_index: 0,
                chunk_total: 1,
            })),
        }
    }

    #[test]
    fn test_standard_registry_decodes_submit() {
        let registry = BodyRegistry::standard();
        let bytes = submit_body().encode_to_vec();
        match registry.decode(&bytes).expect("registered payload") {
            DecodedBody::MessageSubmit(msg) => assert_eq!(msg.message, b"m".to_vec()),
            other => panic!("wrong payload: {other:?}"),
        }
    }

    #[test]
    fn test_empty_registry_rejects() {
        let registry = BodyRegistry::empty();
        let bytes = submit_body().encode_to_vec();
        assert!(matches!(
            registry.decode(&bytes),
            Err(ProtoError::UnknownDiscriminant { .. })
        ));
    }

    #[test]
    fn test_missing_payload_rejected() {
        let mut body = submit_body();
        body.data = None;
        let registry = BodyRegistry::standard();
        assert!(matches!(
            registry.decode(&body.encode_to_vec()),
            Err(ProtoError::UnknownDiscriminant { .. })
        ));
    }
}
