//! Wire schema types for the Meridian ledger client SDK.
//!
//! This crate carries the protobuf message definitions exchanged with
//! consensus nodes, maintained as checked-in `prost` types the same way
//! downstream consumers ship generated schema code. Messages here are a
//! faithful mirror of the network schema: encoding a body and decoding a
//! response is all this crate does; request execution lives in
//! `meridian-client`.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

pub mod ids;
pub mod registry;
pub mod storage;
pub mod wire;

mod error;

pub use error::ProtoError;
pub use ids::{AccountId, ContractId, NodeId, RequestId, Timestamp, TopicId};
pub use registry::{BodyRegistry, DecodedBody};
pub use storage::{MappingKey, StorageWrite};
pub use wire::{
    MessageSubmit, Query, QueryResponse, Receipt, ReceiptQuery, ResponseStatus, SignatureMap,
    SignaturePair, SignedTransaction, StorageUpdateList, TransactionBody, TransactionResponse,
};
