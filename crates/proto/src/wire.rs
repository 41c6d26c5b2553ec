//! Request and response messages exchanged with consensus nodes.

use crate::error::ProtoError;
use crate::ids::{ContractId, RequestId, TopicId};
use crate::storage::StorageUpdate;

/// Status code returned by a node for a transaction or query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ResponseStatus {
    /// Placeholder for an unset status field.
    Unknown = 0,
    /// The request passed precheck and was accepted.
    Ok = 1,
    /// The node is overloaded and rejected the request.
    Busy = 2,
    /// The node cannot currently reach the rest of the network.
    PlatformUnavailable = 3,
    /// The request body failed validation.
    InvalidRequest = 4,
    /// A request with this identity was already submitted.
    DuplicateRequest = 5,
    /// The offered fee does not cover the request.
    InsufficientFee = 6,
    /// A referenced entity does not exist.
    EntityNotFound = 7,
    /// The receipt for the request is not yet available.
    ReceiptNotReady = 8,
    /// The request's valid-start window has passed.
    RequestExpired = 9,
}

/// Message submission to a consensus topic.
///
/// Oversized messages are split into chunks; every chunk repeats the topic
/// and carries its position so nodes can reassemble in order.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MessageSubmit {
    /// Target topic.
    #[prost(message, optional, tag = "1")]
    pub topic: Option<TopicId>,
    /// Message bytes for this chunk.
    #[prost(bytes = "vec", tag = "2")]
    pub message: Vec<u8>,
    /// Zero-based index of this chunk.
    #[prost(uint32, tag = "3")]
    pub chunk_index: u32,
    /// Total number of chunks in the logical message.
    #[prost(uint32, tag = "4")]
    pub chunk_total: u32,
}

/// Batch of contract storage updates.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StorageUpdateList {
    /// Contract whose storage is updated.
    #[prost(message, optional, tag = "1")]
    pub contract: Option<ContractId>,
    /// Updates applied in order.
    #[prost(message, repeated, tag = "2")]
    pub updates: Vec<StorageUpdate>,
}

/// The signed portion of a transaction.
///
/// `node_id` binds the body to one specific node: the same logical payload
/// produces different bytes (and therefore different signatures) per
/// targeted node.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionBody {
    /// Request identity (payer, valid-start, chunk nonce).
    #[prost(message, optional, tag = "1")]
    pub request_id: Option<RequestId>,
    /// Ledger-assigned id of the node this body is addressed to.
    #[prost(uint64, tag = "2")]
    pub node_id: u64,
    /// Maximum fee the payer will accept, in base units.
    #[prost(uint64, tag = "3")]
    pub fee_limit: u64,
    /// Free-form memo carried with the transaction.
    #[prost(string, tag = "4")]
    pub memo: String,
    /// The operation payload.
    #[prost(oneof = "transaction_body::Data", tags = "10, 11")]
    pub data: Option<transaction_body::Data>,
}

/// Nested types for [`TransactionBody`].
pub mod transaction_body {
    /// Operation payload variants.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Data {
        /// Topic message submission (chunkable).
        #[prost(message, tag = "10")]
        MessageSubmit(super::MessageSubmit),
        /// Contract storage update batch.
        #[prost(message, tag = "11")]
        StorageUpdate(super::StorageUpdateList),
    }
}

/// One signature over a transaction body.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignaturePair {
    /// Prefix of the signing public key, used to match key to signature.
    #[prost(bytes = "vec", tag = "1")]
    pub public_key_prefix: Vec<u8>,
    /// Ed25519 signature bytes.
    #[prost(bytes = "vec", tag = "2")]
    pub ed25519: Vec<u8>,
}

/// All signatures collected for one transaction body.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignatureMap {
    /// Signature pairs in the order they were added.
    #[prost(message, repeated, tag = "1")]
    pub pairs: Vec<SignaturePair>,
}

/// Wire envelope submitted to a node: frozen body bytes plus signatures.
///
/// The body travels as opaque bytes so the signed bytes are exactly the
/// transmitted bytes; re-encoding on the receiving side cannot disturb the
/// signature check.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignedTransaction {
    /// Serialized [`TransactionBody`].
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    /// Signatures over `body_bytes`.
    #[prost(message, optional, tag = "2")]
    pub signature_map: Option<SignatureMap>,
}

/// Node response to a submitted transaction.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionResponse {
    /// Precheck status.
    #[prost(int32, tag = "1")]
    pub status: i32,
    /// Node's fee estimate for the request, in base units.
    #[prost(uint64, tag = "2")]
    pub cost: u64,
}

impl TransactionResponse {
    /// Typed status accessor; unknown codes are a decode error.
    pub fn status(&self) -> Result<ResponseStatus, ProtoError> {
        ResponseStatus::try_from(self.status).map_err(|_| ProtoError::UnknownStatus(self.status))
    }
}

/// Receipt lookup for a previously submitted request.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReceiptQuery {
    /// Identity of the request whose receipt is wanted.
    #[prost(message, optional, tag = "1")]
    pub request_id: Option<RequestId>,
}

/// Final disposition of a request after consensus.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Receipt {
    /// Consensus-level status.
    #[prost(int32, tag = "1")]
    pub status: i32,
    /// Sequence number assigned to a submitted topic message chunk.
    #[prost(uint64, tag = "2")]
    pub topic_sequence_number: u64,
}

impl Receipt {
    /// Typed status accessor; unknown codes are a decode error.
    pub fn status(&self) -> Result<ResponseStatus, ProtoError> {
        ResponseStatus::try_from(self.status).map_err(|_| ProtoError::UnknownStatus(self.status))
    }
}

/// Query envelope submitted to a node.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Query {
    /// Query payload.
    #[prost(oneof = "query::Kind", tags = "1")]
    pub kind: Option<query::Kind>,
}

/// Nested types for [`Query`].
pub mod query {
    /// Query payload variants.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        /// Receipt lookup.
        #[prost(message, tag = "1")]
        Receipt(super::ReceiptQuery),
    }
}

/// Node response to a query.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryResponse {
    /// Precheck status for the query itself.
    #[prost(int32, tag = "1")]
    pub status: i32,
    /// Response payload.
    #[prost(oneof = "query_response::Kind", tags = "2")]
    pub kind: Option<query_response::Kind>,
}

impl QueryResponse {
    /// Typed status accessor; unknown codes are a decode error.
    pub fn status(&self) -> Result<ResponseStatus, ProtoError> {
        ResponseStatus::try_from(self.status).map_err(|_| ProtoError::UnknownStatus(self.status))
    }
}

/// Nested types for [`QueryResponse`].
pub mod query_response {
    /// Response payload variants.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        /// Receipt lookup result.
        #[prost(message, tag = "2")]
        Receipt(super::Receipt),
    }
}
