//! Ledger entity identifiers and request identity.

use std::fmt;

/// Ledger account identifier (entity number).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Message)]
pub struct AccountId {
    /// Ledger-assigned entity number.
    #[prost(uint64, tag = "1")]
    pub num: u64,
}

impl AccountId {
    /// Create an account id from an entity number.
    pub const fn new(num: u64) -> Self {
        Self { num }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.num)
    }
}

/// Consensus topic identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct TopicId {
    /// Ledger-assigned entity number.
    #[prost(uint64, tag = "1")]
    pub num: u64,
}

impl TopicId {
    /// Create a topic id from an entity number.
    pub const fn new(num: u64) -> Self {
        Self { num }
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.num)
    }
}

/// Smart contract identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ContractId {
    /// Ledger-assigned entity number.
    #[prost(uint64, tag = "1")]
    pub num: u64,
}

impl ContractId {
    /// Create a contract id from an entity number.
    pub const fn new(num: u64) -> Self {
        Self { num }
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.num)
    }
}

/// Ledger-assigned identity of a network node.
///
/// Distinct from the node's socket address: the id is embedded in every
/// transaction body addressed to that node and is part of the signed bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Wall-clock instant with nanosecond precision.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Message)]
pub struct Timestamp {
    /// Seconds since the unix epoch.
    #[prost(int64, tag = "1")]
    pub seconds: i64,
    /// Sub-second nanoseconds.
    #[prost(int32, tag = "2")]
    pub nanos: i32,
}

impl Timestamp {
    /// Create a timestamp from seconds and nanoseconds.
    pub const fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

/// Unique identity of one logical request.
///
/// Chunked requests share the payer and valid-start and differ only by the
/// nonce, which increments per chunk so a receiving node can validate chunk
/// order without external coordination.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct RequestId {
    /// Account paying for the request.
    #[prost(message, optional, tag = "1")]
    pub payer: Option<AccountId>,
    /// Earliest instant at which the request is valid.
    #[prost(message, optional, tag = "2")]
    pub valid_start: Option<Timestamp>,
    /// Chunk nonce; zero for unchunked requests and for the first chunk.
    #[prost(uint32, tag = "3")]
    pub nonce: u32,
}

impl RequestId {
    /// Create a request id with a zero nonce.
    pub fn new(payer: AccountId, valid_start: Timestamp) -> Self {
        Self {
            payer: Some(payer),
            valid_start: Some(valid_start),
            nonce: 0,
        }
    }

    /// Derive the id for a given chunk index.
    pub fn with_nonce(&self, nonce: u32) -> Self {
        Self {
            nonce,
            ..self.clone()
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.payer, &self.valid_start) {
            (Some(payer), Some(start)) => write!(f, "{payer}@{start}#{}", self.nonce),
            _ => write!(f, "<incomplete>#{}", self.nonce),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_display() {
        let id = RequestId::new(AccountId::new(1001), Timestamp::new(1700000000, 42));
        assert_eq!(id.to_string(), "1001@1700000000.000000042#0");
    }

    #[test]
    fn test_with_nonce_preserves_identity() {
        let id = RequestId::new(AccountId::new(7), Timestamp::new(100, 0));
        let chunked = id.with_nonce(3);
        assert_eq!(chunked.payer, id.payer);
        assert_eq!(chunked.valid_start, id.valid_start);
        assert_eq!(chunked.nonce, 3);
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId(5).to_string(), "node-5");
    }
}
