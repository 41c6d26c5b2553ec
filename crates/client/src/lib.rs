//! Request execution engine for the Meridian ledger network.
//!
//! This crate drives signed transactions and queries through a pool of
//! network nodes: it freezes and signs requests, selects a live node per
//! attempt, transmits under a deadline, classifies the response, retries
//! transient node failures elsewhere, splits oversized payloads into
//! redundantly addressed chunks, and joins the per-chunk results.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

pub mod aggregate;
pub mod channel;
pub mod chunker;
pub mod codec;
pub mod mirror;
pub mod query;

mod client;
mod config;
mod error;
mod executable;
mod node;
mod pool;
mod transaction;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use executable::{
    classify, effective_deadline, Executable, ExecutionOutcome, StatusClass,
};
pub use node::Node;
pub use pool::{AttemptOutcome, NodePool, TransportKind};
pub use transaction::{
    ChunkResponse, FrozenChunk, FrozenTransaction, SignatureSlot, SignerSet, TransactionBuilder,
    TransactionData, TransactionOutcome,
};
