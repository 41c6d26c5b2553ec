//! Transaction building, freezing, and multi-node signing.
//!
//! A request is mutable only as a [`TransactionBuilder`]. The one-way
//! [`TransactionBuilder::freeze`] conversion computes the chunk plan and the
//! per-node body matrix and yields a [`FrozenTransaction`], whose
//! wire-affecting fields cannot be touched again: mutation after freeze is
//! a type error, not a runtime check. Signatures accumulate on the frozen
//! value.

use crate::channel::{WireRequest, WireResponse};
use crate::chunker;
use crate::client::Client;
use crate::error::{Error, Result};
use crate::executable::{classify, Executable, ExecutionOutcome, StatusClass};
use crate::node::Node;
use futures::future::try_join_all;
use meridian_crypto::{PublicKey, Signer};
use meridian_proto::registry::{BodyRegistry, DecodedBody};
use meridian_proto::wire::{transaction_body, MessageSubmit, StorageUpdateList};
use meridian_proto::{
    AccountId, ContractId, NodeId, RequestId, SignatureMap, SignaturePair, SignedTransaction,
    StorageWrite, Timestamp, TopicId, TransactionBody, TransactionResponse,
};
use prost::Message;
use std::collections::HashSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Operation payload of a transaction under construction.
#[derive(Clone, Debug)]
pub enum TransactionData {
    /// Message submission to a consensus topic; chunks when oversized.
    MessageSubmit {
        /// Target topic.
        topic: TopicId,
        /// Full (unchunked) message bytes.
        message: Vec<u8>,
    },
    /// Contract storage update batch; always a single chunk.
    StorageUpdate {
        /// Contract whose storage is updated.
        contract: ContractId,
        /// Writes applied in order.
        writes: Vec<StorageWrite>,
    },
}

/// Mutable transaction under construction.
#[derive(Debug, Default)]
pub struct TransactionBuilder {
    payer: Option<AccountId>,
    data: Option<TransactionData>,
    memo: String,
    fee_limit: u64,
    valid_start: Option<Timestamp>,
    deadline: Option<Duration>,
}

impl TransactionBuilder {
    /// Start an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the paying account.
    pub fn payer(mut self, payer: AccountId) -> Self {
        self.payer = Some(payer);
        self
    }

    /// Submit a message to a topic.
    pub fn message_submit(mut self, topic: TopicId, message: Vec<u8>) -> Self {
        self.data = Some(TransactionData::MessageSubmit { topic, message });
        self
    }

    /// Apply a batch of storage writes to a contract.
    pub fn storage_update(mut self, contract: ContractId, writes: Vec<StorageWrite>) -> Self {
        self.data = Some(TransactionData::StorageUpdate { contract, writes });
        self
    }

    /// Attach a memo.
    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    /// Cap the fee the payer will accept.
    pub fn fee_limit(mut self, fee_limit: u64) -> Self {
        self.fee_limit = fee_limit;
        self
    }

    /// Pin the valid-start instant (defaults to now at freeze time).
    pub fn valid_start(mut self, valid_start: Timestamp) -> Self {
        self.valid_start = Some(valid_start);
        self
    }

    /// Override the per-attempt deadline for this request.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Freeze the transaction: compute the chunk plan and the
    /// chunk × node body matrix, locking every wire-affecting field.
    pub fn freeze(self, client: &Client) -> Result<FrozenTransaction> {
        let payer = self
            .payer
            .ok_or_else(|| Error::state("payer not set before freeze"))?;
        let data = self
            .data
            .ok_or_else(|| Error::state("transaction data not set before freeze"))?;

        let valid_start = match self.valid_start {
            Some(ts) => ts,
            None => {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default();
                Timestamp::new(now.as_secs() as i64, now.subsec_nanos() as i32)
            }
        };
        let request_id = RequestId::new(payer, valid_start);

        let config = client.config();
        let nodes = client.pool().redundant_set()?;
        let node_ids: Vec<NodeId> = nodes.iter().map(|n| n.id()).collect();

        let payloads: Vec<transaction_body::Data> = match &data {
            TransactionData::MessageSubmit { topic, message } => {
                let plan = chunker::plan(message.len(), config.max_chunk_size, config.max_chunks)?;
                let pieces = plan.split(message);
                // An empty message still needs one transmittable chunk.
                let pieces: Vec<&[u8]> = if pieces.is_empty() { vec![&[]] } else { pieces };
                let total = pieces.len() as u32;
                pieces
                    .into_iter()
                    .enumerate()
                    .map(|(i, piece)| {
                        transaction_body::Data::MessageSubmit(MessageSubmit {
                            topic: Some(*topic),
                            message: piece.to_vec(),
                            chunk_index: i as u32,
                            chunk_total: total,
                        })
                    })
                    .collect()
            }
            TransactionData::StorageUpdate { contract, writes } => {
                vec![transaction_body::Data::StorageUpdate(StorageUpdateList {
                    contract: Some(*contract),
                    updates: writes.iter().map(StorageWrite::to_wire).collect(),
                })]
            }
        };

        let total = payloads.len() as u32;
        let chunks = payloads
            .into_iter()
            .enumerate()
            .map(|(index, payload)| {
                let slots = node_ids
                    .iter()
                    .map(|node_id| {
                        let body = TransactionBody {
                            request_id: Some(request_id.with_nonce(index as u32)),
                            node_id: node_id.0,
                            fee_limit: self.fee_limit,
                            memo: self.memo.clone(),
                            data: Some(payload.clone()),
                        };
                        SignatureSlot {
                            node_id: *node_id,
                            body_bytes: body.encode_to_vec(),
                            signatures: Vec::new(),
                        }
                    })
                    .collect();
                FrozenChunk {
                    index: index as u32,
                    total,
                    slots,
                }
            })
            .collect();

        debug!(request_id = %request_id, chunks = total, nodes = node_ids.len(), "transaction frozen");

        Ok(FrozenTransaction {
            request_id,
            deadline: self.deadline,
            chunks,
        })
    }
}

/// One (chunk, node) signing slot: the node-bound body and its signatures.
#[derive(Clone, Debug)]
pub struct SignatureSlot {
    node_id: NodeId,
    body_bytes: Vec<u8>,
    signatures: Vec<SignaturePair>,
}

impl SignatureSlot {
    /// The node this slot's body is bound to.
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// The exact bytes a signer signs for this slot.
    pub fn body_bytes(&self) -> &[u8] {
        &self.body_bytes
    }

    /// Signatures collected so far.
    pub fn signatures(&self) -> &[SignaturePair] {
        &self.signatures
    }
}

/// One ordered chunk of a frozen transaction.
#[derive(Clone, Debug)]
pub struct FrozenChunk {
    index: u32,
    total: u32,
    slots: Vec<SignatureSlot>,
}

impl FrozenChunk {
    /// Zero-based chunk index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Total chunks in the logical request.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// The redundant signing slots, one per targeted node.
    pub fn slots(&self) -> &[SignatureSlot] {
        &self.slots
    }

    fn slot(&self, node_id: NodeId) -> Result<&SignatureSlot> {
        self.slots
            .iter()
            .find(|s| s.node_id == node_id)
            .ok_or_else(|| Error::state(format!("chunk {} is not addressed to {node_id}", self.index)))
    }
}

/// Immutable transaction: chunk plan, per-node bodies, signature slots.
#[derive(Clone, Debug)]
pub struct FrozenTransaction {
    request_id: RequestId,
    deadline: Option<Duration>,
    chunks: Vec<FrozenChunk>,
}

impl FrozenTransaction {
    /// Identity shared by every chunk (nonces differ per chunk).
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Number of chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Per-attempt deadline override carried by this transaction.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// The frozen chunks in index order.
    pub fn chunks(&self) -> &[FrozenChunk] {
        &self.chunks
    }

    /// Nodes the request is addressed to.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.chunks
            .first()
            .map(|c| c.slots.iter().map(|s| s.node_id).collect())
            .unwrap_or_default()
    }

    /// Sign every (chunk, node) slot with the given signer.
    ///
    /// The signed bytes differ per slot even though the logical payload is
    /// identical: each body embeds the targeted node's id. The network
    /// requires this replay-binding, so one signer call fans out to
    /// chunks × nodes signatures.
    pub fn sign(&mut self, signer: &dyn Signer) -> &mut Self {
        let public_key = signer.public_key().to_bytes().to_vec();
        for chunk in &mut self.chunks {
            for slot in &mut chunk.slots {
                let signature = signer.sign(&slot.body_bytes);
                slot.signatures.push(SignaturePair {
                    public_key_prefix: public_key.clone(),
                    ed25519: signature.to_bytes().to_vec(),
                });
            }
        }
        self
    }

    /// The full wire envelope for one (chunk, node) slot.
    pub fn signed_payload(&self, chunk: usize, node_id: NodeId) -> Result<Vec<u8>> {
        let chunk = self
            .chunks
            .get(chunk)
            .ok_or_else(|| Error::state(format!("no chunk {chunk}")))?;
        let slot = chunk.slot(node_id)?;
        if slot.signatures.is_empty() {
            return Err(Error::state("transaction is not signed"));
        }
        let envelope = SignedTransaction {
            body_bytes: slot.body_bytes.clone(),
            signature_map: Some(SignatureMap {
                pairs: slot.signatures.clone(),
            }),
        };
        Ok(envelope.encode_to_vec())
    }

    /// Decode one slot's payload through an explicit decode registry.
    pub fn decode_payload(
        &self,
        registry: &BodyRegistry,
        chunk: usize,
        node_id: NodeId,
    ) -> Result<DecodedBody> {
        let chunk = self
            .chunks
            .get(chunk)
            .ok_or_else(|| Error::state(format!("no chunk {chunk}")))?;
        let slot = chunk.slot(node_id)?;
        Ok(registry.decode(&slot.body_bytes)?)
    }

    /// Submit every chunk and join the results.
    ///
    /// Chunk calls run as independent parallel futures, each choosing its
    /// own node per attempt. The outcome is a join: if any chunk ultimately
    /// fails, the whole logical request fails; there is no partial
    /// success.
    pub async fn execute(&self, client: &Client) -> Result<TransactionOutcome> {
        let submits: Vec<ChunkSubmit<'_>> = (0..self.chunks.len())
            .map(|chunk| ChunkSubmit {
                frozen: self,
                chunk,
            })
            .collect();
        let chunks = try_join_all(submits.iter().map(|s| client.execute(s))).await?;
        Ok(TransactionOutcome {
            request_id: self.request_id.clone(),
            chunks,
        })
    }
}

/// Required-signer precondition check.
///
/// Sufficiency is enforced by the network, never by the client; this only
/// lets callers catch an obviously incomplete signature set before paying
/// for a doomed submission.
#[derive(Clone, Debug)]
pub struct SignerSet {
    required: Vec<PublicKey>,
}

impl SignerSet {
    /// Declare the keys a submission is expected to carry.
    pub fn new(required: Vec<PublicKey>) -> Self {
        Self { required }
    }

    /// Whether every required key has signed every (chunk, node) slot.
    pub fn is_covered(&self, frozen: &FrozenTransaction) -> bool {
        frozen.chunks.iter().all(|chunk| {
            chunk.slots.iter().all(|slot| {
                self.required.iter().all(|key| {
                    let key = key.to_bytes();
                    slot.signatures
                        .iter()
                        .any(|pair| pair.public_key_prefix == key)
                })
            })
        })
    }
}

/// Result of one successfully submitted chunk.
#[derive(Clone, Debug)]
pub struct ChunkResponse {
    /// Chunk index this response belongs to.
    pub chunk_index: u32,
    /// Node that accepted the chunk.
    pub node_id: NodeId,
    /// Node's fee estimate for the chunk, in base units.
    pub cost: u64,
}

/// Result of a fully submitted logical transaction.
#[derive(Clone, Debug)]
pub struct TransactionOutcome {
    /// Identity of the logical request.
    pub request_id: RequestId,
    /// Per-chunk responses in chunk-index order.
    pub chunks: Vec<ChunkResponse>,
}

/// Executable for one chunk of a frozen transaction.
pub(crate) struct ChunkSubmit<'a> {
    frozen: &'a FrozenTransaction,
    chunk: usize,
}

impl Executable for ChunkSubmit<'_> {
    type Output = ChunkResponse;

    fn deadline(&self) -> Option<Duration> {
        self.frozen.deadline
    }

    fn allowed_nodes(&self) -> Option<HashSet<NodeId>> {
        Some(self.frozen.node_ids().into_iter().collect())
    }

    fn make_request(&self, node: &Node, _attempt: u32) -> Result<WireRequest> {
        let payload = self.frozen.signed_payload(self.chunk, node.id())?;
        Ok(WireRequest::Frame(payload.into()))
    }

    fn interpret(
        &self,
        node: &Node,
        response: WireResponse,
    ) -> Result<ExecutionOutcome<ChunkResponse>> {
        let decoded = TransactionResponse::decode(response.body.as_ref())
            .map_err(meridian_proto::ProtoError::from)
            .map_err(Error::from)?;
        let status = decoded.status()?;
        Ok(match classify(status) {
            StatusClass::Success => ExecutionOutcome::Success(ChunkResponse {
                chunk_index: self.chunk as u32,
                node_id: node.id(),
                cost: decoded.cost,
            }),
            StatusClass::Retryable => ExecutionOutcome::Retry { status },
            StatusClass::Fatal => ExecutionOutcome::Fatal { status },
        })
    }
}
