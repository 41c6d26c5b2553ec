//! Query request types: receipt fetch, fee estimation, message polling.
//!
//! Queries ride the same retry engine as transactions. Receipt lookups go
//! to consensus nodes over the binary transport; estimation and history
//! reads go to mirror endpoints over REST.

use crate::aggregate::FeeEstimate;
use crate::channel::{WireRequest, WireResponse};
use crate::client::Client;
use crate::error::{Error, Result};
use crate::executable::{classify, Executable, ExecutionOutcome, StatusClass};
use crate::node::Node;
use crate::pool::TransportKind;
use crate::transaction::FrozenTransaction;
use futures::future::try_join_all;
use meridian_proto::wire::{query, query_response, Query, QueryResponse, ReceiptQuery as WireReceiptQuery};
use meridian_proto::{ProtoError, Receipt, RequestId, TopicId};
use prost::Message;
use serde::Deserialize;
use std::time::Duration;

/// Fetch the post-consensus receipt for a submitted request.
#[derive(Clone, Debug)]
pub struct ReceiptQuery {
    request_id: RequestId,
    deadline: Option<Duration>,
}

impl ReceiptQuery {
    /// Query the receipt of the given request.
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            deadline: None,
        }
    }

    /// Override the per-attempt deadline for this query.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl Executable for ReceiptQuery {
    type Output = Receipt;

    fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    fn make_request(&self, _node: &Node, _attempt: u32) -> Result<WireRequest> {
        let envelope = Query {
            kind: Some(query::Kind::Receipt(WireReceiptQuery {
                request_id: Some(self.request_id.clone()),
            })),
        };
        Ok(WireRequest::Frame(envelope.encode_to_vec().into()))
    }

    fn interpret(&self, _node: &Node, response: WireResponse) -> Result<ExecutionOutcome<Receipt>> {
        let decoded = QueryResponse::decode(response.body.as_ref())
            .map_err(ProtoError::from)
            .map_err(Error::from)?;
        let status = decoded.status()?;
        Ok(match classify(status) {
            StatusClass::Success => {
                let query_response::Kind::Receipt(receipt) = decoded
                    .kind
                    .ok_or(ProtoError::MissingField("QueryResponse.kind"))?;
                ExecutionOutcome::Success(receipt)
            }
            StatusClass::Retryable => ExecutionOutcome::Retry { status },
            StatusClass::Fatal => ExecutionOutcome::Fatal { status },
        })
    }
}

/// Fee estimate for one chunk of a frozen transaction, served by mirrors.
pub(crate) struct ChunkFeeQuery<'a> {
    frozen: &'a FrozenTransaction,
    chunk: usize,
}

impl Executable for ChunkFeeQuery<'_> {
    type Output = FeeEstimate;

    fn transport(&self) -> TransportKind {
        TransportKind::Mirror
    }

    fn deadline(&self) -> Option<Duration> {
        self.frozen.deadline()
    }

    fn make_request(&self, _node: &Node, _attempt: u32) -> Result<WireRequest> {
        let chunk = self
            .frozen
            .chunks()
            .get(self.chunk)
            .ok_or_else(|| Error::state(format!("no chunk {}", self.chunk)))?;
        let size = chunk
            .slots()
            .first()
            .map(|slot| slot.body_bytes().len())
            .unwrap_or(0);
        Ok(WireRequest::Get(format!(
            "/api/v1/transactions/estimate?size={size}&chunk={}&of={}",
            chunk.index(),
            chunk.total(),
        )))
    }

    fn interpret(
        &self,
        _node: &Node,
        response: WireResponse,
    ) -> Result<ExecutionOutcome<FeeEstimate>> {
        let estimate: FeeEstimate = serde_json::from_slice(&response.body)
            .map_err(|e| Error::transport(format!("malformed estimate body: {e}")))?;
        Ok(ExecutionOutcome::Success(estimate))
    }
}

impl FrozenTransaction {
    /// Estimate the fee for the whole logical request.
    ///
    /// Each chunk is estimated independently over the mirror transport; the
    /// per-chunk estimates are joined (all chunks complete first) and then
    /// merged in chunk-index order.
    pub async fn estimate_fee(&self, client: &Client) -> Result<FeeEstimate> {
        let queries: Vec<ChunkFeeQuery<'_>> = (0..self.chunk_count())
            .map(|chunk| ChunkFeeQuery {
                frozen: self,
                chunk,
            })
            .collect();
        let estimates = try_join_all(queries.iter().map(|q| client.execute(q))).await?;
        Ok(FeeEstimate::aggregate(&estimates))
    }
}

/// One message previously reached consensus on a topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicMessage {
    /// Position in the topic's ordered message stream.
    pub sequence_number: u64,
    /// Message contents.
    pub contents: Vec<u8>,
    /// Consensus timestamp as reported by the mirror.
    pub consensus_timestamp: String,
}

#[derive(Deserialize)]
struct TopicMessageRecord {
    sequence_number: u64,
    /// Hex-encoded contents.
    contents: String,
    consensus_timestamp: String,
}

#[derive(Deserialize)]
struct TopicMessagesPage {
    messages: Vec<TopicMessageRecord>,
}

/// Poll a topic's recent messages from a mirror endpoint.
#[derive(Clone, Debug)]
pub struct MessagePollQuery {
    topic: TopicId,
    limit: u32,
    deadline: Option<Duration>,
}

impl MessagePollQuery {
    /// Poll up to `limit` recent messages on `topic`.
    pub fn new(topic: TopicId, limit: u32) -> Self {
        Self {
            topic,
            limit,
            deadline: None,
        }
    }

    /// Override the per-attempt deadline for this query.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl Executable for MessagePollQuery {
    type Output = Vec<TopicMessage>;

    fn transport(&self) -> TransportKind {
        TransportKind::Mirror
    }

    fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    fn make_request(&self, _node: &Node, _attempt: u32) -> Result<WireRequest> {
        Ok(WireRequest::Get(format!(
            "/api/v1/topics/{}/messages?limit={}",
            self.topic, self.limit
        )))
    }

    fn interpret(
        &self,
        _node: &Node,
        response: WireResponse,
    ) -> Result<ExecutionOutcome<Vec<TopicMessage>>> {
        let page: TopicMessagesPage = serde_json::from_slice(&response.body)
            .map_err(|e| Error::transport(format!("malformed messages body: {e}")))?;
        let messages = page
            .messages
            .into_iter()
            .map(|record| {
                let contents = hex::decode(&record.contents)
                    .map_err(|e| Error::transport(format!("malformed message contents: {e}")))?;
                Ok(TopicMessage {
                    sequence_number: record.sequence_number,
                    contents,
                    consensus_timestamp: record.consensus_timestamp,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ExecutionOutcome::Success(messages))
    }
}
