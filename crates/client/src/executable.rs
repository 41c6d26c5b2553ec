//! The retry/deadline engine shared by every request type.
//!
//! One logical call (a whole query, or one chunk of a transaction) moves
//! through selection, encoding, transmission, and classification until it
//! succeeds, fails fatally, or exhausts the retry budget. Node failures are
//! recorded against the node; only the loop's own bounds produce the
//! terminal exhaustion error.

use crate::channel::{WireRequest, WireResponse};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::node::Node;
use crate::pool::{AttemptOutcome, NodePool, TransportKind};
use meridian_proto::{NodeId, ResponseStatus};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How a classified response status drives the loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    /// The request was served.
    Success,
    /// The chosen node, not the request, is at fault; try another node.
    Retryable,
    /// The request itself was rejected; stop immediately.
    Fatal,
}

/// Partition a response status into the three retry classes.
pub fn classify(status: ResponseStatus) -> StatusClass {
    match status {
        ResponseStatus::Ok => StatusClass::Success,
        ResponseStatus::Busy | ResponseStatus::PlatformUnavailable => StatusClass::Retryable,
        // Not ready yet is a property of time, not of the node or request.
        ResponseStatus::ReceiptNotReady => StatusClass::Retryable,
        ResponseStatus::Unknown
        | ResponseStatus::InvalidRequest
        | ResponseStatus::DuplicateRequest
        | ResponseStatus::InsufficientFee
        | ResponseStatus::EntityNotFound
        | ResponseStatus::RequestExpired => StatusClass::Fatal,
    }
}

/// What one interpreted response means for the call.
pub enum ExecutionOutcome<T> {
    /// Parsed result; the call is done.
    Success(T),
    /// Node-level failure reported in-band; retry elsewhere.
    Retry {
        /// The status that triggered the retry.
        status: ResponseStatus,
    },
    /// Business rejection; surface to the caller.
    Fatal {
        /// The rejecting status.
        status: ResponseStatus,
    },
}

/// A request the engine can drive: encode per node, interpret the response.
pub trait Executable: Send + Sync {
    /// Parsed result type.
    type Output: Send;

    /// Which transport this request targets.
    fn transport(&self) -> TransportKind {
        TransportKind::Consensus
    }

    /// Per-request deadline override; `None` uses the client default.
    fn deadline(&self) -> Option<Duration> {
        None
    }

    /// Restrict selection to these nodes (a chunk's redundant target set).
    fn allowed_nodes(&self) -> Option<HashSet<NodeId>> {
        None
    }

    /// Build the wire request for the chosen node and attempt number.
    fn make_request(&self, node: &Node, attempt: u32) -> Result<WireRequest>;

    /// Interpret a raw response. An `Err` here (malformed frame, undecodable
    /// body) is treated as a node-transient failure.
    fn interpret(&self, node: &Node, response: WireResponse)
        -> Result<ExecutionOutcome<Self::Output>>;
}

/// Shared engine state for one `execute` call.
pub struct ExecutionContext<'a> {
    /// Node pool to select from and report to.
    pub pool: &'a NodePool,
    /// Client-wide configuration.
    pub config: &'a ClientConfig,
    /// Cancellation signal from the owning client.
    pub cancel: &'a CancellationToken,
}

/// The per-attempt deadline: a request-level override wins over the
/// client-wide default.
pub fn effective_deadline(request: Option<Duration>, client_default: Duration) -> Duration {
    request.unwrap_or(client_default)
}

/// Drive one logical call to completion.
pub async fn execute<E: Executable>(ctx: ExecutionContext<'_>, exec: &E) -> Result<E::Output> {
    let deadline = effective_deadline(exec.deadline(), ctx.config.request_deadline);
    let allowed = exec.allowed_nodes();
    let started = Instant::now();
    let mut tried: HashSet<NodeId> = HashSet::new();
    let mut attempt: u32 = 0;
    let mut last_failure: Option<Error> = None;

    loop {
        if ctx.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        attempt += 1;
        if attempt > ctx.config.max_attempts
            || started.elapsed() >= ctx.config.max_execution_time
        {
            return Err(Error::AttemptsExhausted {
                attempts: attempt - 1,
                elapsed: started.elapsed(),
                last: last_failure.map(Box::new),
            });
        }

        // Selecting
        let node = ctx
            .pool
            .select_node(exec.transport(), &tried, allowed.as_ref())
            .await?;
        tried.insert(node.id());

        // Stagger retries by the newly selected node's own backoff delay.
        if attempt > 1 {
            let delay = node.backoff().await;
            if !delay.is_zero() {
                tokio::select! {
                    _ = ctx.cancel.cancelled() => return Err(Error::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        // Encoding
        let request = exec.make_request(&node, attempt)?;
        debug!(node = %node.id(), attempt, "transmitting");

        // Sending / Awaiting, bounded by the per-attempt deadline. Deadline
        // expiry drops the in-flight future (cancelling the attempt) and is
        // a retryable network failure, never a silent drop.
        let outcome = tokio::select! {
            _ = ctx.cancel.cancelled() => return Err(Error::Cancelled),
            r = tokio::time::timeout(deadline, node.call(request)) => r,
        };

        let response = match outcome {
            Err(_) => {
                warn!(node = %node.id(), attempt, ?deadline, "attempt deadline exceeded");
                ctx.pool.record_outcome(&node, AttemptOutcome::Retryable).await;
                last_failure = Some(Error::DeadlineExceeded { deadline });
                continue;
            }
            Ok(Err(e)) if e.is_transient() => {
                warn!(node = %node.id(), attempt, error = %e, "node-transient failure");
                ctx.pool.record_outcome(&node, AttemptOutcome::Retryable).await;
                last_failure = Some(e);
                continue;
            }
            Ok(Err(e)) => return Err(e),
            Ok(Ok(response)) => response,
        };

        // Classifying
        match exec.interpret(&node, response) {
            Ok(ExecutionOutcome::Success(output)) => {
                ctx.pool.record_outcome(&node, AttemptOutcome::Success).await;
                debug!(node = %node.id(), attempt, "call succeeded");
                return Ok(output);
            }
            Ok(ExecutionOutcome::Retry { status }) => {
                warn!(node = %node.id(), attempt, ?status, "node asked for retry");
                ctx.pool.record_outcome(&node, AttemptOutcome::Retryable).await;
                last_failure = Some(Error::Status { status });
            }
            Ok(ExecutionOutcome::Fatal { status }) => {
                ctx.pool.record_outcome(&node, AttemptOutcome::Fatal).await;
                return Err(Error::Status { status });
            }
            Err(e) => {
                warn!(node = %node.id(), attempt, error = %e, "response failed to decode");
                ctx.pool.record_outcome(&node, AttemptOutcome::Retryable).await;
                last_failure = Some(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_deadline_prefers_request_override() {
        let client_default = Duration::from_secs(10);
        // Request-level deadline wins regardless of the client value.
        assert_eq!(
            effective_deadline(Some(Duration::from_secs(2)), client_default),
            Duration::from_secs(2)
        );
        assert_eq!(
            effective_deadline(Some(Duration::from_secs(30)), client_default),
            Duration::from_secs(30)
        );
        assert_eq!(effective_deadline(None, client_default), client_default);
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(classify(ResponseStatus::Ok), StatusClass::Success);
        assert_eq!(classify(ResponseStatus::Busy), StatusClass::Retryable);
        assert_eq!(
            classify(ResponseStatus::PlatformUnavailable),
            StatusClass::Retryable
        );
        assert_eq!(
            classify(ResponseStatus::DuplicateRequest),
            StatusClass::Fatal
        );
        assert_eq!(classify(ResponseStatus::InvalidRequest), StatusClass::Fatal);
    }
}
