//! One network endpoint and its health/backoff state.

use crate::channel::{Channel, WireRequest, WireResponse};
use crate::error::Result;
use meridian_proto::NodeId;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Mutable health state, serialized behind the node's lock.
#[derive(Debug)]
struct HealthState {
    /// Outcome-driven health flag; probes refresh it.
    healthy: bool,
    /// Current backoff delay, bounded by the configured min/max.
    backoff: Duration,
    /// When an unhealthy node becomes eligible for selection again.
    readmit_at: Option<Instant>,
    /// When the last liveness probe ran; gates the probe cache.
    last_check: Option<Instant>,
}

/// One network node: address, ledger identity, transport, health.
///
/// Health and backoff are the only cross-call mutable state in the engine.
/// Updates to a single node are serialized by its lock; distinct nodes
/// update concurrently without coordination.
pub struct Node {
    id: NodeId,
    address: String,
    channel: Arc<dyn Channel>,
    health: tokio::sync::Mutex<HealthState>,
}

impl Node {
    /// Create a healthy node starting at the minimum backoff.
    pub fn new(
        id: NodeId,
        address: impl Into<String>,
        channel: Arc<dyn Channel>,
        min_backoff: Duration,
    ) -> Self {
        Self {
            id,
            address: address.into(),
            channel,
            health: tokio::sync::Mutex::new(HealthState {
                healthy: true,
                backoff: min_backoff,
                readmit_at: None,
                last_check: None,
            }),
        }
    }

    /// Ledger-assigned node identity.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Endpoint address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Perform one request/response exchange over this node's channel.
    pub async fn call(&self, request: WireRequest) -> Result<WireResponse> {
        self.channel.call(request).await
    }

    /// Current backoff delay (the stagger applied before reusing the node).
    pub async fn backoff(&self) -> Duration {
        self.health.lock().await.backoff
    }

    /// Whether the node may be selected right now.
    ///
    /// An unhealthy node stays out until its readmission instant passes.
    /// Past that, the cached liveness probe decides; the probe itself runs
    /// at most once per TTL window: concurrent callers queue on the lock
    /// and observe the refreshed cache instead of probing again.
    pub async fn is_selectable(&self, ttl: Duration) -> bool {
        let now = Instant::now();
        let mut health = self.health.lock().await;

        if let Some(at) = health.readmit_at {
            if now < at {
                return false;
            }
            health.readmit_at = None;
            debug!(node = %self.id, "readmission period served");
        }

        let cache_fresh = health
            .last_check
            .is_some_and(|at| now.duration_since(at) < ttl);
        if !cache_fresh {
            health.healthy = self.channel.ping().await;
            health.last_check = Some(Instant::now());
            debug!(node = %self.id, healthy = health.healthy, "probe refreshed");
        }

        health.healthy
    }

    /// Record a successful exchange: reset backoff, readmit immediately.
    pub async fn record_success(&self, min_backoff: Duration) {
        let mut health = self.health.lock().await;
        health.healthy = true;
        health.backoff = min_backoff;
        health.readmit_at = None;
    }

    /// Record a transient failure: double the backoff (capped) and hold the
    /// node out of selection for the readmission period.
    pub async fn record_retryable(
        &self,
        max_backoff: Duration,
        min_readmit: Duration,
        max_readmit: Duration,
    ) {
        let mut health = self.health.lock().await;
        health.backoff = health.backoff.saturating_mul(2).min(max_backoff);
        health.healthy = false;
        let hold = health.backoff.clamp(min_readmit, max_readmit);
        health.readmit_at = Some(Instant::now() + hold);
        warn!(
            node = %self.id,
            backoff_ms = health.backoff.as_millis() as u64,
            hold_ms = hold.as_millis() as u64,
            "node marked unhealthy"
        );
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("address", &self.address)
            .finish()
    }
}
