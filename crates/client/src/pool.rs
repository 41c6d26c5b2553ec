//! Node pool: selection and outcome recording.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::node::Node;
use meridian_proto::NodeId;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Which transport a request targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportKind {
    /// Binary framed transport to consensus nodes.
    Consensus,
    /// REST transport to mirror (read-only) endpoints.
    Mirror,
}

/// Result of one execution attempt, as it affects node health.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The node served the request.
    Success,
    /// The node (not the request) failed; back it off.
    Retryable,
    /// The request was rejected on its merits. The node answered
    /// correctly, so its health is treated like a success.
    Fatal,
}

/// Owns the network's nodes and picks one per attempt.
///
/// The node lists are read-mostly: membership changes are configuration
/// operations, never performed mid-flight, so a short write lock suffices.
pub struct NodePool {
    config: Arc<ClientConfig>,
    consensus: RwLock<Vec<Arc<Node>>>,
    mirror: RwLock<Vec<Arc<Node>>>,
}

impl NodePool {
    /// Create an empty pool.
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self {
            config,
            consensus: RwLock::new(Vec::new()),
            mirror: RwLock::new(Vec::new()),
        }
    }

    /// Add a consensus node (configuration operation).
    pub fn add_node(&self, node: Node) {
        self.consensus.write().push(Arc::new(node));
    }

    /// Add a mirror endpoint (configuration operation).
    pub fn add_mirror_node(&self, node: Node) {
        self.mirror.write().push(Arc::new(node));
    }

    /// Number of nodes serving the given transport.
    pub fn len(&self, transport: TransportKind) -> usize {
        self.snapshot(transport).len()
    }

    /// Whether the pool has no nodes for the given transport.
    pub fn is_empty(&self, transport: TransportKind) -> bool {
        self.len(transport) == 0
    }

    fn snapshot(&self, transport: TransportKind) -> Vec<Arc<Node>> {
        match transport {
            TransportKind::Consensus => self.consensus.read().clone(),
            TransportKind::Mirror => self.mirror.read().clone(),
        }
    }

    /// The redundant node set a frozen request's chunks are addressed to.
    ///
    /// Taken in list order; health is judged per attempt at execution time,
    /// not at freeze time.
    pub fn redundant_set(&self) -> Result<Vec<Arc<Node>>> {
        let nodes = self.snapshot(TransportKind::Consensus);
        if nodes.is_empty() {
            return Err(Error::NoHealthyNode);
        }
        let count = self.config.node_redundancy.min(nodes.len()).max(1);
        Ok(nodes[..count].to_vec())
    }

    /// Select a node for one attempt.
    ///
    /// Excludes nodes already tried this logical call (guaranteeing node
    /// diversity across retries) and nodes that are currently unhealthy.
    /// `allowed` restricts selection to a request's redundant target set.
    /// Among the eligible, the node with the smallest current backoff wins.
    pub async fn select_node(
        &self,
        transport: TransportKind,
        excluding: &HashSet<NodeId>,
        allowed: Option<&HashSet<NodeId>>,
    ) -> Result<Arc<Node>> {
        let mut best: Option<(std::time::Duration, Arc<Node>)> = None;

        for node in self.snapshot(transport) {
            if excluding.contains(&node.id()) {
                continue;
            }
            if let Some(allowed) = allowed {
                if !allowed.contains(&node.id()) {
                    continue;
                }
            }
            if !node.is_selectable(self.config.health_check_ttl).await {
                continue;
            }
            let backoff = node.backoff().await;
            if best.as_ref().is_none_or(|(b, _)| backoff < *b) {
                best = Some((backoff, node));
            }
        }

        match best {
            Some((_, node)) => {
                debug!(node = %node.id(), ?transport, "selected node");
                Ok(node)
            }
            None => Err(Error::NoHealthyNode),
        }
    }

    /// Record the outcome of one attempt against the chosen node.
    pub async fn record_outcome(&self, node: &Node, outcome: AttemptOutcome) {
        match outcome {
            AttemptOutcome::Success | AttemptOutcome::Fatal => {
                node.record_success(self.config.min_backoff).await;
            }
            AttemptOutcome::Retryable => {
                node.record_retryable(
                    self.config.max_backoff,
                    self.config.min_readmit_period,
                    self.config.max_readmit_period,
                )
                .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Channel, WireRequest, WireResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingChannel {
        pings: AtomicU32,
        alive: bool,
    }

    impl CountingChannel {
        fn new(alive: bool) -> Arc<Self> {
            Arc::new(Self {
                pings: AtomicU32::new(0),
                alive,
            })
        }
    }

    #[async_trait]
    impl Channel for CountingChannel {
        async fn call(&self, _request: WireRequest) -> Result<WireResponse> {
            Ok(WireResponse::default())
        }

        async fn ping(&self) -> bool {
            self.pings.fetch_add(1, Ordering::SeqCst);
            self.alive
        }
    }

    fn pool_with_nodes(channels: &[Arc<CountingChannel>]) -> NodePool {
        let config = Arc::new(ClientConfig::default());
        let pool = NodePool::new(config.clone());
        for (i, channel) in channels.iter().enumerate() {
            pool.add_node(Node::new(
                NodeId(i as u64),
                format!("10.0.0.{i}:50211"),
                channel.clone(),
                config.min_backoff,
            ));
        }
        pool
    }

    #[tokio::test]
    async fn test_selection_excludes_tried_nodes() {
        let channels: Vec<_> = (0..3).map(|_| CountingChannel::new(true)).collect();
        let pool = pool_with_nodes(&channels);

        let mut tried = HashSet::new();
        for _ in 0..3 {
            let node = pool
                .select_node(TransportKind::Consensus, &tried, None)
                .await
                .expect("healthy node available");
            assert!(tried.insert(node.id()), "node repeated");
        }

        // All three tried: selection must fail, not repeat a node.
        assert!(matches!(
            pool.select_node(TransportKind::Consensus, &tried, None).await,
            Err(Error::NoHealthyNode)
        ));
    }

    #[tokio::test]
    async fn test_allowed_set_restricts_selection() {
        let channels: Vec<_> = (0..3).map(|_| CountingChannel::new(true)).collect();
        let pool = pool_with_nodes(&channels);

        let allowed: HashSet<_> = [NodeId(2)].into();
        let node = pool
            .select_node(TransportKind::Consensus, &HashSet::new(), Some(&allowed))
            .await
            .expect("allowed node");
        assert_eq!(node.id(), NodeId(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_cached_within_ttl() {
        let channel = CountingChannel::new(true);
        let pool = pool_with_nodes(&[channel.clone()]);
        let ttl = pool.config.health_check_ttl;

        pool.select_node(TransportKind::Consensus, &HashSet::new(), None)
            .await
            .expect("select");
        assert_eq!(channel.pings.load(Ordering::SeqCst), 1);

        // Within the TTL window: cached result, zero additional probes.
        tokio::time::advance(ttl / 2).await;
        pool.select_node(TransportKind::Consensus, &HashSet::new(), None)
            .await
            .expect("select");
        assert_eq!(channel.pings.load(Ordering::SeqCst), 1);

        // Well past the TTL: exactly one new probe.
        tokio::time::advance(ttl * 2).await;
        pool.select_node(TransportKind::Consensus, &HashSet::new(), None)
            .await
            .expect("select");
        assert_eq!(channel.pings.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dead_nodes_not_selected() {
        let channels = [CountingChannel::new(false)];
        let pool = pool_with_nodes(&channels);

        assert!(matches!(
            pool.select_node(TransportKind::Consensus, &HashSet::new(), None)
                .await,
            Err(Error::NoHealthyNode)
        ));
    }

    #[tokio::test]
    async fn test_redundant_set_capped_by_pool_size() {
        let channels: Vec<_> = (0..2).map(|_| CountingChannel::new(true)).collect();
        let pool = pool_with_nodes(&channels);

        // Default redundancy is 3; only 2 nodes exist.
        let set = pool.redundant_set().expect("nodes configured");
        assert_eq!(set.len(), 2);
    }
}
