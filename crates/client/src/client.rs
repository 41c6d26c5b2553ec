//! Top-level client: configuration, node pool, and cancellation.

use crate::channel::Channel;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::executable::{execute, Executable, ExecutionContext};
use crate::mirror::MirrorChannel;
use crate::node::Node;
use crate::pool::NodePool;
use meridian_proto::NodeId;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Handle to one configured network.
///
/// Cheap to clone; all clones share the node pool and the shutdown signal.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    pool: Arc<NodePool>,
    cancel: CancellationToken,
}

impl Client {
    /// Create a client with no nodes configured.
    pub fn new(config: ClientConfig) -> Self {
        let config = Arc::new(config);
        Self {
            pool: Arc::new(NodePool::new(config.clone())),
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Client-wide configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The node pool.
    pub fn pool(&self) -> &NodePool {
        &self.pool
    }

    /// Add a consensus node reachable at `address` (`host:port`).
    pub fn add_node(&self, id: NodeId, address: impl Into<String>) {
        let address = address.into();
        let channel = Arc::new(crate::channel::TcpChannel::new(address.clone()));
        self.add_node_with_channel(id, address, channel);
    }

    /// Add a consensus node with a caller-supplied channel.
    pub fn add_node_with_channel(
        &self,
        id: NodeId,
        address: impl Into<String>,
        channel: Arc<dyn Channel>,
    ) {
        self.pool
            .add_node(Node::new(id, address, channel, self.config.min_backoff));
    }

    /// Add a mirror endpoint rooted at `base_url`.
    pub fn add_mirror_node(&self, id: NodeId, base_url: impl Into<String>) -> Result<()> {
        let base_url = base_url.into();
        let channel = Arc::new(MirrorChannel::new(base_url.clone())?);
        self.add_mirror_with_channel(id, base_url, channel);
        Ok(())
    }

    /// Add a mirror endpoint with a caller-supplied channel.
    pub fn add_mirror_with_channel(
        &self,
        id: NodeId,
        address: impl Into<String>,
        channel: Arc<dyn Channel>,
    ) {
        self.pool
            .add_mirror_node(Node::new(id, address, channel, self.config.min_backoff));
    }

    /// Drive one request through the retry engine.
    pub async fn execute<E: Executable>(&self, exec: &E) -> Result<E::Output> {
        execute(
            ExecutionContext {
                pool: &self.pool,
                config: &self.config,
                cancel: &self.cancel,
            },
            exec,
        )
        .await
    }

    /// Shut the client down.
    ///
    /// Every in-flight call, including parallel chunk submissions, fails
    /// with a cancellation error rather than retrying.
    pub fn shutdown(&self) {
        info!("client shutting down");
        self.cancel.cancel();
    }

    /// Whether `shutdown` has been called.
    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish()
    }
}
