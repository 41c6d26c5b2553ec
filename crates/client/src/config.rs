//! Client-wide configuration consumed by the execution engine.

use std::time::Duration;

/// Tunables for node health, retries, deadlines, and chunking.
///
/// Every knob has a network-tested default; construct with
/// [`ClientConfig::default`] and override selectively.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Backoff a node returns to after a successful attempt.
    pub min_backoff: Duration,
    /// Ceiling for a node's doubled backoff delay.
    pub max_backoff: Duration,
    /// Shortest time an unhealthy node stays out of selection.
    pub min_readmit_period: Duration,
    /// Longest time an unhealthy node stays out of selection.
    pub max_readmit_period: Duration,
    /// How long a cached liveness probe result stays valid.
    pub health_check_ttl: Duration,
    /// Maximum attempts per logical call.
    pub max_attempts: u32,
    /// Default per-attempt deadline; individual requests may override it.
    pub request_deadline: Duration,
    /// Wall-clock bound on one logical call, measured from the first attempt.
    pub max_execution_time: Duration,
    /// Maximum bytes per chunk of an oversized request body.
    pub max_chunk_size: usize,
    /// Maximum chunks one request may split into; beyond this it is rejected.
    pub max_chunks: usize,
    /// Size of the redundant node set each chunk is addressed to.
    pub node_redundancy: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            min_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(8),
            min_readmit_period: Duration::from_secs(5),
            max_readmit_period: Duration::from_secs(60),
            health_check_ttl: Duration::from_secs(30),
            max_attempts: 10,
            request_deadline: Duration::from_secs(10),
            max_execution_time: Duration::from_secs(120),
            max_chunk_size: 1024,
            max_chunks: 20,
            node_redundancy: 3,
        }
    }
}

impl ClientConfig {
    /// Set the backoff bounds.
    pub fn with_backoff(mut self, min: Duration, max: Duration) -> Self {
        self.min_backoff = min;
        self.max_backoff = max;
        self
    }

    /// Set the readmission period bounds.
    pub fn with_readmit_period(mut self, min: Duration, max: Duration) -> Self {
        self.min_readmit_period = min;
        self.max_readmit_period = max;
        self
    }

    /// Set the liveness probe cache window.
    pub fn with_health_check_ttl(mut self, ttl: Duration) -> Self {
        self.health_check_ttl = ttl;
        self
    }

    /// Set the maximum attempts per logical call.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the default per-attempt deadline.
    pub fn with_request_deadline(mut self, deadline: Duration) -> Self {
        self.request_deadline = deadline;
        self
    }

    /// Set the wall-clock bound per logical call.
    pub fn with_max_execution_time(mut self, bound: Duration) -> Self {
        self.max_execution_time = bound;
        self
    }

    /// Set the chunking limits.
    pub fn with_chunking(mut self, max_chunk_size: usize, max_chunks: usize) -> Self {
        self.max_chunk_size = max_chunk_size;
        self.max_chunks = max_chunks;
        self
    }

    /// Set the redundant node set size per chunk.
    pub fn with_node_redundancy(mut self, redundancy: usize) -> Self {
        self.node_redundancy = redundancy;
        self
    }
}
