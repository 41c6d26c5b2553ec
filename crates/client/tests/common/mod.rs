//! Shared test doubles for the execution engine.

#![allow(dead_code)] // Each test binary uses a different subset.

use async_trait::async_trait;
use meridian_client::channel::{Channel, WireRequest, WireResponse};
use meridian_client::{Client, ClientConfig, Error};
use meridian_proto::{NodeId, ResponseStatus, TransactionResponse};
use parking_lot::Mutex;
use prost::Message;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// One scripted reaction of a [`MockChannel`].
pub enum Script {
    /// Answer with the given body bytes.
    Body(Vec<u8>),
    /// Fail with a transport error.
    TransportError,
    /// Never answer; the per-attempt deadline must fire.
    Hang,
}

/// Channel double with a scripted response queue.
///
/// When the queue runs dry the channel answers with `fallback` (if set) or
/// fails with a transport error.
pub struct MockChannel {
    script: Mutex<VecDeque<Script>>,
    fallback: Option<Vec<u8>>,
    alive: bool,
    pub calls: AtomicU32,
    pub pings: AtomicU32,
    pub requests: Mutex<Vec<WireRequest>>,
}

impl MockChannel {
    pub fn new(script: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback: None,
            alive: true,
            calls: AtomicU32::new(0),
            pings: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn always(body: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(body),
            alive: true,
            calls: AtomicU32::new(0),
            pings: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Channel for MockChannel {
    async fn call(&self, request: WireRequest) -> meridian_client::Result<WireResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request);

        let next = self.script.lock().pop_front();
        match next {
            Some(Script::Body(body)) => Ok(WireResponse {
                body: body.into(),
                trailers: Default::default(),
            }),
            Some(Script::TransportError) => Err(Error::transport("scripted failure")),
            Some(Script::Hang) => {
                futures::future::pending::<()>().await;
                unreachable!("pending future completed")
            }
            None => match &self.fallback {
                Some(body) => Ok(WireResponse {
                    body: body.clone().into(),
                    trailers: Default::default(),
                }),
                None => Err(Error::transport("script exhausted")),
            },
        }
    }

    async fn ping(&self) -> bool {
        self.pings.fetch_add(1, Ordering::SeqCst);
        self.alive
    }
}

/// Encoded `TransactionResponse` with the given status.
pub fn status_body(status: ResponseStatus, cost: u64) -> Vec<u8> {
    TransactionResponse {
        status: status as i32,
        cost,
    }
    .encode_to_vec()
}

/// Config with fast timings for deterministic paused-clock tests.
pub fn test_config() -> ClientConfig {
    ClientConfig::default()
        .with_backoff(
            std::time::Duration::from_millis(10),
            std::time::Duration::from_millis(80),
        )
        .with_readmit_period(
            std::time::Duration::from_millis(10),
            std::time::Duration::from_millis(500),
        )
        .with_request_deadline(std::time::Duration::from_millis(200))
}

/// Client over `channels`, one consensus node per channel.
pub fn client_with_nodes(config: ClientConfig, channels: &[Arc<MockChannel>]) -> Client {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let client = Client::new(config);
    for (i, channel) in channels.iter().enumerate() {
        client.add_node_with_channel(
            NodeId(i as u64),
            format!("10.1.0.{i}:50211"),
            channel.clone(),
        );
    }
    client
}
