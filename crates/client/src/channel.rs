//! Node transport channels.
//!
//! A [`Channel`] carries one request/response exchange with a node and
//! answers liveness probes. The consensus transport speaks length-prefixed
//! binary frames over TCP; the mirror transport (see [`crate::mirror`])
//! speaks REST/JSON. The execution engine treats both uniformly.

use crate::codec::{FrameCodec, FrameEvent, Trailers};
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, info};

/// A request as handed to a channel.
#[derive(Clone, Debug)]
pub enum WireRequest {
    /// Framed binary payload for a consensus node.
    Frame(Bytes),
    /// Path (with query string) of a GET-style mirror read.
    Get(String),
}

/// A raw response from a channel.
#[derive(Clone, Debug, Default)]
pub struct WireResponse {
    /// Response body bytes.
    pub body: Bytes,
    /// Trailer metadata; empty on transports without trailers.
    pub trailers: Trailers,
}

/// One network endpoint's transport.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Perform one request/response exchange.
    async fn call(&self, request: WireRequest) -> Result<WireResponse>;

    /// Cheap liveness probe. Must not be called more often than the
    /// configured health-check TTL allows; the node caches the result.
    async fn ping(&self) -> bool;
}

/// Binary framed channel to a consensus node.
///
/// Connects lazily and drops the connection on any transport error so the
/// next call reconnects cleanly.
pub struct TcpChannel {
    address: String,
    connection: tokio::sync::Mutex<Option<Framed<TcpStream, FrameCodec>>>,
}

impl TcpChannel {
    /// Create a channel for the given `host:port` address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connection: tokio::sync::Mutex::new(None),
        }
    }

    async fn connect(&self) -> Result<Framed<TcpStream, FrameCodec>> {
        let stream = TcpStream::connect(&self.address).await?;
        stream.set_nodelay(true)?;
        info!(address = %self.address, "connected to consensus node");
        Ok(Framed::new(stream, FrameCodec::new()))
    }

    async fn exchange(
        &self,
        connection: &mut Framed<TcpStream, FrameCodec>,
        payload: Bytes,
    ) -> Result<WireResponse> {
        connection.send(payload).await?;

        let mut body = BytesMut::new();
        loop {
            match connection.next().await {
                None => return Err(Error::transport("connection closed mid-response")),
                Some(Err(e)) => return Err(Error::Io(e)),
                Some(Ok(FrameEvent::Message(chunk))) => body.extend_from_slice(&chunk),
                Some(Ok(FrameEvent::Trailers(trailers))) => {
                    return Ok(WireResponse {
                        body: body.freeze(),
                        trailers,
                    })
                }
            }
        }
    }
}

#[async_trait]
impl Channel for TcpChannel {
    async fn call(&self, request: WireRequest) -> Result<WireResponse> {
        let payload = match request {
            WireRequest::Frame(bytes) => bytes,
            WireRequest::Get(path) => {
                return Err(Error::state(format!(
                    "binary channel cannot serve mirror read `{path}`"
                )))
            }
        };

        let mut guard = self.connection.lock().await;
        if guard.is_none() {
            *guard = Some(self.connect().await?);
        }
        let connection = guard.as_mut().ok_or_else(|| Error::transport("not connected"))?;

        match self.exchange(connection, payload).await {
            Ok(response) => Ok(response),
            Err(e) => {
                // Drop the connection so the next attempt reconnects.
                *guard = None;
                Err(e)
            }
        }
    }

    async fn ping(&self) -> bool {
        let reachable = TcpStream::connect(&self.address).await.is_ok();
        debug!(address = %self.address, reachable, "liveness probe");
        reachable
    }
}
