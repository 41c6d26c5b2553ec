//! Wire framing for the consensus-node transport.
//!
//! Frames carry a fixed 5-byte header: one flag byte followed by a 4-byte
//! big-endian payload length. Response streams end with a trailer frame
//! (flag bit set) whose payload is `key: value` lines; trailers are
//! surfaced out of band and never enter the body stream. The layout exists
//! for transports that cannot pass raw binary frames unmodified, so both
//! sides of the connection speak it unconditionally.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

/// Flag byte of a data frame.
pub const DATA_FLAG: u8 = 0x00;
/// Flag bit marking a trailer frame.
pub const TRAILER_FLAG: u8 = 0x80;
/// Header size: flag byte + big-endian u32 length.
pub const FRAME_HEADER_LEN: usize = 5;

/// Maximum frame payload (4 MB).
const MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// Trailer metadata carried after a response body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trailers {
    entries: Vec<(String, String)>,
}

impl Trailers {
    /// Parse `key: value` lines from a trailer frame payload.
    pub fn parse(payload: &[u8]) -> io::Result<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "trailer is not utf-8"))?;
        let mut entries = Vec::new();
        for line in text.split("\r\n").filter(|l| !l.is_empty()) {
            let (key, value) = line.split_once(':').ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, "trailer line missing separator")
            })?;
            entries.push((key.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
        Ok(Self { entries })
    }

    /// Look up a trailer value by (case-insensitive) key.
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether any trailers were present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One decoded frame from the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameEvent {
    /// Body payload bytes.
    Message(Bytes),
    /// End-of-response trailer metadata.
    Trailers(Trailers),
}

/// Length-prefixed frame codec.
#[derive(Debug, Default)]
pub struct FrameCodec;

impl FrameCodec {
    /// Create a new codec.
    pub fn new() -> Self {
        FrameCodec
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > MAX_FRAME_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame too large: {} bytes", item.len()),
            ));
        }
        dst.reserve(FRAME_HEADER_LEN + item.len());
        dst.put_u8(DATA_FLAG);
        dst.put_u32(item.len() as u32);
        dst.extend_from_slice(&item);
        Ok(())
    }
}

impl Decoder for FrameCodec {
    type Item = FrameEvent;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < FRAME_HEADER_LEN {
            return Ok(None);
        }

        let flags = src[0];
        if flags != DATA_FLAG && flags != TRAILER_FLAG {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown frame flags: {flags:#04x}"),
            ));
        }

        let declared = u32::from_be_bytes([src[1], src[2], src[3], src[4]]) as usize;
        if declared > MAX_FRAME_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame too large: {declared} bytes"),
            ));
        }

        if src.len() < FRAME_HEADER_LEN + declared {
            src.reserve(FRAME_HEADER_LEN + declared - src.len());
            return Ok(None);
        }

        src.advance(FRAME_HEADER_LEN);
        let payload = src.split_to(declared).freeze();

        if flags == TRAILER_FLAG {
            Ok(Some(FrameEvent::Trailers(Trailers::parse(&payload)?)))
        } else {
            Ok(Some(FrameEvent::Message(payload)))
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            // The stream ended mid-frame: the declared length does not
            // match the bytes actually received.
            None => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "truncated frame: {} bytes received of a longer declared frame",
                    src.len()
                ),
            )),
        }
    }
}

/// Encode one trailer frame.
pub fn encode_trailer_frame(entries: &[(&str, &str)]) -> BytesMut {
    let payload: String = entries
        .iter()
        .map(|(k, v)| format!("{k}: {v}\r\n"))
        .collect();
    let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + payload.len());
    buf.put_u8(TRAILER_FLAG);
    buf.put_u32(payload.len() as u32);
    buf.extend_from_slice(payload.as_bytes());
    buf
}
