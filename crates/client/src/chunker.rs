//! Chunk planning for oversized request bodies.

use crate::error::{Error, Result};
use std::ops::Range;

/// The ordered chunk layout of one request body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkPlan {
    ranges: Vec<Range<usize>>,
}

impl ChunkPlan {
    /// Number of chunks.
    pub fn chunk_count(&self) -> usize {
        self.ranges.len()
    }

    /// Byte range of one chunk.
    pub fn range(&self, index: usize) -> Option<Range<usize>> {
        self.ranges.get(index).cloned()
    }

    /// Slice a body into its chunks, in index order.
    pub fn split<'a>(&self, body: &'a [u8]) -> Vec<&'a [u8]> {
        self.ranges.iter().map(|r| &body[r.clone()]).collect()
    }
}

/// Plan the chunk layout for a body of `len` bytes.
///
/// Produces exactly `ceil(len / max_chunk_size)` chunks; a plan that would
/// exceed `max_chunks` is rejected rather than silently truncated.
pub fn plan(len: usize, max_chunk_size: usize, max_chunks: usize) -> Result<ChunkPlan> {
    if max_chunk_size == 0 {
        return Err(Error::Config("max_chunk_size must be positive".into()));
    }

    let chunk_count = len.div_ceil(max_chunk_size);
    if chunk_count > max_chunks {
        return Err(Error::RequestTooLarge {
            chunks: chunk_count,
            max_chunks,
        });
    }

    let ranges = (0..chunk_count)
        .map(|i| {
            let start = i * max_chunk_size;
            start..(start + max_chunk_size).min(len)
        })
        .collect();
    Ok(ChunkPlan { ranges })
}
