//! Response framing: a bounded FIFO of fixed-size chunks
//!
//! A response is split into chunks of at most [`MAX_CHUNK_SIZE`] bytes and
//! at most [`MAX_CHUNK_COUNT`] of them are kept. Anything past
//! [`MAX_RESPONSE_SIZE`] is dropped.

use std::collections::VecDeque;

pub const MAX_CHUNK_SIZE: usize = 16;
pub const MAX_CHUNK_COUNT: usize = 40;
pub const MAX_RESPONSE_SIZE: usize = MAX_CHUNK_SIZE * MAX_CHUNK_COUNT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("chunk queue is empty")]
pub struct EmptyQueue;

/// Chunks of the current response, oldest first
#[derive(Debug, Default, Clone)]
pub struct ChunkQueue {
    chunks: VecDeque<Vec<u8>>,
}

impl ChunkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Append `response` as chunks until it is exhausted or the queue is full.
    ///
    /// Returns the number of bytes that did not fit.
    pub fn push(&mut self, response: &[u8]) -> usize {
        let mut pieces = response.chunks(MAX_CHUNK_SIZE);
        while self.chunks.len() < MAX_CHUNK_COUNT {
            match pieces.next() {
                Some(piece) => self.chunks.push_back(piece.to_vec()),
                None => return 0,
            }
        }
        pieces.map(<[u8]>::len).sum()
    }

    pub fn has_next(&self) -> bool {
        !self.chunks.is_empty()
    }

    /// Remove and return the oldest chunk
    pub fn next(&mut self) -> Result<Vec<u8>, EmptyQueue> {
        self.chunks.pop_front().ok_or(EmptyQueue)
    }
}
