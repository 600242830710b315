//! Peer-side reassembly of a chunked response

use crate::ble::sentinels;
use crate::chunk::{MAX_CHUNK_COUNT, MAX_CHUNK_SIZE};

/// What the reader wants after consuming a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadProgress {
    /// Issue another read
    More,
    /// The response is complete
    Done,
}

/// Collects chunks from successive reads until the response is complete.
///
/// A response ends at the `empty` sentinel, at a chunk shorter than
/// [`MAX_CHUNK_SIZE`], or after [`MAX_CHUNK_COUNT`] chunks. A final short
/// chunk that happens to equal `empty` is indistinguishable from the sentinel.
#[derive(Debug, Default)]
pub struct ResponseReader {
    buf: Vec<u8>,
    chunks: usize,
    done: bool,
}

impl ResponseReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, chunk: &[u8]) -> ReadProgress {
        if self.done {
            return ReadProgress::Done;
        }
        if chunk == sentinels::EMPTY || chunk.is_empty() {
            self.done = true;
            return ReadProgress::Done;
        }

        self.buf.extend_from_slice(chunk);
        self.chunks += 1;

        if chunk.len() < MAX_CHUNK_SIZE || self.chunks >= MAX_CHUNK_COUNT {
            self.done = true;
            return ReadProgress::Done;
        }
        ReadProgress::More
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// True when the device filled every chunk slot, so content may have been
    /// dropped. A response of exactly the maximum size looks the same.
    pub fn possibly_truncated(&self) -> bool {
        self.chunks >= MAX_CHUNK_COUNT
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkQueue;

    fn read_all(queue: &mut ChunkQueue) -> ResponseReader {
        let mut reader = ResponseReader::new();
        loop {
            let chunk = queue.next().unwrap_or_else(|_| sentinels::EMPTY.to_vec());
            if reader.accept(&chunk) == ReadProgress::Done {
                return reader;
            }
        }
    }

    #[test]
    fn short_chunk_ends_response() {
        let mut reader = ResponseReader::new();
        assert_eq!(reader.accept(b"Door locked"), ReadProgress::Done);
        assert_eq!(reader.into_bytes(), b"Door locked");
    }

    #[test]
    fn full_chunk_asks_for_more() {
        let mut queue = ChunkQueue::new();
        queue.push(b"0123456789abcdef");
        let reader = read_all(&mut queue);
        assert_eq!(reader.chunk_count(), 1);
        assert_eq!(reader.into_bytes(), b"0123456789abcdef");
    }

    #[test]
    fn empty_sentinel_alone_is_empty_response() {
        let mut reader = ResponseReader::new();
        assert_eq!(reader.accept(sentinels::EMPTY), ReadProgress::Done);
        assert!(reader.into_bytes().is_empty());
    }

    #[test]
    fn stops_after_max_chunks() {
        let mut queue = ChunkQueue::new();
        queue.push(&[b'z'; 700]);
        let reader = read_all(&mut queue);
        assert!(reader.possibly_truncated());
        assert_eq!(reader.into_bytes().len(), 640);
        assert!(!queue.has_next());
    }

    #[test]
    fn ignores_chunks_after_done() {
        let mut reader = ResponseReader::new();
        reader.accept(b"ok");
        assert_eq!(reader.accept(b"late"), ReadProgress::Done);
        assert_eq!(reader.into_bytes(), b"ok");
    }

    #[test]
    fn reassembles_multi_chunk_response() {
        let response = b"Command not accepted. And some more text to span a few chunks";
        let mut queue = ChunkQueue::new();
        queue.push(response);
        let reader = read_all(&mut queue);
        assert!(!reader.possibly_truncated());
        assert_eq!(reader.into_bytes(), response);
    }
}
