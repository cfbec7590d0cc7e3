//! In-memory transport serving a fixed document in fixed-size chunks.

use async_trait::async_trait;
use bytes::Bytes;
use metalink_core::{ByteStream, Transport, TransportError};
use tokio_util::sync::CancellationToken;
use url::Url;

#[derive(Debug, Clone)]
pub struct ChunkedTransport {
    document: Bytes,
    chunk_size: usize,
}

impl ChunkedTransport {
    #[must_use]
    pub fn new(document: impl Into<Bytes>, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be positive");
        Self {
            document: document.into(),
            chunk_size,
        }
    }
}

#[async_trait]
impl Transport for ChunkedTransport {
    async fn open_stream(
        &self,
        uri: &Url,
        max_size: u64,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn ByteStream>, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::cancelled(uri.as_str()));
        }
        if self.document.len() as u64 > max_size {
            return Err(TransportError::too_large(uri.as_str(), max_size));
        }
        Ok(Box::new(ChunkedStream {
            remaining: self.document.clone(),
            chunk_size: self.chunk_size,
        }))
    }
}

struct ChunkedStream {
    remaining: Bytes,
    chunk_size: usize,
}

#[async_trait]
impl ByteStream for ChunkedStream {
    async fn read_chunk(&mut self, _cancel: &CancellationToken) -> Result<Bytes, TransportError> {
        let take = self.remaining.len().min(self.chunk_size);
        Ok(self.remaining.split_to(take))
    }
}
