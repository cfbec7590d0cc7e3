//! `file://` transport for local mirror directories.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use super::constants::READ_CHUNK_SIZE;
use super::{ByteStream, Transport, TransportError};

/// Reads `file://` URIs from the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTransport;

impl FileTransport {
    /// Creates a file transport.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for FileTransport {
    #[instrument(skip(self, uri, cancel), fields(uri = %uri))]
    async fn open_stream(
        &self,
        uri: &Url,
        max_size: u64,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn ByteStream>, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::cancelled(uri.as_str()));
        }
        if uri.scheme() != "file" {
            return Err(TransportError::unsupported_scheme(uri.as_str(), uri.scheme()));
        }
        let path = uri.to_file_path().map_err(|()| {
            TransportError::io(
                uri.path(),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a local file path"),
            )
        })?;

        let file = File::open(&path)
            .await
            .map_err(|e| TransportError::io(path.clone(), e))?;
        let length = file
            .metadata()
            .await
            .map_err(|e| TransportError::io(path.clone(), e))?
            .len();
        if length > max_size {
            return Err(TransportError::too_large(uri.as_str(), max_size));
        }
        debug!(path = %path.display(), length, "file opened");

        Ok(Box::new(FileByteStream {
            url: uri.to_string(),
            path,
            file,
            received: 0,
            max_size,
        }))
    }
}

struct FileByteStream {
    url: String,
    path: PathBuf,
    file: File,
    received: u64,
    max_size: u64,
}

#[async_trait]
impl ByteStream for FileByteStream {
    async fn read_chunk(&mut self, cancel: &CancellationToken) -> Result<Bytes, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::cancelled(&self.url));
        }
        let mut buffer = BytesMut::with_capacity(READ_CHUNK_SIZE);
        let read = self
            .file
            .read_buf(&mut buffer)
            .await
            .map_err(|e| TransportError::io(self.path.clone(), e))?;
        self.received += read as u64;
        // The file may have grown since it was opened.
        if self.received > self.max_size {
            return Err(TransportError::too_large(&self.url, self.max_size));
        }
        Ok(buffer.freeze())
    }
}
