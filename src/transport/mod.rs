//! Byte-stream transports for metalink documents and mirror payloads.
//!
//! The metalink core only needs two operations from the outside world:
//! open a bounded stream for a URI, and read the next chunk of it. Both are
//! expressed as object-safe async traits so callers can plug in their own
//! fetcher.
//!
//! # Implementations
//!
//! - [`HttpTransport`] - `http`/`https` via reqwest, streaming the body
//! - [`FileTransport`] - `file://` URIs read from the local file system
//! - [`DefaultTransport`] - dispatches on the URI scheme to one of the above
//!
//! Every stream enforces the `max_size` it was opened with and never
//! returns a chunk larger than [`READ_CHUNK_SIZE`]. An empty chunk means
//! end of stream.

pub mod constants;
mod error;
mod file;
mod http;

pub use constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_MAX_DOCUMENT_SIZE, READ_CHUNK_SIZE, READ_TIMEOUT_SECS,
};
pub use error::TransportError;
pub use file::FileTransport;
pub use http::HttpTransport;

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use url::Url;

/// An open, size-bounded stream of bytes.
#[async_trait]
pub trait ByteStream: Send {
    /// Reads the next chunk; an empty chunk signals end of stream.
    async fn read_chunk(&mut self, cancel: &CancellationToken) -> Result<Bytes, TransportError>;
}

/// Opens byte streams for URIs.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens `uri` for reading at most `max_size` bytes.
    async fn open_stream(
        &self,
        uri: &Url,
        max_size: u64,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn ByteStream>, TransportError>;
}

/// Scheme-dispatching transport used when the caller does not supply one.
#[derive(Debug, Clone, Default)]
pub struct DefaultTransport {
    http: HttpTransport,
    file: FileTransport,
}

impl DefaultTransport {
    /// Creates a transport with default HTTP timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport with explicit HTTP timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            http: HttpTransport::with_timeouts(connect_timeout_secs, read_timeout_secs)?,
            file: FileTransport::new(),
        })
    }
}

#[async_trait]
impl Transport for DefaultTransport {
    async fn open_stream(
        &self,
        uri: &Url,
        max_size: u64,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn ByteStream>, TransportError> {
        match uri.scheme() {
            "http" | "https" => self.http.open_stream(uri, max_size, cancel).await,
            "file" => self.file.open_stream(uri, max_size, cancel).await,
            scheme => Err(TransportError::unsupported_scheme(uri.as_str(), scheme)),
        }
    }
}
