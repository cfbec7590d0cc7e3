//! HTTP(S) transport backed by reqwest.
//!
//! Bodies are streamed, never buffered whole: each
//! [`read_chunk`](ByteStream::read_chunk) hands out at most
//! [`READ_CHUNK_SIZE`] bytes of what the server has sent so far.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_CHUNK_SIZE, READ_TIMEOUT_SECS};
use super::{ByteStream, Transport, TransportError};
use crate::user_agent;

type BodyStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// HTTP transport for metalink documents and mirror payloads.
///
/// Idle connections are not pooled: requests may run on the short-lived
/// runtimes of the blocking bridge, and a pooled connection would outlive
/// the runtime that drives it.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    /// Creates a new HTTP transport with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a new HTTP transport with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Network`] if the client cannot be built.
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .pool_max_idle_per_host(0)
            .user_agent(user_agent::default_user_agent())
            .build()
            .map_err(|e| TransportError::network("<client builder>", e))?;
        Ok(Self { client })
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, uri, cancel), fields(uri = %uri))]
    async fn open_stream(
        &self,
        uri: &Url,
        max_size: u64,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn ByteStream>, TransportError> {
        let url = uri.as_str();
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(TransportError::cancelled(url)),
            response = self.client.get(uri.clone()).send() => {
                response.map_err(|e| TransportError::network(url, e))?
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::http_status(url, status.as_u16()));
        }

        let declared_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        if declared_length.is_some_and(|len| len > max_size) {
            return Err(TransportError::too_large(url, max_size));
        }
        debug!(?declared_length, max_size, "stream opened");

        Ok(Box::new(HttpByteStream {
            url: url.to_string(),
            body: Box::pin(response.bytes_stream()),
            pending: Bytes::new(),
            received: 0,
            max_size,
        }))
    }
}

/// A response body re-sliced into bounded chunks.
struct HttpByteStream {
    url: String,
    body: BodyStream,
    pending: Bytes,
    received: u64,
    max_size: u64,
}

#[async_trait]
impl ByteStream for HttpByteStream {
    async fn read_chunk(&mut self, cancel: &CancellationToken) -> Result<Bytes, TransportError> {
        while self.pending.is_empty() {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(TransportError::cancelled(&self.url)),
                next = self.body.next() => next,
            };
            match next {
                None => return Ok(Bytes::new()),
                Some(Ok(bytes)) => {
                    self.received += bytes.len() as u64;
                    if self.received > self.max_size {
                        return Err(TransportError::too_large(&self.url, self.max_size));
                    }
                    self.pending = bytes;
                }
                Some(Err(e)) => return Err(TransportError::network(&self.url, e)),
            }
        }
        let take = self.pending.len().min(READ_CHUNK_SIZE);
        Ok(self.pending.split_to(take))
    }
}
