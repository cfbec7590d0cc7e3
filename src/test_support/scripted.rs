//! In-memory transport that replays a scripted byte sequence.
#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::transport::{ByteStream, Transport, TransportError};

/// Declared size of `repomd.xml` in [`sample_document`].
pub(crate) const SAMPLE_SIZE: u64 = 4096;

/// A realistic document: one unrelated file, then `repomd.xml` with both
/// digests and two mirrors, plus elements the parser must skip.
pub(crate) fn sample_document() -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<metalink version="3.0" xmlns="http://www.metalinker.org/">
  <publisher><name>Example Mirrors</name></publisher>
  <files>
    <file name="primary.xml.gz">
      <size>99</size>
      <verification><hash type="md5">ffff</hash></verification>
    </file>
    <file name="repomd.xml">
      <size>{SAMPLE_SIZE}</size>
      <verification>
        <hash name="md5">0123456789abcdef0123456789abcdef</hash>
        <hash name="sha256">{sha256}</hash>
        <hash name="sha512">{sha512}</hash>
      </verification>
      <resources maxconnections="1">
        <!-- preferred mirror first -->
        <url protocol="https" type="https" location="de" preference="100">https://mirror-a.example/repomd.xml</url>
        <url protocol="http" type="http" location="us" preference="90">http://mirror-b.example/repomd.xml</url>
      </resources>
    </file>
  </files>
</metalink>
"#,
        sha256 = "a1".repeat(32),
        sha512 = "b2".repeat(64),
    )
    .into_bytes()
}

#[derive(Debug, Default)]
struct Log {
    opened: Vec<(Url, u64)>,
    reads: usize,
}

/// Transport replaying fixed chunks, recording what was asked of it.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedTransport {
    chunks: Vec<Bytes>,
    open_status: Option<u16>,
    cancel_after: Option<usize>,
    log: Arc<Mutex<Log>>,
}

impl ScriptedTransport {
    fn from_chunks(chunks: Vec<Bytes>) -> Self {
        Self {
            chunks,
            open_status: None,
            cancel_after: None,
            log: Arc::default(),
        }
    }

    /// Delivers `document` as a single chunk.
    pub(crate) fn whole(document: Vec<u8>) -> Self {
        Self::from_chunks(vec![Bytes::from(document)])
    }

    /// Delivers `document` in chunks of `size` bytes.
    pub(crate) fn chunked(document: Vec<u8>, size: usize) -> Self {
        let document = Bytes::from(document);
        let chunks = (0..document.len())
            .step_by(size)
            .map(|start| document.slice(start..(start + size).min(document.len())))
            .collect();
        Self::from_chunks(chunks)
    }

    /// Fails every open with an HTTP status error.
    pub(crate) fn failing_open(status: u16) -> Self {
        Self {
            open_status: Some(status),
            ..Self::from_chunks(Vec::new())
        }
    }

    /// After `delivered` chunks, the next read cancels the token and hangs.
    pub(crate) fn cancel_after(mut self, delivered: usize) -> Self {
        self.cancel_after = Some(delivered);
        self
    }

    pub(crate) fn opened_with(&self) -> Vec<(Url, u64)> {
        self.log.lock().unwrap().opened.clone()
    }

    pub(crate) fn reads(&self) -> usize {
        self.log.lock().unwrap().reads
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open_stream(
        &self,
        uri: &Url,
        max_size: u64,
        _cancel: &CancellationToken,
    ) -> Result<Box<dyn ByteStream>, TransportError> {
        self.log.lock().unwrap().opened.push((uri.clone(), max_size));
        if let Some(status) = self.open_status {
            return Err(TransportError::http_status(uri.as_str(), status));
        }
        Ok(Box::new(ScriptedStream {
            chunks: self.chunks.clone().into_iter(),
            delivered: 0,
            cancel_after: self.cancel_after,
            log: Arc::clone(&self.log),
        }))
    }
}

struct ScriptedStream {
    chunks: std::vec::IntoIter<Bytes>,
    delivered: usize,
    cancel_after: Option<usize>,
    log: Arc<Mutex<Log>>,
}

#[async_trait]
impl ByteStream for ScriptedStream {
    async fn read_chunk(&mut self, cancel: &CancellationToken) -> Result<Bytes, TransportError> {
        self.log.lock().unwrap().reads += 1;
        if self.cancel_after == Some(self.delivered) {
            cancel.cancel();
            std::future::pending::<()>().await;
        }
        self.delivered += 1;
        Ok(self.chunks.next().unwrap_or_default())
    }
}
