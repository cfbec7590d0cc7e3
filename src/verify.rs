//! Downloads a resolved mirror and checks it against the metalink.
//!
//! The payload is hashed while it streams in, with the algorithm the
//! document declared. The transport is opened with the declared size as
//! its limit, so an oversized payload fails before it is fully read.

use bytes::{Bytes, BytesMut};
use sha2::{Digest as _, Sha256, Sha512};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::MetalinkError;
use crate::metalink::{HashAlgorithm, ResolvedTarget};
use crate::resolver::{open_stream, read_next_chunk};
use crate::transport::Transport;

/// Upper bound on the buffer reserved up front from the declared size.
const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

/// A payload whose size and digest matched the metalink document.
#[derive(Debug, Clone)]
pub struct VerifiedPayload {
    /// The target the payload was checked against.
    pub target: ResolvedTarget,
    /// Payload bytes.
    pub data: Bytes,
}

enum StreamingHash {
    Sha256(Sha256),
    Sha512(Sha512),
}

impl StreamingHash {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Sha256(hasher) => hasher.update(bytes),
            Self::Sha512(hasher) => hasher.update(bytes),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Sha256(hasher) => hex::encode(hasher.finalize()),
            Self::Sha512(hasher) => hex::encode(hasher.finalize()),
        }
    }
}

/// Fetches `resolved.selected_uri` and verifies size and digest.
///
/// # Errors
///
/// - [`MetalinkError::Transport`] if the payload cannot be fetched or
///   exceeds the declared size
/// - [`MetalinkError::SizeMismatch`] if fewer bytes arrive than declared
/// - [`MetalinkError::DigestMismatch`] if the digest differs
/// - [`MetalinkError::Cancelled`] if `cancel` fired first
#[instrument(skip(transport, resolved, cancel), fields(uri = %resolved.selected_uri, size = resolved.declared_size))]
pub async fn fetch_verified(
    transport: &dyn Transport,
    resolved: ResolvedTarget,
    cancel: &CancellationToken,
) -> Result<VerifiedPayload, MetalinkError> {
    let uri = &resolved.selected_uri;
    let mut stream = open_stream(transport, uri, resolved.declared_size, cancel).await?;

    let mut hasher = StreamingHash::new(resolved.digest.algorithm);
    let capacity = usize::try_from(resolved.declared_size.min(MAX_PREALLOCATION)).unwrap_or(0);
    let mut data = BytesMut::with_capacity(capacity);
    loop {
        let chunk = read_next_chunk(stream.as_mut(), cancel).await?;
        if chunk.is_empty() {
            break;
        }
        hasher.update(&chunk);
        data.extend_from_slice(&chunk);
    }
    debug!(received = data.len(), "payload complete");

    let actual_size = data.len() as u64;
    if actual_size != resolved.declared_size {
        warn!(expected = resolved.declared_size, actual = actual_size, "payload size mismatch");
        return Err(MetalinkError::SizeMismatch {
            uri: uri.clone(),
            expected: resolved.declared_size,
            actual: actual_size,
        });
    }

    let actual_digest = hasher.finalize_hex();
    if actual_digest != resolved.digest.hex {
        warn!(algorithm = %resolved.digest.algorithm, "payload digest mismatch");
        return Err(MetalinkError::DigestMismatch {
            uri: uri.clone(),
            algorithm: resolved.digest.algorithm,
            expected: resolved.digest.hex.clone(),
            actual: actual_digest,
        });
    }

    info!(algorithm = %resolved.digest.algorithm, "payload verified");
    Ok(VerifiedPayload {
        target: resolved,
        data: data.freeze(),
    })
}
