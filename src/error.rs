//! Top-level error type for metalink resolution.
//!
//! Callers can tell "the mirror document was bad" ([`MetalinkError::Parse`],
//! [`MetalinkError::Validation`]) apart from "the fetch failed"
//! ([`MetalinkError::Transport`]) and "we gave up" ([`MetalinkError::Cancelled`]).

use thiserror::Error;
use url::Url;

use crate::metalink::{HashAlgorithm, ParseError, ValidationError};
use crate::transport::TransportError;

/// Errors returned by metalink resolution and verified downloads.
#[derive(Debug, Error)]
pub enum MetalinkError {
    /// Fetching the document or payload failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The document is malformed or violates the metalink grammar.
    #[error("metalink parse error: {0}")]
    Parse(#[from] ParseError),

    /// The document parsed but cannot be trusted.
    #[error("metalink validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The operation was cancelled before it completed.
    #[error("metalink request cancelled")]
    Cancelled,

    /// The blocking bridge could not set up its private runtime.
    #[error("failed to start blocking runtime: {source}")]
    Runtime {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The downloaded payload size differs from `<size>`.
    #[error("size mismatch for {uri}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Mirror the payload came from.
        uri: Url,
        /// Declared size.
        expected: u64,
        /// Bytes actually received.
        actual: u64,
    },

    /// The downloaded payload digest differs from the declared digest.
    #[error("{algorithm} mismatch for {uri}: expected {expected}, got {actual}")]
    DigestMismatch {
        /// Mirror the payload came from.
        uri: Url,
        /// Algorithm compared.
        algorithm: HashAlgorithm,
        /// Declared digest.
        expected: String,
        /// Digest of the received bytes.
        actual: String,
    },
}

impl MetalinkError {
    /// True if the operation ended because of cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Transport(TransportError::Cancelled { .. })
        )
    }
}
