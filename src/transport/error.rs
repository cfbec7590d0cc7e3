//! Error types for the transport layer.
//!
//! Transport errors are opaque to the metalink core: they are propagated
//! unchanged and never retried here.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while opening or reading a byte stream.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The resource is (or grew) larger than the caller allows.
    #[error("{url} exceeds the maximum size of {limit} bytes")]
    TooLarge {
        /// The URL being read.
        url: String,
        /// The configured limit in bytes.
        limit: u64,
    },

    /// No transport handles this URI scheme.
    #[error("unsupported URI scheme '{scheme}' for {url}")]
    UnsupportedScheme {
        /// The URI that was requested.
        url: String,
        /// Its scheme.
        scheme: String,
    },

    /// Local file system error (file:// sources).
    #[error("IO error reading {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The transport observed the cancellation token.
    #[error("fetch of {url} was cancelled")]
    Cancelled {
        /// The URL being read.
        url: String,
    },
}

impl TransportError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a size-limit error.
    pub fn too_large(url: impl Into<String>, limit: u64) -> Self {
        Self::TooLarge {
            url: url.into(),
            limit,
        }
    }

    /// Creates an unsupported-scheme error.
    pub fn unsupported_scheme(url: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self::UnsupportedScheme {
            url: url.into(),
            scheme: scheme.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a cancellation error.
    pub fn cancelled(url: impl Into<String>) -> Self {
        Self::Cancelled { url: url.into() }
    }
}
