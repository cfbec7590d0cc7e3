//! Constants for the transport layer (timeouts, read sizes, limits).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large payloads).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Largest chunk a [`ByteStream`](super::ByteStream) hands out per read.
pub const READ_CHUNK_SIZE: usize = 8192;

/// Default upper bound for a metalink document (10 MiB).
pub const DEFAULT_MAX_DOCUMENT_SIZE: u64 = 10 * 1024 * 1024;
