//! Metalink Resolver Core Library
//!
//! Turns a metalink mirror document into one trusted download target:
//! a mirror URI, the declared size and a SHA-256/SHA-512 digest for a
//! named file. Documents are parsed incrementally as they stream in, and
//! nothing is trusted until the whole document has passed validation.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`metalink`] - Push parser, element state machine and validation gate
//! - [`transport`] - Byte-stream transports (`http`, `https`, `file`)
//! - [`resolver`] - Cancellable chunked fetch driver
//! - [`blocking`] - Synchronous bridge over the async driver
//! - [`verify`] - Download the selected mirror and check size and digest
//! - [`error`] - Top-level [`MetalinkError`]

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod blocking;
pub mod error;
pub mod metalink;
pub mod resolver;
pub mod transport;
pub mod verify;

mod user_agent;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use error::MetalinkError;
pub use metalink::{
    Digest, HashAlgorithm, MetalinkParser, MetalinkTarget, ParseError, ResolvedTarget,
    ValidationError, resolve_document,
};
pub use resolver::{MetalinkResolver, resolve_async, resolve_sync};
pub use transport::{
    ByteStream, DEFAULT_MAX_DOCUMENT_SIZE, DefaultTransport, FileTransport, HttpTransport,
    Transport, TransportError,
};
pub use verify::{VerifiedPayload, fetch_verified};
