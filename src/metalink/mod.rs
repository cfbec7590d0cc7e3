//! Metalink document parsing and validation.
//!
//! This module turns the bytes of a metalink document into a trusted
//! [`ResolvedTarget`] for one named file. It does no I/O; see
//! [`crate::resolver`] for the network-facing driver.
//!
//! # Architecture
//!
//! - [`framing`] - Cuts arbitrarily split input into whole markup/text units
//! - [`ParseState`] - Element state machine, including passthrough of
//!   unknown or rejected subtrees
//! - [`RequestRecord`] - Fields accumulated during one parse, and the text router
//! - [`MetalinkParser`] - Push parser combining the above
//! - [`RequestRecord::finalize`] - Validation gate run once at end of input
//!
//! Only `metalink/files/file/{size,verification/hash,resources/url}` is
//! understood; everything else in the document is tolerated and ignored.
//!
//! # Example
//!
//! ```
//! use metalink_core::metalink::MetalinkParser;
//!
//! let document = format!(
//!     r#"<metalink><files><file name="repomd.xml">
//!          <size>512</size>
//!          <verification><hash name="sha256">{}</hash></verification>
//!          <resources><url protocol="https">https://mirror.example/repomd.xml</url></resources>
//!        </file></files></metalink>"#,
//!     "ab".repeat(32)
//! );
//!
//! let mut parser = MetalinkParser::new("repomd.xml");
//! for chunk in document.as_bytes().chunks(7) {
//!     parser.feed(chunk)?;
//! }
//! let target = parser.finish()?.finalize("repomd.xml")?;
//! assert_eq!(target.declared_size, 512);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod framing;

mod error;
mod parser;
mod record;
mod state;
mod target;
mod validate;

pub use error::{ParseError, ValidationError};
pub use parser::MetalinkParser;
pub use record::RequestRecord;
pub use state::{Attributes, ParseState};
pub use target::{Digest, HashAlgorithm, MetalinkTarget, ResolvedTarget};

use crate::error::MetalinkError;

/// Parses and validates a document that is already fully in memory.
///
/// # Errors
///
/// Returns [`MetalinkError::Parse`] or [`MetalinkError::Validation`].
pub fn resolve_document(
    document: &[u8],
    requested_file: &str,
) -> Result<ResolvedTarget, MetalinkError> {
    let mut parser = MetalinkParser::new(requested_file);
    parser.feed(document)?;
    Ok(parser.finish()?.finalize(requested_file)?)
}
