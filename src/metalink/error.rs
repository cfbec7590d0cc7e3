//! Error types for metalink parsing and validation.

use thiserror::Error;

use super::target::HashAlgorithm;

/// Errors raised while the document is being parsed.
///
/// Any of these aborts the whole resolution; nothing parsed so far is used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A `<url>` was reached before a nonzero `<size>`.
    #[error("no <size> element found or it is zero")]
    MissingSize,

    /// A `<url>` was reached before a `<hash>` with a supported algorithm.
    #[error("no <verification> element with a supported <hash name=...> found")]
    UnsupportedHash,

    /// A recognized element lacks the attribute it is defined by.
    #[error("element <{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        /// Element that was being opened.
        element: String,
        /// Name of the missing attribute.
        attribute: &'static str,
    },

    /// The markup itself could not be tokenized.
    #[error("malformed XML: {message}")]
    Xml {
        /// Tokenizer diagnostic.
        message: String,
    },

    /// Document bytes are not valid UTF-8.
    #[error("document is not valid UTF-8")]
    InvalidUtf8,

    /// A closing tag does not match the innermost open element.
    #[error("closing tag </{found}> does not match open element <{expected}>")]
    MismatchedEndTag {
        /// Innermost open element.
        expected: String,
        /// Name on the closing tag.
        found: String,
    },

    /// A closing tag appeared with no element open.
    #[error("closing tag </{found}> has no matching open element")]
    UnexpectedEndTag {
        /// Name on the closing tag.
        found: String,
    },

    /// Input ended in the middle of a tag, comment or CDATA section.
    #[error("document ended inside a tag")]
    TruncatedDocument,

    /// Input ended while an element was still open.
    #[error("document ended before <{name}> was closed")]
    UnclosedElement {
        /// Innermost element left open.
        name: String,
    },
}

impl ParseError {
    /// Creates a `MissingAttribute` error.
    #[must_use]
    pub fn missing_attribute(element: &str, attribute: &'static str) -> Self {
        Self::MissingAttribute {
            element: element.to_string(),
            attribute,
        }
    }

    /// Creates an `Xml` error from any tokenizer diagnostic.
    #[must_use]
    pub fn xml(message: impl ToString) -> Self {
        Self::Xml {
            message: message.to_string(),
        }
    }
}

/// Reasons a fully parsed document is not trusted.
///
/// Checked in declaration order; the first failing check is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The document has no `<file>` element at all.
    #[error("no <file> element found")]
    NoFileElement,

    /// `<file>` elements exist, but none carries the requested name.
    #[error("no <file name='{name}'> found")]
    RequestedFileNotFound {
        /// The requested file name.
        name: String,
    },

    /// Neither a SHA-256 nor a SHA-512 digest was declared.
    #[error("no <verification> hash for sha256 or sha512 found")]
    NoVerificationHash,

    /// A declared digest is not lowercase hex of the right length.
    #[error("invalid hash digest for {algorithm}")]
    MalformedDigest {
        /// Algorithm whose digest is malformed.
        algorithm: HashAlgorithm,
    },

    /// No `<url>` with an http/https protocol and a parseable URL survived.
    #[error("no <url protocol='http'> elements found")]
    NoAcceptableUrl,

    /// `<size>` was zeroed after the mirrors were accepted.
    #[error("declared <size> is zero")]
    ZeroSize,
}
