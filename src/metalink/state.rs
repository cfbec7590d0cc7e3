//! Element state machine for the metalink grammar.
//!
//! Only `metalink/files/file/{size,verification/hash,resources/url}` is
//! recognized. Every other element, and every subtree the parser decides
//! to reject (another file, an unsupported protocol), is swallowed in
//! [`ParseState::Passthrough`], which counts nesting so it knows which
//! closing tag ends the ignored subtree.

use tracing::trace;

use super::error::ParseError;
use super::record::RequestRecord;
use super::target::HashAlgorithm;

/// Attributes of a start tag, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    /// Creates an empty attribute list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// Value of the first attribute named `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Position of the parser in the recognized grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseState {
    /// Before `<metalink>`.
    Initial,
    /// Inside `<metalink>`.
    InMetalink,
    /// Inside `<files>`.
    InFiles,
    /// Inside the requested `<file>`.
    InFile,
    /// Inside `<size>`.
    InSize,
    /// Inside `<verification>`.
    InVerification,
    /// Inside `<hash>`.
    InHash,
    /// Inside `<resources>`.
    InResources,
    /// Inside an accepted `<url>`.
    InUrl,
    /// Ignoring a subtree.
    Passthrough {
        /// Elements opened inside the ignored subtree and not yet closed.
        depth: u32,
        /// State restored when the ignored subtree closes.
        resume_to: Box<ParseState>,
    },
    /// A parse error was raised; everything afterwards is ignored.
    Error,
}

impl ParseState {
    /// Starts ignoring the subtree opened by the current element.
    fn passthrough(self) -> Self {
        Self::Passthrough {
            depth: 0,
            resume_to: Box::new(self),
        }
    }

    /// Applies an element start to the state and record.
    ///
    /// Returns the state to continue in. An `Err` is fatal for the whole
    /// parse; callers should move to [`ParseState::Error`].
    ///
    /// # Errors
    ///
    /// - [`ParseError::MissingAttribute`] when `<file>`, `<hash>` or `<url>`
    ///   lacks its defining attribute
    /// - [`ParseError::MissingSize`] / [`ParseError::UnsupportedHash`] when a
    ///   `<url>` arrives before the file's size and digest are known
    pub fn on_element_start(
        self,
        record: &mut RequestRecord,
        requested_file: &str,
        name: &str,
        attributes: &Attributes,
    ) -> Result<Self, ParseError> {
        let next = match (self, name) {
            (Self::Passthrough { depth, resume_to }, _) => Self::Passthrough {
                depth: depth + 1,
                resume_to,
            },
            (Self::Error, _) => Self::Error,
            (Self::Initial, "metalink") => Self::InMetalink,
            (Self::InMetalink, "files") => Self::InFiles,
            (Self::InFiles, "file") => {
                if record.found_target_file_element {
                    Self::InFiles.passthrough()
                } else {
                    let file_name = attributes
                        .get("name")
                        .ok_or_else(|| ParseError::missing_attribute(name, "name"))?;
                    record.found_a_file_element = true;
                    if file_name == requested_file {
                        record.found_target_file_element = true;
                        Self::InFile
                    } else {
                        trace!(file_name, "skipping other file");
                        Self::InFiles.passthrough()
                    }
                }
            }
            (Self::InFile, "size") => Self::InSize,
            (Self::InFile, "verification") => Self::InVerification,
            (Self::InFile, "resources") => Self::InResources,
            (Self::InVerification, "hash") => {
                let algorithm_name = attributes
                    .get("name")
                    .ok_or_else(|| ParseError::missing_attribute(name, "name"))?;
                record.hash_algorithm = HashAlgorithm::from_name(algorithm_name);
                record.hash_algorithm_recognized = record.hash_algorithm.is_some();
                Self::InHash
            }
            (Self::InResources, "url") => {
                if record.declared_size == 0 {
                    return Err(ParseError::MissingSize);
                }
                if !record.hash_algorithm_recognized {
                    return Err(ParseError::UnsupportedHash);
                }
                let protocol = attributes
                    .get("protocol")
                    .ok_or_else(|| ParseError::missing_attribute(name, "protocol"))?;
                if matches!(protocol, "http" | "https") {
                    Self::InUrl
                } else {
                    trace!(protocol, "skipping non-HTTP mirror");
                    Self::InResources.passthrough()
                }
            }
            (state, _) => state.passthrough(),
        };
        trace!(element = name, state = ?next, "element start");
        Ok(next)
    }

    /// Applies an element end, returning to the enclosing state.
    #[must_use]
    pub fn on_element_end(self) -> Self {
        match self {
            Self::Passthrough { depth: 0, resume_to } => *resume_to,
            Self::Passthrough { depth, resume_to } => Self::Passthrough {
                depth: depth - 1,
                resume_to,
            },
            Self::InUrl => Self::InResources,
            Self::InHash => Self::InVerification,
            Self::InSize | Self::InVerification | Self::InResources => Self::InFile,
            Self::InFile => Self::InFiles,
            Self::InFiles => Self::InMetalink,
            Self::InMetalink | Self::Initial => Self::Initial,
            Self::Error => Self::Error,
        }
    }
}
