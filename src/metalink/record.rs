//! Accumulated fields of one in-flight parse, and the text router.

use tracing::{trace, warn};
use url::Url;

use super::state::ParseState;
use super::target::HashAlgorithm;

/// Everything the parser has extracted so far.
///
/// Owned by exactly one parse; dropped when that parse completes, fails or
/// is cancelled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestRecord {
    /// Any `<file name=...>` was seen, whatever its name.
    pub found_a_file_element: bool,
    /// The first `<file>` carrying the requested name was seen.
    pub found_target_file_element: bool,
    /// Value of `<size>`; zero when absent or unparseable.
    pub declared_size: u64,
    /// Algorithm of the most recent `<hash>`, if it was supported.
    pub hash_algorithm: Option<HashAlgorithm>,
    /// Whether the most recent `<hash>` named a supported algorithm.
    pub hash_algorithm_recognized: bool,
    /// Raw text of the last `<hash name="sha256">`.
    pub sha256_digest: Option<String>,
    /// Raw text of the last `<hash name="sha512">`.
    pub sha512_digest: Option<String>,
    /// Accepted mirrors in document order.
    pub candidate_urls: Vec<Url>,
}

impl RequestRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes character data to the field selected by `state`.
    ///
    /// Size and URL text is trimmed; digest text is kept exactly as
    /// received. Never fails: unusable text is dropped here and caught by
    /// validation.
    pub fn on_text(&mut self, state: &ParseState, text: &str) {
        match state {
            ParseState::InSize => {
                self.declared_size = text.trim().parse().unwrap_or(0);
                trace!(size = self.declared_size, "declared size");
            }
            ParseState::InHash => {
                if !self.hash_algorithm_recognized {
                    return;
                }
                match self.hash_algorithm {
                    Some(HashAlgorithm::Sha256) => self.sha256_digest = Some(text.to_string()),
                    Some(HashAlgorithm::Sha512) => self.sha512_digest = Some(text.to_string()),
                    None => {}
                }
            }
            ParseState::InUrl => match Url::parse(text.trim()) {
                Ok(url) => {
                    trace!(url = %url, "accepted mirror");
                    self.candidate_urls.push(url);
                }
                Err(error) => warn!(text, %error, "skipping unparseable mirror URL"),
            },
            _ => {}
        }
    }
}
