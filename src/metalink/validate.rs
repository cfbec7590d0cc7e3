//! End-of-document checks deciding whether a parsed record is trusted.

use super::error::ValidationError;
use super::record::RequestRecord;
use super::target::{Digest, HashAlgorithm, ResolvedTarget};

/// Returns true if `value` is exactly `expected_len` lowercase hex digits.
fn is_lower_hex(value: &str, expected_len: usize) -> bool {
    value.len() == expected_len && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn checked_digest(
    value: Option<String>,
    algorithm: HashAlgorithm,
) -> Result<Option<Digest>, ValidationError> {
    match value {
        Some(hex) if is_lower_hex(&hex, algorithm.hex_len()) => Ok(Some(Digest { algorithm, hex })),
        Some(_) => Err(ValidationError::MalformedDigest { algorithm }),
        None => Ok(None),
    }
}

impl RequestRecord {
    /// Runs the validation gate over a completely parsed document.
    ///
    /// Consumes the record: a record is validated at most once.
    ///
    /// # Errors
    ///
    /// Returns the first failing check, in this order: no `<file>` at all,
    /// requested file missing, no digest, malformed digest (SHA-256 checked
    /// before SHA-512), no accepted mirror, zero size.
    pub fn finalize(self, requested_file: &str) -> Result<ResolvedTarget, ValidationError> {
        if !self.found_a_file_element {
            return Err(ValidationError::NoFileElement);
        }
        if !self.found_target_file_element {
            return Err(ValidationError::RequestedFileNotFound {
                name: requested_file.to_string(),
            });
        }
        if self.sha256_digest.is_none() && self.sha512_digest.is_none() {
            return Err(ValidationError::NoVerificationHash);
        }
        let sha256 = checked_digest(self.sha256_digest, HashAlgorithm::Sha256)?;
        let sha512 = checked_digest(self.sha512_digest, HashAlgorithm::Sha512)?;

        let mut mirrors = self.candidate_urls.into_iter();
        let Some(selected_uri) = mirrors.next() else {
            return Err(ValidationError::NoAcceptableUrl);
        };
        if self.declared_size == 0 {
            return Err(ValidationError::ZeroSize);
        }

        let digest = match (sha512, sha256) {
            (Some(digest), _) | (None, Some(digest)) => digest,
            (None, None) => return Err(ValidationError::NoVerificationHash),
        };

        Ok(ResolvedTarget {
            mirrors: std::iter::once(selected_uri.clone()).chain(mirrors).collect(),
            selected_uri,
            declared_size: self.declared_size,
            digest,
        })
    }
}
