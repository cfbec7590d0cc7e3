//! Caller-facing request and result types.

use std::fmt;

use url::Url;

/// Digest algorithms accepted from `<hash name=...>`.
///
/// Anything weaker than SHA-256 is treated as unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-256, 64 hex characters.
    Sha256,
    /// SHA-512, 128 hex characters.
    Sha512,
}

impl HashAlgorithm {
    /// Maps a `<hash name=...>` attribute value to a known algorithm.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sha256" => Some(Self::Sha256),
            "sha512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// The attribute value used for this algorithm in metalink documents.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Length of a lowercase hex digest for this algorithm.
    #[must_use]
    pub fn hex_len(self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A declared digest: algorithm plus lowercase hex string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    /// Algorithm the hex value was declared for.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex digest, validated for length and alphabet.
    pub hex: String,
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

/// What the caller wants out of a metalink document.
///
/// Read-only for the parsing machinery; one target may be resolved any
/// number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetalinkTarget {
    /// Location of the metalink document itself.
    pub uri: Url,
    /// `<file name=...>` to look for; matched exactly.
    pub requested_file: String,
    /// Upper bound on the metalink document size in bytes.
    pub max_size: u64,
}

impl MetalinkTarget {
    /// Creates a new target description.
    #[must_use]
    pub fn new(uri: Url, requested_file: impl Into<String>, max_size: u64) -> Self {
        Self {
            uri,
            requested_file: requested_file.into(),
            max_size,
        }
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// First accepted mirror in document order.
    pub selected_uri: Url,
    /// Size declared by `<size>`, always nonzero.
    pub declared_size: u64,
    /// Strongest valid digest (SHA-512 wins over SHA-256).
    pub digest: Digest,
    /// Every accepted mirror in document order; `mirrors[0] == selected_uri`.
    pub mirrors: Vec<Url>,
}
