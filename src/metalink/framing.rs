//! Incremental framing of raw document bytes into whole markup units.
//!
//! Chunks from the network split tags, attribute values, text runs and
//! even multi-byte UTF-8 sequences at arbitrary offsets. The framer keeps
//! the unfinished tail buffered and only hands out units that are
//! complete: a whole `<...>` construct, or a whole run of text ending at
//! the next `<`.

use super::error::ParseError;

const COMMENT_OPEN: &[u8] = b"<!--";
const COMMENT_CLOSE: &[u8] = b"-->";
const CDATA_OPEN: &[u8] = b"<![CDATA[";
const CDATA_CLOSE: &[u8] = b"]]>";
const PI_OPEN: &[u8] = b"<?";
const PI_CLOSE: &[u8] = b"?>";

/// A complete unit cut from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    /// A tag, comment, CDATA section, processing instruction or doctype,
    /// including its angle brackets.
    Markup(Vec<u8>),
    /// Character data between two markup units, still entity-escaped.
    Text(Vec<u8>),
}

/// What is known about the unit starting at the read position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Scan {
    /// Nothing examined yet.
    #[default]
    Start,
    /// Character data, ending at the next `<`.
    Text,
    /// Comment, CDATA section or processing instruction, ending at `close`.
    Delimited { close: &'static [u8] },
    /// Tag or doctype, ending at the first `>` outside quotes and brackets.
    Tag {
        quote: Option<u8>,
        bracket_depth: usize,
    },
}

/// Buffers input until complete units can be cut from it.
///
/// Scanning resumes where the previous call stopped, so a unit split over
/// many chunks is examined once overall rather than once per chunk.
#[derive(Debug, Default)]
pub struct MarkupFramer {
    buffer: Vec<u8>,
    consumed: usize,
    /// Bytes of the current unit already examined.
    scanned: usize,
    scan: Scan,
}

impl MarkupFramer {
    /// Creates an empty framer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk of input.
    pub fn feed(&mut self, chunk: &[u8]) {
        if self.consumed > 0 {
            self.buffer.drain(..self.consumed);
            self.consumed = 0;
        }
        self.buffer.extend_from_slice(chunk);
    }

    /// Number of buffered bytes not yet handed out.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len() - self.consumed
    }

    /// Cuts the next complete unit, if the buffer holds one.
    pub fn next_unit(&mut self) -> Option<Unit> {
        let rest = &self.buffer[self.consumed..];
        if rest.is_empty() {
            return None;
        }
        if self.scan == Scan::Start {
            let (scan, scanned) = classify(rest)?;
            self.scan = scan;
            self.scanned = scanned;
        }

        let len = match &mut self.scan {
            Scan::Start => return None,
            Scan::Text => match rest[self.scanned..].iter().position(|&b| b == b'<') {
                Some(pos) => self.scanned + pos,
                None => {
                    self.scanned = rest.len();
                    return None;
                }
            },
            Scan::Delimited { close } => {
                let close: &[u8] = close;
                match find(rest, close, self.scanned) {
                    Some(pos) => pos + close.len(),
                    None => {
                        // The closing token may straddle the next chunk boundary.
                        self.scanned = self.scanned.max(rest.len().saturating_sub(close.len() - 1));
                        return None;
                    }
                }
            }
            Scan::Tag {
                quote,
                bracket_depth,
            } => {
                let mut end = None;
                for (index, &byte) in rest.iter().enumerate().skip(self.scanned) {
                    match (*quote, byte) {
                        (Some(open), _) if byte == open => *quote = None,
                        (Some(_), _) => {}
                        (None, b'"' | b'\'') => *quote = Some(byte),
                        (None, b'[') => *bracket_depth += 1,
                        (None, b']') => *bracket_depth = bracket_depth.saturating_sub(1),
                        (None, b'>') if *bracket_depth == 0 => {
                            end = Some(index + 1);
                            break;
                        }
                        (None, _) => {}
                    }
                }
                match end {
                    Some(len) => len,
                    None => {
                        self.scanned = rest.len();
                        return None;
                    }
                }
            }
        };

        let bytes = rest[..len].to_vec();
        let unit = if self.scan == Scan::Text {
            Unit::Text(bytes)
        } else {
            Unit::Markup(bytes)
        };
        self.consumed += len;
        self.scan = Scan::Start;
        self.scanned = 0;
        Some(unit)
    }

    /// Drains whatever is left at end of input.
    ///
    /// Trailing text is returned; anything still inside `<...>` is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::TruncatedDocument`] if the input ended inside
    /// a markup construct.
    pub fn finish(&mut self) -> Result<Option<Vec<u8>>, ParseError> {
        let rest = self.buffer.split_off(self.consumed);
        self.buffer.clear();
        self.consumed = 0;
        self.scan = Scan::Start;
        self.scanned = 0;
        match rest.first() {
            None => Ok(None),
            Some(b'<') => Err(ParseError::TruncatedDocument),
            Some(_) => Ok(Some(rest)),
        }
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

/// True while `bytes` is too short to tell whether it opens `token`.
fn could_still_open(bytes: &[u8], token: &[u8]) -> bool {
    bytes.len() < token.len() && token.starts_with(bytes)
}

/// Decides what kind of unit starts at `bytes[0]` and how many of its
/// bytes need no further scanning, or `None` if more input is needed.
fn classify(bytes: &[u8]) -> Option<(Scan, usize)> {
    if bytes[0] != b'<' {
        return Some((Scan::Text, 0));
    }
    if could_still_open(bytes, COMMENT_OPEN) || could_still_open(bytes, CDATA_OPEN) {
        return None;
    }
    let delimited = [
        (COMMENT_OPEN, COMMENT_CLOSE),
        (CDATA_OPEN, CDATA_CLOSE),
        (PI_OPEN, PI_CLOSE),
    ];
    for (open, close) in delimited {
        if bytes.starts_with(open) {
            return Some((Scan::Delimited { close }, open.len()));
        }
    }
    Some((
        Scan::Tag {
            quote: None,
            bracket_depth: 0,
        },
        1,
    ))
}
