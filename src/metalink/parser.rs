//! Push parser driving the element state machine from raw bytes.
//!
//! [`MetalinkParser::feed`] accepts chunks of any size, split anywhere;
//! [`MetalinkParser::finish`] ends the document and hands back the
//! accumulated [`RequestRecord`] for validation.

use std::mem;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::trace;

use super::error::ParseError;
use super::framing::{MarkupFramer, Unit};
use super::record::RequestRecord;
use super::state::{Attributes, ParseState};

/// Incremental parser for one metalink document.
#[derive(Debug)]
pub struct MetalinkParser {
    requested_file: String,
    framer: MarkupFramer,
    state: ParseState,
    record: RequestRecord,
    open_elements: Vec<String>,
    text: String,
    failure: Option<ParseError>,
}

impl MetalinkParser {
    /// Creates a parser looking for `<file name="{requested_file}">`.
    #[must_use]
    pub fn new(requested_file: impl Into<String>) -> Self {
        Self {
            requested_file: requested_file.into(),
            framer: MarkupFramer::new(),
            state: ParseState::Initial,
            record: RequestRecord::new(),
            open_elements: Vec::new(),
            text: String::new(),
            failure: None,
        }
    }

    /// Current grammar state.
    #[must_use]
    pub fn state(&self) -> &ParseState {
        &self.state
    }

    /// Fields accumulated so far.
    #[must_use]
    pub fn record(&self) -> &RequestRecord {
        &self.record
    }

    /// Feeds the next chunk of the document.
    ///
    /// Complete units are processed immediately; an incomplete tail is kept
    /// for the next call.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParseError`] raised. The parser stays failed and
    /// reports the same error on every later call.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), ParseError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.framer.feed(chunk);
        while let Some(unit) = self.framer.next_unit() {
            if let Err(error) = self.process_unit(unit) {
                self.state = ParseState::Error;
                self.failure = Some(error.clone());
                return Err(error);
            }
        }
        Ok(())
    }

    /// Ends the document and returns the accumulated record.
    ///
    /// # Errors
    ///
    /// Returns an earlier feed error, [`ParseError::TruncatedDocument`] if
    /// input stopped inside a tag, or [`ParseError::UnclosedElement`] if an
    /// element was never closed.
    pub fn finish(mut self) -> Result<RequestRecord, ParseError> {
        if let Some(error) = self.failure.take() {
            return Err(error);
        }
        if let Some(trailing) = self.framer.finish()? {
            self.process_unit(Unit::Text(trailing))?;
        }
        if let Some(name) = self.open_elements.pop() {
            return Err(ParseError::UnclosedElement { name });
        }
        self.flush_text();
        Ok(self.record)
    }

    fn process_unit(&mut self, unit: Unit) -> Result<(), ParseError> {
        match unit {
            Unit::Text(bytes) => {
                let raw = std::str::from_utf8(&bytes).map_err(|_| ParseError::InvalidUtf8)?;
                let text = quick_xml::escape::unescape(raw).map_err(|e| ParseError::xml(e))?;
                self.text.push_str(&text);
                Ok(())
            }
            Unit::Markup(bytes) => self.process_markup(&bytes),
        }
    }

    fn process_markup(&mut self, bytes: &[u8]) -> Result<(), ParseError> {
        let mut reader = Reader::from_reader(bytes);
        // End tags arrive one per reader; nesting is checked by `end_element`.
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        match reader.read_event().map_err(|e| ParseError::xml(e))? {
            Event::Start(tag) => {
                let (name, attributes) = decode_start(&tag)?;
                self.start_element(name, &attributes)
            }
            Event::Empty(tag) => {
                let (name, attributes) = decode_start(&tag)?;
                self.start_element(name.clone(), &attributes)?;
                self.end_element(name)
            }
            Event::End(tag) => {
                let name = decode_name(tag.name().as_ref())?;
                self.end_element(name)
            }
            Event::CData(data) => {
                let text = std::str::from_utf8(&data).map_err(|_| ParseError::InvalidUtf8)?;
                self.text.push_str(text);
                Ok(())
            }
            // Declarations, comments, processing instructions and doctypes
            // carry nothing this grammar needs.
            _ => Ok(()),
        }
    }

    fn start_element(&mut self, name: String, attributes: &Attributes) -> Result<(), ParseError> {
        self.flush_text();
        let state = mem::replace(&mut self.state, ParseState::Error);
        self.state =
            state.on_element_start(&mut self.record, &self.requested_file, &name, attributes)?;
        self.open_elements.push(name);
        Ok(())
    }

    fn end_element(&mut self, name: String) -> Result<(), ParseError> {
        self.flush_text();
        match self.open_elements.pop() {
            Some(open) if open == name => {}
            Some(open) => {
                return Err(ParseError::MismatchedEndTag {
                    expected: open,
                    found: name,
                });
            }
            None => return Err(ParseError::UnexpectedEndTag { found: name }),
        }
        let state = mem::replace(&mut self.state, ParseState::Error);
        self.state = state.on_element_end();
        trace!(element = %name, state = ?self.state, "element end");
        Ok(())
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.record.on_text(&self.state, &self.text);
            self.text.clear();
        }
    }
}

fn decode_name(raw: &[u8]) -> Result<String, ParseError> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|_| ParseError::InvalidUtf8)
}

fn decode_start(tag: &BytesStart<'_>) -> Result<(String, Attributes), ParseError> {
    let name = decode_name(tag.name().as_ref())?;
    let mut attributes = Attributes::new();
    for attribute in tag.attributes() {
        let attribute = attribute.map_err(|e| ParseError::xml(e))?;
        let key = decode_name(attribute.key.as_ref())?;
        let value = attribute
            .unescape_value()
            .map_err(|e| ParseError::xml(e))?;
        attributes.push(key, value.into_owned());
    }
    Ok((name, attributes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::metalink::error::ValidationError;
    use crate::metalink::target::HashAlgorithm;

    const REQUESTED: &str = "repomd.xml";

    fn sha256_hex() -> String {
        "0123456789abcdef".repeat(4)
    }

    fn sha512_hex() -> String {
        "fedcba9876543210".repeat(8)
    }

    fn sample_document() -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<metalink version="3.0" xmlns="http://www.metalinker.org/" type="dynamic">
 <!-- generated by a mirror manager -->
 <files>
  <file name="other.xml">
   <size>1</size>
   <resources><url protocol="http">http://wrong.example/other.xml</url></resources>
  </file>
  <file name="repomd.xml">
   <mm0:timestamp>1700000000</mm0:timestamp>
   <size>4242</size>
   <verification>
    <hash name="md5">d41d8cd98f00b204e9800998ecf8427e</hash>
    <hash name="sha256">{}</hash>
    <hash name="sha512">{}</hash>
   </verification>
   <resources maxconnections="1">
    <url protocol="ftp" type="ftp">ftp://ftp.example/pub/repomd.xml</url>
    <url protocol="https" type="https" location="US" preference="100">https://mirror-a.example/pub/repomd.xml</url>
    <url protocol="http" type="http">http://mirror-b.example/pub/repomd.xml?a=1&amp;b=2</url>
   </resources>
  </file>
 </files>
</metalink>
"#,
            sha256_hex(),
            sha512_hex()
        )
    }

    fn parse_chunks(chunks: &[&[u8]]) -> Result<RequestRecord, ParseError> {
        let mut parser = MetalinkParser::new(REQUESTED);
        for chunk in chunks {
            parser.feed(chunk)?;
        }
        parser.finish()
    }

    fn parse(document: &str) -> Result<RequestRecord, ParseError> {
        parse_chunks(&[document.as_bytes()])
    }

    #[test]
    fn test_sample_document_resolves() {
        let record = parse(&sample_document()).unwrap();
        assert!(record.found_a_file_element);
        assert!(record.found_target_file_element);
        assert_eq!(record.declared_size, 4242);
        assert_eq!(record.sha256_digest, Some(sha256_hex()));
        assert_eq!(record.sha512_digest, Some(sha512_hex()));

        let resolved = record.finalize(REQUESTED).unwrap();
        assert_eq!(
            resolved.selected_uri.as_str(),
            "https://mirror-a.example/pub/repomd.xml"
        );
        assert_eq!(resolved.digest.algorithm, HashAlgorithm::Sha512);
        assert_eq!(resolved.mirrors.len(), 2, "ftp mirror must be skipped");
        assert_eq!(
            resolved.mirrors[1].as_str(),
            "http://mirror-b.example/pub/repomd.xml?a=1&b=2"
        );
    }

    #[test]
    fn test_every_split_offset_gives_identical_record() {
        let document = sample_document();
        let bytes = document.as_bytes();
        let expected = parse(&document).unwrap();

        for split in 0..=bytes.len() {
            let record = parse_chunks(&[&bytes[..split], &bytes[split..]]).unwrap();
            assert_eq!(record, expected, "split at byte {split}");
        }
    }

    #[test]
    fn test_end_tags_arriving_alone_close_their_elements() {
        let record = parse_chunks(&[
            &b"<metalink><files><file name=\"repomd.xml\"><size>7"[..],
            &b"</size>"[..],
            &b"</file>"[..],
            &b"</files></metalink>"[..],
        ])
        .unwrap();
        assert_eq!(record.declared_size, 7);
        assert!(record.found_target_file_element);
    }

    #[test]
    fn test_whitespace_padded_digest_is_malformed() {
        let document = format!(
            r#"<metalink><files><file name="repomd.xml">
  <size>10</size>
  <verification><hash name="sha256">
    {}
  </hash></verification>
  <resources><url protocol="https">https://a.example/x</url></resources>
</file></files></metalink>"#,
            sha256_hex()
        );
        let record = parse(&document).unwrap();
        assert_eq!(
            record.finalize(REQUESTED),
            Err(ValidationError::MalformedDigest {
                algorithm: HashAlgorithm::Sha256
            })
        );
    }

    #[test]
    fn test_byte_at_a_time_gives_identical_record() {
        let document = sample_document();
        let chunks: Vec<&[u8]> = document.as_bytes().chunks(1).collect();
        assert_eq!(parse_chunks(&chunks).unwrap(), parse(&document).unwrap());
    }

    #[test]
    fn test_empty_chunks_are_harmless() {
        let document = sample_document();
        let bytes = document.as_bytes();
        let record = parse_chunks(&[&b""[..], &bytes[..10], &b""[..], &bytes[10..], &b""[..]]).unwrap();
        assert_eq!(record, parse(&document).unwrap());
    }

    #[test]
    fn test_duplicate_target_file_is_ignored() {
        let document = format!(
            r#"<metalink><files>
  <file name="repomd.xml">
   <size>10</size>
   <verification><hash name="sha256">{}</hash></verification>
   <resources><url protocol="https">https://first.example/repomd.xml</url></resources>
  </file>
  <file name="repomd.xml">
   <size>99</size>
   <verification><hash name="sha256">{}</hash></verification>
   <resources><url protocol="https">https://second.example/repomd.xml</url></resources>
  </file>
</files></metalink>"#,
            sha256_hex(),
            "f".repeat(64)
        );
        let record = parse(&document).unwrap();
        assert_eq!(record.declared_size, 10);
        assert_eq!(record.sha256_digest, Some(sha256_hex()));
        assert_eq!(record.candidate_urls.len(), 1);
        assert_eq!(
            record.candidate_urls[0].as_str(),
            "https://first.example/repomd.xml"
        );
    }

    #[test]
    fn test_resources_before_size_is_fatal() {
        let document = r#"<metalink><files><file name="repomd.xml">
  <resources><url protocol="https">https://a.example/x</url></resources>
  <size>10</size>
</file></files></metalink>"#;
        assert_eq!(parse(document), Err(ParseError::MissingSize));
    }

    #[test]
    fn test_zero_size_is_fatal_at_first_url() {
        let document = format!(
            r#"<metalink><files><file name="repomd.xml">
  <size>0</size>
  <verification><hash name="sha256">{}</hash></verification>
  <resources><url protocol="https">https://a.example/x</url></resources>
</file></files></metalink>"#,
            sha256_hex()
        );
        assert_eq!(parse(&document), Err(ParseError::MissingSize));
    }

    #[test]
    fn test_unsupported_hash_only_is_fatal_at_first_url() {
        let document = r#"<metalink><files><file name="repomd.xml">
  <size>10</size>
  <verification><hash name="md5">d41d8cd98f00b204e9800998ecf8427e</hash></verification>
  <resources><url protocol="https">https://a.example/x</url></resources>
</file></files></metalink>"#;
        assert_eq!(parse(document), Err(ParseError::UnsupportedHash));
    }

    #[test]
    fn test_only_ftp_mirror_yields_no_acceptable_url() {
        let document = format!(
            r#"<metalink><files><file name="repomd.xml">
  <size>10</size>
  <verification><hash name="sha256">{}</hash></verification>
  <resources><url protocol="ftp">ftp://a.example/x</url></resources>
</file></files></metalink>"#,
            sha256_hex()
        );
        let record = parse(&document).unwrap();
        assert_eq!(
            record.finalize(REQUESTED),
            Err(ValidationError::NoAcceptableUrl)
        );
    }

    #[test]
    fn test_character_references_and_cdata_in_text() {
        let document = format!(
            r#"<metalink><files><file name="repomd.xml">
  <size>4&#50;</size>
  <verification><hash name="sha256">{}</hash></verification>
  <resources><url protocol="https"><![CDATA[https://a.example/x?y=1&z=2]]></url></resources>
</file></files></metalink>"#,
            sha256_hex()
        );
        let record = parse(&document).unwrap();
        assert_eq!(record.declared_size, 42);
        assert_eq!(record.candidate_urls[0].as_str(), "https://a.example/x?y=1&z=2");
    }

    #[test]
    fn test_empty_elements_are_opened_and_closed() {
        let document = r#"<metalink><files><file name="repomd.xml"><size/><verification/></file></files></metalink>"#;
        let record = parse(document).unwrap();
        assert!(record.found_target_file_element);
        assert_eq!(record.declared_size, 0);
    }

    #[test]
    fn test_mismatched_end_tag() {
        assert_eq!(
            parse("<metalink><files></metalink>"),
            Err(ParseError::MismatchedEndTag {
                expected: "files".to_string(),
                found: "metalink".to_string(),
            })
        );
    }

    #[test]
    fn test_unexpected_end_tag() {
        assert_eq!(
            parse("</metalink>"),
            Err(ParseError::UnexpectedEndTag {
                found: "metalink".to_string()
            })
        );
    }

    #[test]
    fn test_unclosed_element_at_end() {
        assert_eq!(
            parse("<metalink><files>"),
            Err(ParseError::UnclosedElement {
                name: "files".to_string()
            })
        );
    }

    #[test]
    fn test_truncated_inside_tag() {
        assert_eq!(
            parse("<metalink><files></files></meta"),
            Err(ParseError::TruncatedDocument)
        );
    }

    #[test]
    fn test_errors_are_sticky() {
        let mut parser = MetalinkParser::new(REQUESTED);
        let error = parser.feed(b"<a></b>").unwrap_err();
        assert_eq!(parser.state(), &ParseState::Error);
        assert_eq!(parser.feed(b"<metalink>"), Err(error.clone()));
        assert_eq!(parser.finish(), Err(error));
    }

    #[test]
    fn test_invalid_utf8_text() {
        assert_eq!(
            parse_chunks(&[&b"<metalink>\xff\xfe</metalink>"[..]]),
            Err(ParseError::InvalidUtf8)
        );
    }

    #[test]
    fn test_empty_document_yields_empty_record() {
        let record = parse("").unwrap();
        assert_eq!(record, RequestRecord::new());
        assert_eq!(
            record.finalize(REQUESTED),
            Err(ValidationError::NoFileElement)
        );
    }
}
