//! Metalink documents and payloads with real digests.

use sha2::{Digest as _, Sha256, Sha512};

pub const REQUESTED_FILE: &str = "repomd.xml";

pub const PAYLOAD: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<repomd xmlns="http://linux.duke.edu/metadata/repo">
  <revision>1700000000</revision>
  <data type="primary"><location href="repodata/primary.xml.gz"/></data>
</repomd>
"#;

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[must_use]
pub fn sha512_hex(bytes: &[u8]) -> String {
    hex::encode(Sha512::digest(bytes))
}

/// A metalink listing [`PAYLOAD`] as [`REQUESTED_FILE`] on `mirrors`.
///
/// Includes a decoy file before the target, vendor elements, comments and
/// a non-HTTP mirror so parsing exercises the passthrough paths.
#[must_use]
pub fn metalink_document(mirrors: &[&str]) -> String {
    let urls: String = mirrors
        .iter()
        .map(|mirror| format!("        <url protocol=\"https\" preference=\"100\">{mirror}</url>\n"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE metalink>
<metalink version="3.0" xmlns="http://www.metalinker.org/" xmlns:mm0="http://fedorahosted.org/mirrormanager">
  <mm0:timestamp>1700000000</mm0:timestamp>
  <files>
    <file name="primary.xml.gz">
      <size>1</size>
      <resources><url protocol="https">https://decoy.example/primary.xml.gz</url></resources>
    </file>
    <file name="{REQUESTED_FILE}">
      <mm0:timestamp>1700000000</mm0:timestamp>
      <size>{size}</size>
      <verification>
        <hash name="md5">{md5_placeholder}</hash>
        <hash name="sha256">{sha256}</hash>
        <hash name="sha512">{sha512}</hash>
      </verification>
      <resources maxconnections="1">
        <url protocol="rsync" preference="100">rsync://rsync.example/repomd.xml</url>
        <!-- https mirrors follow -->
{urls}      </resources>
    </file>
  </files>
</metalink>
"#,
        size = PAYLOAD.len(),
        md5_placeholder = "0".repeat(32),
        sha256 = sha256_hex(PAYLOAD),
        sha512 = sha512_hex(PAYLOAD),
    )
}
