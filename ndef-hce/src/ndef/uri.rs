//! URI identifier codes (NFC Forum URI RTD, table 3)
//!
//! The first payload byte of a `U` record abbreviates a well-known prefix.

use super::NdefError;

/// Prefixes indexed by their identifier code. Code 0x00 means no abbreviation.
const PREFIXES: [&str; 36] = [
    "",
    "http://www.",
    "https://www.",
    "http://",
    "https://",
    "tel:",
    "mailto:",
    "ftp://anonymous:anonymous@",
    "ftp://ftp.",
    "ftps://",
    "sftp://",
    "smb://",
    "nfs://",
    "ftp://",
    "dav://",
    "news:",
    "telnet://",
    "imap:",
    "rtsp://",
    "urn:",
    "pop:",
    "sip:",
    "sips:",
    "tftp:",
    "btspp://",
    "btl2cap://",
    "btgoep://",
    "tcpobex://",
    "irdaobex://",
    "file://",
    "urn:epc:id:",
    "urn:epc:tag:",
    "urn:epc:pat:",
    "urn:epc:raw:",
    "urn:epc:",
    "urn:nfc:",
];

/// Split a URI into its identifier code and the remaining text
///
/// The longest matching prefix is used (so `https://www.` wins over
/// `https://`). URIs without a known prefix get code 0x00 and are kept whole.
pub fn abbreviate(uri: &str) -> (u8, &str) {
    PREFIXES
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, prefix)| uri.starts_with(*prefix))
        .max_by_key(|(_, prefix)| prefix.len())
        .map(|(code, prefix)| (code as u8, &uri[prefix.len()..]))
        .unwrap_or((0x00, uri))
}

/// Prefix text for an identifier code
pub fn prefix(code: u8) -> Result<&'static str, NdefError> {
    PREFIXES
        .get(code as usize)
        .copied()
        .ok_or(NdefError::UnknownUriCode(code))
}

/// Rebuild the full URI from an identifier code and the stored remainder
pub fn expand(code: u8, rest: &str) -> Result<String, NdefError> {
    let prefix = prefix(code)?;
    let mut uri = String::with_capacity(prefix.len() + rest.len());
    uri.push_str(prefix);
    uri.push_str(rest);
    Ok(uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_codes() {
        assert_eq!(abbreviate("http://www.example.com"), (0x01, "example.com"));
        assert_eq!(abbreviate("https://www.example.com"), (0x02, "example.com"));
        assert_eq!(abbreviate("http://example.com"), (0x03, "example.com"));
        assert_eq!(abbreviate("https://example.com/tag/AB12"), (0x04, "example.com/tag/AB12"));
        assert_eq!(abbreviate("tel:+15551234"), (0x05, "+15551234"));
        assert_eq!(abbreviate("mailto:a@b.c"), (0x06, "a@b.c"));
    }

    #[test]
    fn test_longest_prefix_wins() {
        assert_eq!(abbreviate("ftp://ftp.example.org"), (0x08, "example.org"));
        assert_eq!(abbreviate("ftp://example.org"), (0x0D, "example.org"));
        assert_eq!(abbreviate("urn:epc:id:sgtin"), (0x1E, "sgtin"));
        assert_eq!(abbreviate("urn:isbn:123"), (0x13, "isbn:123"));
    }

    #[test]
    fn test_no_prefix() {
        assert_eq!(abbreviate("geo:48.85,2.35"), (0x00, "geo:48.85,2.35"));
        assert_eq!(abbreviate("nfc://uid/04A1"), (0x00, "nfc://uid/04A1"));
        assert_eq!(abbreviate(""), (0x00, ""));
    }

    #[test]
    fn test_expand_reverses_abbreviate() {
        for uri in [
            "https://www.rust-lang.org",
            "http://example.com/x?y=1",
            "mailto:someone@example.com",
            "file:///tmp/a",
            "urn:nfc:sn:handover",
            "plain text",
        ] {
            let (code, rest) = abbreviate(uri);
            assert_eq!(expand(code, rest).unwrap(), uri);
        }
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(PREFIXES.len(), 0x24);
        assert!(matches!(expand(0x24, "x"), Err(NdefError::UnknownUriCode(0x24))));
    }
}
