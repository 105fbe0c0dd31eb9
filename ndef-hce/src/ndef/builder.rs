//! Ready-to-serve NDEF files for authored tags
//!
//! Every builder returns the wrapped file (NLEN + one short record).

use super::vcard::{VCard, VCARD_MIME};
use super::{file, NdefError, NdefRecord};
use log::debug;

/// Language code used for authored text records
pub const DEFAULT_LANGUAGE: &str = "en";

/// Kinds of single-value content a tag can be authored from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Url,
    Text,
    Phone,
    Email,
}

impl MessageKind {
    /// Build the NDEF file for `content` of this kind
    pub fn build(self, content: &str) -> Result<Vec<u8>, NdefError> {
        match self {
            MessageKind::Url => url_message(content),
            MessageKind::Text => text_message(content),
            MessageKind::Phone => phone_message(content),
            MessageKind::Email => email_message(content),
        }
    }
}

impl std::str::FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "url" | "uri" => Ok(MessageKind::Url),
            "text" => Ok(MessageKind::Text),
            "phone" | "tel" => Ok(MessageKind::Phone),
            "email" | "mail" => Ok(MessageKind::Email),
            other => Err(format!("unknown message kind: {}", other)),
        }
    }
}

/// Wrap a single record into an NDEF file
pub fn single_record_file(record: &NdefRecord) -> Result<Vec<u8>, NdefError> {
    let file = file::wrap(&record.encode()?)?;
    debug!("Built NDEF file: {} bytes", file.len());
    Ok(file)
}

/// URI record; a bare host gets `https://` in front
pub fn url_message(url: &str) -> Result<Vec<u8>, NdefError> {
    let url = url.trim();
    let full = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };
    single_record_file(&NdefRecord::Uri(full))
}

/// UTF-8 text record in the default language
pub fn text_message(text: &str) -> Result<Vec<u8>, NdefError> {
    single_record_file(&NdefRecord::text(DEFAULT_LANGUAGE, text))
}

/// `tel:` URI record; everything but digits and `+` is dropped
pub fn phone_message(phone: &str) -> Result<Vec<u8>, NdefError> {
    let digits: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    single_record_file(&NdefRecord::Uri(format!("tel:{}", digits)))
}

/// `mailto:` URI record
pub fn email_message(email: &str) -> Result<Vec<u8>, NdefError> {
    let email = email.trim();
    let uri = if email.starts_with("mailto:") {
        email.to_string()
    } else {
        format!("mailto:{}", email)
    };
    single_record_file(&NdefRecord::Uri(uri))
}

/// `text/vcard` MIME record
pub fn contact_message(card: &VCard) -> Result<Vec<u8>, NdefError> {
    single_record_file(&NdefRecord::mime(VCARD_MIME, card.render().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(file: &[u8]) -> NdefRecord {
        NdefRecord::decode(file::unwrap(file).unwrap()).unwrap()
    }

    #[test]
    fn test_url_defaults_to_https() {
        let file = url_message("example.com/tag/AB12").unwrap();
        assert_eq!(decode(&file), NdefRecord::uri("https://example.com/tag/AB12"));
        assert_eq!(file[6], 0x04);

        let file = url_message("http://www.example.com").unwrap();
        assert_eq!(decode(&file), NdefRecord::uri("http://www.example.com"));
    }

    #[test]
    fn test_text_message() {
        let file = text_message("hi").unwrap();
        assert_eq!(file, vec![0x00, 0x09, 0xD1, 0x01, 0x05, 0x54, 0x02, b'e', b'n', b'h', b'i']);
    }

    #[test]
    fn test_phone_is_cleaned() {
        let file = phone_message("+1 (555) 123-4567").unwrap();
        assert_eq!(decode(&file), NdefRecord::uri("tel:+15551234567"));
        assert_eq!(file[6], 0x05);
    }

    #[test]
    fn test_email_prefix() {
        assert_eq!(
            decode(&email_message(" user@example.com ").unwrap()),
            NdefRecord::uri("mailto:user@example.com")
        );
        assert_eq!(
            decode(&email_message("mailto:user@example.com").unwrap()),
            NdefRecord::uri("mailto:user@example.com")
        );
    }

    #[test]
    fn test_contact_message() {
        let card = VCard::new("Ada", "+44", "");
        let file = contact_message(&card).unwrap();
        assert_eq!(file[2], 0xD2);
        match decode(&file) {
            NdefRecord::Mime { mime_type, payload } => {
                assert_eq!(mime_type, VCARD_MIME);
                let parsed = VCard::parse(std::str::from_utf8(&payload).unwrap());
                assert_eq!(parsed, card);
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("URL".parse::<MessageKind>().unwrap(), MessageKind::Url);
        assert_eq!("tel".parse::<MessageKind>().unwrap(), MessageKind::Phone);
        assert!("vcard".parse::<MessageKind>().is_err());
    }
}
