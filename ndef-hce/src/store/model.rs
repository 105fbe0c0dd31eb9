//! Stored tag records
//!
//! These structures are what the JSON tag store persists. Byte fields are
//! base64 strings in the JSON document.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ndef::record::rtd;
use crate::ndef::vcard::VCard;
use crate::ndef::{file, parse_message, Tnf};

/// Custom serde module for base64 encoding of optional byte vectors
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Deserialize::deserialize(deserializer)?;
        match s {
            Some(s) if !s.is_empty() => STANDARD
                .decode(s.trim())
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

/// Identifier of a stored tag
///
/// Either the hex UID of a scanned tag or an artificial `AR...` identifier
/// for tags authored on the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(String);

impl TagId {
    pub const ARTIFICIAL_PREFIX: &'static str = "AR";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh identifier for an authored tag: `AR` + 14 upper-case hex digits
    pub fn generate_artificial() -> Self {
        let mut rng = rand::thread_rng();
        let digits: String = (0..14)
            .map(|_| char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
            .collect();
        Self(format!("{}{}", Self::ARTIFICIAL_PREFIX, digits.to_ascii_uppercase()))
    }

    pub fn is_artificial(&self) -> bool {
        self.0.starts_with(Self::ARTIFICIAL_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for TagId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TagId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// What the first record of a stored NDEF message holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TagType {
    #[default]
    Unknown,
    NdefText,
    NdefUri,
    NdefSmartPoster,
    NdefVcard,
}

impl TagType {
    /// Classify a wrapped NDEF file by its first record
    pub fn detect(ndef_file: &[u8]) -> Self {
        let Ok(message) = file::unwrap(ndef_file) else {
            return TagType::Unknown;
        };
        let Some(first) = parse_message(message).ok().and_then(|r| r.into_iter().next()) else {
            return TagType::Unknown;
        };
        match (first.header.tnf, first.record_type.as_slice()) {
            (Tnf::WellKnown, rtd::TEXT) => TagType::NdefText,
            (Tnf::WellKnown, rtd::URI) => TagType::NdefUri,
            (Tnf::WellKnown, rtd::SMART_POSTER) => TagType::NdefSmartPoster,
            (Tnf::Media, mime) => {
                let mime = String::from_utf8_lossy(mime).to_ascii_lowercase();
                if mime.contains("vcard") || mime.contains("vcf") {
                    TagType::NdefVcard
                } else {
                    TagType::Unknown
                }
            }
            _ => TagType::Unknown,
        }
    }
}

/// A tag captured from a reader or authored on the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagData {
    pub uid: TagId,
    #[serde(default = "default_name")]
    pub name: String,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default, rename = "type")]
    pub tag_type: TagType,
    /// Wrapped NDEF file (NLEN + message)
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Option::is_none")]
    pub ndef_message: Option<Vec<u8>>,
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tech_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

/// Placeholder name for tags saved without one
pub const DEFAULT_NAME: &str = "No name";

/// Tech list advertised for tags authored on the device
pub const AUTHORED_TECH_LIST: [&str; 2] = ["android.nfc.tech.Ndef", "android.nfc.tech.NdefFormatable"];

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl TagData {
    pub fn new(uid: TagId, name: &str) -> Self {
        Self {
            uid,
            name: if name.trim().is_empty() {
                default_name()
            } else {
                name.to_string()
            },
            timestamp: now_millis(),
            tag_type: TagType::Unknown,
            ndef_message: None,
            raw_data: None,
            tech_list: Vec::new(),
            contact_name: None,
            contact_phone: None,
            contact_email: None,
        }
    }

    /// An authored tag with a fresh artificial identifier
    pub fn authored(name: &str, ndef_file: Vec<u8>) -> Self {
        let uid = TagId::generate_artificial();
        let mut tag = Self::new(uid.clone(), name);
        tag.raw_data = Some(uid.as_str().as_bytes().to_vec());
        tag.tech_list = AUTHORED_TECH_LIST.iter().map(|t| t.to_string()).collect();
        tag.set_ndef(ndef_file);
        tag
    }

    /// An authored contact tag; the card's fields are kept alongside the vCard
    pub fn authored_contact(name: &str, card: &VCard, ndef_file: Vec<u8>) -> Self {
        let mut tag = Self::authored(name, ndef_file);
        tag.contact_name = card.name.clone();
        tag.contact_phone = card.phone.clone();
        tag.contact_email = card.email.clone();
        tag
    }

    /// Replace the NDEF file and re-derive the tag type
    pub fn set_ndef(&mut self, ndef_file: Vec<u8>) {
        self.tag_type = TagType::detect(&ndef_file);
        self.ndef_message = Some(ndef_file);
    }

    pub fn has_default_name(&self) -> bool {
        self.name == DEFAULT_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndef::builder;

    #[test]
    fn test_artificial_id() {
        let id = TagId::generate_artificial();
        assert!(id.is_artificial());
        assert_eq!(id.as_str().len(), 16);
        assert!(id.as_str()[2..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_ne!(id, TagId::generate_artificial());
    }

    #[test]
    fn test_detect_type() {
        assert_eq!(TagType::detect(&builder::text_message("hi").unwrap()), TagType::NdefText);
        assert_eq!(TagType::detect(&builder::url_message("example.com").unwrap()), TagType::NdefUri);
        let card = VCard::new("Ada", "", "");
        assert_eq!(TagType::detect(&builder::contact_message(&card).unwrap()), TagType::NdefVcard);
        assert_eq!(TagType::detect(&[0x00, 0x09, 0xD1]), TagType::Unknown);
        assert_eq!(TagType::detect(&[]), TagType::Unknown);
    }

    #[test]
    fn test_json_shape() {
        let mut tag = TagData::new(TagId::from("04A1B2C3"), "");
        tag.set_ndef(vec![0x00, 0x00]);
        let json = serde_json::to_value(&tag).unwrap();
        assert_eq!(json["uid"], "04A1B2C3");
        assert_eq!(json["name"], DEFAULT_NAME);
        assert_eq!(json["type"], "UNKNOWN");
        assert_eq!(json["ndef_message"], "AAA=");
        assert!(json.get("raw_data").is_none());

        let back: TagData = serde_json::from_value(json).unwrap();
        assert_eq!(back, tag);
    }

    #[test]
    fn test_json_defaults() {
        let tag: TagData = serde_json::from_str(r#"{"uid":"AB12","ndef_message":""}"#).unwrap();
        assert_eq!(tag.name, DEFAULT_NAME);
        assert!(tag.ndef_message.is_none());
        assert_eq!(tag.tag_type, TagType::Unknown);
    }

    #[test]
    fn test_authored_contact() {
        let card = VCard::new("Ada", "+44", "");
        let tag = TagData::authored_contact("Card", &card, builder::contact_message(&card).unwrap());
        assert_eq!(tag.tag_type, TagType::NdefVcard);
        assert_eq!(tag.contact_phone.as_deref(), Some("+44"));
        assert!(tag.contact_email.is_none());
        assert_eq!(tag.tech_list.len(), 2);
    }
}
