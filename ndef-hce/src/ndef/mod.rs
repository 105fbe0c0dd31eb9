//! NDEF (NFC Data Exchange Format) encoding and decoding
//!
//! Records are always produced in the short-record form. Decoding is more
//! lenient and also accepts long records and ID fields, since stored
//! payloads may come from tags captured in reader mode.
//!
//! # Example
//! ```
//! use ndef_hce::ndef::{self, NdefRecord};
//!
//! let record = NdefRecord::uri("https://example.com/tag/AB12");
//! let file = ndef::file::wrap(&record.encode().unwrap()).unwrap();
//! assert_eq!(&file[..2], &[0x00, 0x19]);
//!
//! let message = ndef::file::unwrap(&file).unwrap();
//! assert_eq!(NdefRecord::decode(message).unwrap(), record);
//! ```

pub mod builder;
pub mod file;
pub mod record;
pub mod uri;
pub mod vcard;

pub use builder::MessageKind;
pub use record::{encode_message, parse_message, NdefRecord, RawRecord, RecordHeader, Tnf};
pub use vcard::VCard;

use thiserror::Error;

/// Errors that can occur during NDEF encoding or decoding
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NdefError {
    #[error("NDEF data truncated: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("Payload of {0} bytes does not fit a short record")]
    PayloadTooLong(usize),

    #[error("Type field of {0} bytes is too long")]
    TypeTooLong(usize),

    #[error("Message of {0} bytes does not fit the NDEF file length field")]
    MessageTooLong(usize),

    #[error("NDEF file of {size} bytes exceeds the advertised maximum of {max}")]
    FileTooLarge { size: usize, max: usize },

    #[error("Corrupt NDEF file: declared length {declared}, {available} bytes available")]
    Corrupt { declared: usize, available: usize },

    #[error("Language code must be ASCII and at most 63 bytes: {0:?}")]
    InvalidLanguage(String),

    #[error("Unknown URI identifier code 0x{0:02X}")]
    UnknownUriCode(u8),

    #[error("Empty payload for {0} record")]
    EmptyPayload(&'static str),

    #[error("Invalid text encoding in record payload")]
    InvalidEncoding,

    #[error("Unsupported record: tnf={tnf:?} type={record_type:02X?}")]
    Unsupported { tnf: Tnf, record_type: Vec<u8> },

    #[error("NDEF message contains no records")]
    EmptyMessage,

    #[error("Chunked records are not supported")]
    Chunked,

    #[error("Message begin flag misplaced on record {0}")]
    MessageBegin(usize),
}
