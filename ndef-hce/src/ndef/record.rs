//! NDEF record codec
//!
//! Wire layout of a record:
//!
//! ```text
//! header | type_length | payload_length (1 or 4) | [id_length] | type | [id] | payload
//! ```
//!
//! The header byte carries MB, ME, CF, SR, IL and the 3-bit TNF.

use super::{uri, NdefError};
use log::debug;

/// Type Name Format (low three bits of the record header)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tnf {
    Empty,
    WellKnown,
    Media,
    AbsoluteUri,
    External,
    Unknown,
    Unchanged,
    Reserved,
}

impl Tnf {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0x00 => Tnf::Empty,
            0x01 => Tnf::WellKnown,
            0x02 => Tnf::Media,
            0x03 => Tnf::AbsoluteUri,
            0x04 => Tnf::External,
            0x05 => Tnf::Unknown,
            0x06 => Tnf::Unchanged,
            _ => Tnf::Reserved,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Tnf::Empty => 0x00,
            Tnf::WellKnown => 0x01,
            Tnf::Media => 0x02,
            Tnf::AbsoluteUri => 0x03,
            Tnf::External => 0x04,
            Tnf::Unknown => 0x05,
            Tnf::Unchanged => 0x06,
            Tnf::Reserved => 0x07,
        }
    }
}

/// Header flag bits
mod flag {
    pub const MB: u8 = 0x80;
    pub const ME: u8 = 0x40;
    pub const CF: u8 = 0x20;
    pub const SR: u8 = 0x10;
    pub const IL: u8 = 0x08;
}

/// Well-known record type names
pub mod rtd {
    pub const TEXT: &[u8] = b"T";
    pub const URI: &[u8] = b"U";
    pub const SMART_POSTER: &[u8] = b"Sp";
}

/// Decoded record header byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub message_begin: bool,
    pub message_end: bool,
    pub chunked: bool,
    pub short_record: bool,
    pub id_present: bool,
    pub tnf: Tnf,
}

impl RecordHeader {
    /// Header of a lone short record without ID, as produced by this crate
    pub fn single(tnf: Tnf) -> Self {
        Self {
            message_begin: true,
            message_end: true,
            chunked: false,
            short_record: true,
            id_present: false,
            tnf,
        }
    }

    pub fn from_byte(byte: u8) -> Self {
        Self {
            message_begin: byte & flag::MB != 0,
            message_end: byte & flag::ME != 0,
            chunked: byte & flag::CF != 0,
            short_record: byte & flag::SR != 0,
            id_present: byte & flag::IL != 0,
            tnf: Tnf::from_bits(byte),
        }
    }

    pub fn to_byte(&self) -> u8 {
        let mut byte = self.tnf.bits();
        if self.message_begin {
            byte |= flag::MB;
        }
        if self.message_end {
            byte |= flag::ME;
        }
        if self.chunked {
            byte |= flag::CF;
        }
        if self.short_record {
            byte |= flag::SR;
        }
        if self.id_present {
            byte |= flag::IL;
        }
        byte
    }
}

/// A record as it appears on the wire, type and payload uninterpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub header: RecordHeader,
    pub record_type: Vec<u8>,
    pub id: Option<Vec<u8>>,
    pub payload: Vec<u8>,
}

/// Bounds-checked cursor over record bytes
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], NdefError> {
        let end = self.pos.checked_add(len).filter(|&end| end <= self.data.len());
        match end {
            Some(end) => {
                let slice = &self.data[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(NdefError::Truncated {
                needed: self.pos.saturating_add(len),
                available: self.data.len(),
            }),
        }
    }

    fn byte(&mut self) -> Result<u8, NdefError> {
        Ok(self.take(1)?[0])
    }
}

impl RawRecord {
    /// Decode one record from the front of `data`
    ///
    /// Returns the record and the number of bytes it occupied.
    pub fn decode(data: &[u8]) -> Result<(Self, usize), NdefError> {
        let mut reader = Reader::new(data);
        let header = RecordHeader::from_byte(reader.byte()?);
        let type_length = reader.byte()? as usize;

        let payload_length = if header.short_record {
            reader.byte()? as usize
        } else {
            let bytes = reader.take(4)?;
            u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize
        };

        let id_length = if header.id_present {
            Some(reader.byte()? as usize)
        } else {
            None
        };

        let record_type = reader.take(type_length)?.to_vec();
        let id = match id_length {
            Some(len) => Some(reader.take(len)?.to_vec()),
            None => None,
        };
        let payload = reader.take(payload_length)?.to_vec();

        Ok((
            Self {
                header,
                record_type,
                id,
                payload,
            },
            reader.pos,
        ))
    }

    /// Encode as a short record
    pub fn encode(&self) -> Result<Vec<u8>, NdefError> {
        if self.payload.len() > u8::MAX as usize {
            return Err(NdefError::PayloadTooLong(self.payload.len()));
        }
        if self.record_type.len() > u8::MAX as usize {
            return Err(NdefError::TypeTooLong(self.record_type.len()));
        }
        let id = self.id.as_deref().filter(|id| !id.is_empty());
        if let Some(id) = id {
            if id.len() > u8::MAX as usize {
                return Err(NdefError::TypeTooLong(id.len()));
            }
        }

        let header = RecordHeader {
            short_record: true,
            id_present: id.is_some(),
            ..self.header
        };

        let mut out = Vec::with_capacity(4 + self.record_type.len() + self.payload.len());
        out.push(header.to_byte());
        out.push(self.record_type.len() as u8);
        out.push(self.payload.len() as u8);
        if let Some(id) = id {
            out.push(id.len() as u8);
        }
        out.extend_from_slice(&self.record_type);
        if let Some(id) = id {
            out.extend_from_slice(id);
        }
        out.extend_from_slice(&self.payload);
        Ok(out)
    }
}

/// Parse every record of an NDEF message, stopping after the ME record
///
/// Only the first record may carry MB, and chunked records are refused.
pub fn parse_message(data: &[u8]) -> Result<Vec<RawRecord>, NdefError> {
    if data.is_empty() {
        return Err(NdefError::EmptyMessage);
    }

    let mut records = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let (record, used) = RawRecord::decode(&data[pos..])?;
        if record.header.message_begin != records.is_empty() {
            return Err(NdefError::MessageBegin(records.len()));
        }
        if record.header.chunked {
            return Err(NdefError::Chunked);
        }
        pos += used;
        let last = record.header.message_end;
        records.push(record);
        if last {
            break;
        }
    }
    debug!("Parsed NDEF message: {} record(s), {} bytes", records.len(), pos);
    Ok(records)
}

/// A typed NDEF record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NdefRecord {
    /// Well-known `T` record
    Text { language: String, text: String },
    /// Well-known `U` record holding the full (unabbreviated) URI
    Uri(String),
    /// Media-type record
    Mime { mime_type: String, payload: Vec<u8> },
}

impl NdefRecord {
    pub fn text(language: &str, text: &str) -> Self {
        NdefRecord::Text {
            language: language.to_string(),
            text: text.to_string(),
        }
    }

    pub fn uri(uri: &str) -> Self {
        NdefRecord::Uri(uri.to_string())
    }

    pub fn mime(mime_type: &str, payload: Vec<u8>) -> Self {
        NdefRecord::Mime {
            mime_type: mime_type.to_string(),
            payload,
        }
    }

    /// Build the raw record with a single-record (MB=ME=1) header
    pub fn to_raw(&self) -> Result<RawRecord, NdefError> {
        let (tnf, record_type, payload) = match self {
            NdefRecord::Text { language, text } => {
                if !language.is_ascii() || language.len() > 0x3F {
                    return Err(NdefError::InvalidLanguage(language.clone()));
                }
                let mut payload = Vec::with_capacity(1 + language.len() + text.len());
                // Bit 7 clear: UTF-8
                payload.push(language.len() as u8);
                payload.extend_from_slice(language.as_bytes());
                payload.extend_from_slice(text.as_bytes());
                (Tnf::WellKnown, rtd::TEXT.to_vec(), payload)
            }
            NdefRecord::Uri(full) => {
                let (code, rest) = uri::abbreviate(full);
                let mut payload = Vec::with_capacity(1 + rest.len());
                payload.push(code);
                payload.extend_from_slice(rest.as_bytes());
                (Tnf::WellKnown, rtd::URI.to_vec(), payload)
            }
            NdefRecord::Mime { mime_type, payload } => {
                if !mime_type.is_ascii() {
                    return Err(NdefError::InvalidEncoding);
                }
                (Tnf::Media, mime_type.as_bytes().to_vec(), payload.clone())
            }
        };

        Ok(RawRecord {
            header: RecordHeader::single(tnf),
            record_type,
            id: None,
            payload,
        })
    }

    /// Serialize as a single short record (header 0xD1 or 0xD2)
    pub fn encode(&self) -> Result<Vec<u8>, NdefError> {
        self.to_raw()?.encode()
    }

    /// Decode the first record of `data`
    pub fn decode(data: &[u8]) -> Result<Self, NdefError> {
        let (raw, _) = RawRecord::decode(data)?;
        Self::try_from(&raw)
    }
}

impl TryFrom<&RawRecord> for NdefRecord {
    type Error = NdefError;

    fn try_from(raw: &RawRecord) -> Result<Self, NdefError> {
        match (raw.header.tnf, raw.record_type.as_slice()) {
            (Tnf::WellKnown, rtd::TEXT) => decode_text(&raw.payload),
            (Tnf::WellKnown, rtd::URI) => {
                let (&code, rest) = raw
                    .payload
                    .split_first()
                    .ok_or(NdefError::EmptyPayload("URI"))?;
                let rest = std::str::from_utf8(rest).map_err(|_| NdefError::InvalidEncoding)?;
                Ok(NdefRecord::Uri(uri::expand(code, rest)?))
            }
            (Tnf::Media, mime_type) => {
                let mime_type = std::str::from_utf8(mime_type)
                    .ok()
                    .filter(|t| t.is_ascii())
                    .ok_or(NdefError::InvalidEncoding)?;
                Ok(NdefRecord::mime(mime_type, raw.payload.clone()))
            }
            (tnf, record_type) => Err(NdefError::Unsupported {
                tnf,
                record_type: record_type.to_vec(),
            }),
        }
    }
}

/// Encode a multi-record message, setting MB on the first and ME on the last
pub fn encode_message(records: &[NdefRecord]) -> Result<Vec<u8>, NdefError> {
    if records.is_empty() {
        return Err(NdefError::EmptyMessage);
    }
    let last = records.len() - 1;
    let mut out = Vec::new();
    for (i, record) in records.iter().enumerate() {
        let mut raw = record.to_raw()?;
        raw.header.message_begin = i == 0;
        raw.header.message_end = i == last;
        out.extend(raw.encode()?);
    }
    Ok(out)
}

fn decode_text(payload: &[u8]) -> Result<NdefRecord, NdefError> {
    let (&status, rest) = payload
        .split_first()
        .ok_or(NdefError::EmptyPayload("Text"))?;
    let language_length = (status & 0x3F) as usize;
    if rest.len() < language_length {
        return Err(NdefError::Truncated {
            needed: 1 + language_length,
            available: payload.len(),
        });
    }
    let (language, body) = rest.split_at(language_length);
    let language = std::str::from_utf8(language)
        .ok()
        .filter(|l| l.is_ascii())
        .ok_or(NdefError::InvalidEncoding)?
        .to_string();

    let text = if status & 0x80 == 0 {
        std::str::from_utf8(body)
            .map_err(|_| NdefError::InvalidEncoding)?
            .to_string()
    } else {
        decode_utf16(body)?
    };

    Ok(NdefRecord::Text { language, text })
}

/// UTF-16 text, big-endian unless a little-endian BOM is present
fn decode_utf16(body: &[u8]) -> Result<String, NdefError> {
    if body.len() % 2 != 0 {
        return Err(NdefError::InvalidEncoding);
    }
    let (little_endian, body) = match body {
        [0xFF, 0xFE, rest @ ..] => (true, rest),
        [0xFE, 0xFF, rest @ ..] => (false, rest),
        _ => (false, body),
    };
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            if little_endian {
                u16::from_le_bytes([pair[0], pair[1]])
            } else {
                u16::from_be_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16(&units).map_err(|_| NdefError::InvalidEncoding)
}
