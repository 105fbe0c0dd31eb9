//! Command APDU parsing
//!
//! ISO 7816-4 command APDUs as received over the contactless link. The
//! parser accepts the four short cases and their extended counterparts.
//!
//! Unlike most card stacks the raw `Le` value is kept: a `Le` byte of `00`
//! is stored as `Some(0)`. READ BINARY on a Type 4 tag treats zero as "the
//! rest of the file", so the ISO meaning (256) is only available through
//! [`APDU::ne`].
//!
//! # Example
//! ```
//! use ndef_hce::apdu::{parse_apdu, ins};
//!
//! let raw = [0x00, 0xB0, 0x00, 0x02, 0x00];
//! let apdu = parse_apdu(&raw).unwrap();
//! assert_eq!(apdu.ins, ins::READ_BINARY);
//! assert_eq!(apdu.le, Some(0));
//! assert_eq!(apdu.ne(), Some(256));
//! ```

mod response;
mod status;

pub use response::Response;
pub use status::SW;

use thiserror::Error;

/// Errors that can occur during APDU parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum APDUError {
    #[error("APDU too short: expected at least 4 bytes, got {0}")]
    TooShort(usize),

    #[error("Lc/Le inconsistent with APDU body of {0} bytes")]
    InvalidLength(usize),

    #[error("Invalid extended APDU format")]
    InvalidExtendedFormat,
}

/// A parsed command APDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct APDU {
    /// Class byte (CLA)
    pub cla: u8,
    /// Instruction byte (INS)
    pub ins: u8,
    /// Parameter 1 (P1)
    pub p1: u8,
    /// Parameter 2 (P2)
    pub p2: u8,
    /// Command data (may be empty)
    pub data: Vec<u8>,
    /// Raw expected length as encoded, `None` if absent
    pub le: Option<u32>,
    /// Whether Lc/Le used the extended (3 byte / 2 byte) encoding
    pub extended: bool,
}

impl APDU {
    /// Create a new APDU with just the header (CLA, INS, P1, P2)
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            le: None,
            extended: false,
        }
    }

    /// Create a new APDU with command data
    pub fn with_data(cla: u8, ins: u8, p1: u8, p2: u8, data: Vec<u8>) -> Self {
        Self {
            data,
            ..Self::new(cla, ins, p1, p2)
        }
    }

    /// Set the raw expected length
    pub fn with_le(mut self, le: u32) -> Self {
        self.le = Some(le);
        self
    }

    /// P1-P2 combined as a big-endian u16 (the READ BINARY offset)
    pub fn p1p2(&self) -> u16 {
        ((self.p1 as u16) << 8) | (self.p2 as u16)
    }

    /// Expected response length with ISO 7816-4 semantics (0 -> 256 or 65536)
    pub fn ne(&self) -> Option<u32> {
        self.le.map(|le| match (le, self.extended) {
            (0, false) => 256,
            (0, true) => 65536,
            (n, _) => n,
        })
    }

    /// Serialize back to the short wire form
    ///
    /// Only used for building commands in tests and the CLI; data longer
    /// than 255 bytes switches to the extended form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![self.cla, self.ins, self.p1, self.p2];
        let extended = self.extended || self.data.len() > 0xFF;
        if !self.data.is_empty() {
            if extended {
                out.push(0x00);
                out.extend_from_slice(&(self.data.len() as u16).to_be_bytes());
            } else {
                out.push(self.data.len() as u8);
            }
            out.extend_from_slice(&self.data);
        }
        if let Some(le) = self.le {
            if extended {
                if self.data.is_empty() {
                    out.push(0x00);
                }
                out.extend_from_slice(&(le as u16).to_be_bytes());
            } else {
                out.push(le as u8);
            }
        }
        out
    }
}

/// Parse raw bytes into an APDU
///
/// Supports both short and extended formats:
/// - Short: CLA INS P1 P2 [Lc Data] [Le]
/// - Extended: CLA INS P1 P2 00 Lc1 Lc2 Data [Le1 Le2]
pub fn parse_apdu(data: &[u8]) -> Result<APDU, APDUError> {
    if data.len() < 4 {
        return Err(APDUError::TooShort(data.len()));
    }

    let (cla, ins, p1, p2) = (data[0], data[1], data[2], data[3]);
    let body = &data[4..];

    // A leading 00 followed by at least two more bytes is the extended marker,
    // unless the short reading of the same bytes is self-consistent.
    if body.len() > 2 && body[0] == 0x00 {
        if let Ok(apdu) = parse_extended_apdu(cla, ins, p1, p2, &body[1..]) {
            return Ok(apdu);
        }
    }

    parse_short_apdu(cla, ins, p1, p2, body)
}

/// Parse short format APDU (Lc/Le up to 255 bytes)
fn parse_short_apdu(cla: u8, ins: u8, p1: u8, p2: u8, body: &[u8]) -> Result<APDU, APDUError> {
    let header = APDU::new(cla, ins, p1, p2);

    // Case 1
    if body.is_empty() {
        return Ok(header);
    }

    // Case 2: Le only
    if body.len() == 1 {
        return Ok(header.with_le(body[0] as u32));
    }

    let lc = body[0] as usize;
    if lc == 0 {
        return Err(APDUError::InvalidLength(body.len()));
    }

    // Case 3: Lc + Data
    if body.len() == 1 + lc {
        return Ok(APDU::with_data(cla, ins, p1, p2, body[1..].to_vec()));
    }

    // Case 4: Lc + Data + Le
    if body.len() == 2 + lc {
        let apdu = APDU::with_data(cla, ins, p1, p2, body[1..1 + lc].to_vec());
        return Ok(apdu.with_le(body[1 + lc] as u32));
    }

    Err(APDUError::InvalidLength(body.len()))
}

/// Parse extended format APDU, `body` starting after the 00 marker
fn parse_extended_apdu(cla: u8, ins: u8, p1: u8, p2: u8, body: &[u8]) -> Result<APDU, APDUError> {
    if body.len() < 2 {
        return Err(APDUError::InvalidExtendedFormat);
    }

    let first_word = u16::from_be_bytes([body[0], body[1]]) as usize;
    let mut apdu = APDU::new(cla, ins, p1, p2);
    apdu.extended = true;

    // Case 2E
    if body.len() == 2 {
        return Ok(apdu.with_le(first_word as u32));
    }

    let lc = first_word;
    if lc == 0 || body.len() < 2 + lc {
        return Err(APDUError::InvalidExtendedFormat);
    }
    apdu.data = body[2..2 + lc].to_vec();

    match body.len() - 2 - lc {
        // Case 3E
        0 => Ok(apdu),
        // Case 4E
        2 => {
            let le = u16::from_be_bytes([body[2 + lc], body[3 + lc]]);
            Ok(apdu.with_le(le as u32))
        }
        _ => Err(APDUError::InvalidExtendedFormat),
    }
}

/// Instruction bytes understood by a Type 4 tag
pub mod ins {
    pub const SELECT: u8 = 0xA4;
    pub const READ_BINARY: u8 = 0xB0;
    pub const UPDATE_BINARY: u8 = 0xD6;
}

/// SELECT P1 values
pub mod select {
    /// Select by DF name (application identifier)
    pub const BY_NAME: u8 = 0x04;
    /// Select by file identifier
    pub const BY_FILE_ID: u8 = 0x00;
}
