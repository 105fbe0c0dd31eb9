//! Capability Container (CC) file
//!
//! ```text
//! CCLEN(2) | mapping version(1) | MLe(2) | MLc(2) | NDEF File Control TLV(8)
//! ```
//!
//! The NDEF File Control TLV (tag 04, length 06) names the NDEF file, its
//! maximum size and the read/write access conditions.

use super::tlv::{self, TLVError, TLV};
use super::NDEF_FILE_ID;
use thiserror::Error;

/// Total CC length, CCLEN included
pub const CC_LEN: u16 = 0x000F;

/// Mapping version 2.0
pub const MAPPING_VERSION: u8 = 0x20;

/// Maximum R-APDU data size advertised to readers
pub const DEFAULT_MLE: u16 = 0x00FF;

/// Maximum C-APDU data size advertised to readers
pub const DEFAULT_MLC: u16 = 0x00FF;

/// Default maximum NDEF file size
pub const DEFAULT_MAX_NDEF_SIZE: u16 = 2048;

/// Access condition byte granting access without security
pub const ACCESS_OPEN: u8 = 0x00;

const NDEF_FILE_CONTROL_TAG: u8 = 0x04;

/// Errors that can occur while parsing a CC file
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CcError {
    #[error("CC too short: {0} bytes")]
    TooShort(usize),

    #[error("CCLEN {declared} does not match {actual} bytes")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("No NDEF File Control TLV")]
    MissingNdefFileControl,

    #[error("Malformed NDEF File Control TLV of {0} bytes")]
    BadNdefFileControl(usize),

    #[error(transparent)]
    Tlv(#[from] TLVError),
}

/// The capability container advertised by the tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityContainer {
    pub version: u8,
    pub max_le: u16,
    pub max_lc: u16,
    pub ndef_file_id: u16,
    pub max_ndef_size: u16,
    pub read_access: u8,
    pub write_access: u8,
}

impl Default for CapabilityContainer {
    fn default() -> Self {
        Self::with_max_ndef_size(DEFAULT_MAX_NDEF_SIZE)
    }
}

impl CapabilityContainer {
    /// The tag's CC for a given maximum NDEF size
    ///
    /// Write access is advertised as open, although UPDATE BINARY is always
    /// refused by the session.
    pub fn with_max_ndef_size(max_ndef_size: u16) -> Self {
        Self {
            version: MAPPING_VERSION,
            max_le: DEFAULT_MLE,
            max_lc: DEFAULT_MLC,
            ndef_file_id: NDEF_FILE_ID,
            max_ndef_size,
            read_access: ACCESS_OPEN,
            write_access: ACCESS_OPEN,
        }
    }

    fn ndef_file_control(&self) -> TLV {
        let mut value = Vec::with_capacity(6);
        value.extend_from_slice(&self.ndef_file_id.to_be_bytes());
        value.extend_from_slice(&self.max_ndef_size.to_be_bytes());
        value.push(self.read_access);
        value.push(self.write_access);
        TLV::new(NDEF_FILE_CONTROL_TAG, value)
    }

    /// The CC file contents
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CC_LEN as usize);
        out.extend_from_slice(&CC_LEN.to_be_bytes());
        out.push(self.version);
        out.extend_from_slice(&self.max_le.to_be_bytes());
        out.extend_from_slice(&self.max_lc.to_be_bytes());
        // A six byte value always fits the short length form
        out.push(NDEF_FILE_CONTROL_TAG);
        out.push(6);
        out.extend_from_slice(&self.ndef_file_control().value);
        out
    }

    /// Parse a CC file, e.g. one read back from a reader session
    pub fn parse(data: &[u8]) -> Result<Self, CcError> {
        if data.len() < 7 {
            return Err(CcError::TooShort(data.len()));
        }
        let declared = u16::from_be_bytes([data[0], data[1]]) as usize;
        if declared > data.len() || declared < 7 {
            return Err(CcError::LengthMismatch {
                declared,
                actual: data.len(),
            });
        }

        let control = tlv::read_list(&data[7..declared])?
            .into_iter()
            .find(|t| t.tag == NDEF_FILE_CONTROL_TAG)
            .ok_or(CcError::MissingNdefFileControl)?;
        let v = &control.value;
        if v.len() != 6 {
            return Err(CcError::BadNdefFileControl(v.len()));
        }

        Ok(Self {
            version: data[2],
            max_le: u16::from_be_bytes([data[3], data[4]]),
            max_lc: u16::from_be_bytes([data[5], data[6]]),
            ndef_file_id: u16::from_be_bytes([v[0], v[1]]),
            max_ndef_size: u16::from_be_bytes([v[2], v[3]]),
            read_access: v[4],
            write_access: v[5],
        })
    }
}
