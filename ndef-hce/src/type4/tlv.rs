//! Simple-TLV as used by the Type 4 Tag capability container
//!
//! One-byte tag; length is a single byte, or `FF` followed by a 2-byte
//! big-endian length for values of 255 bytes or more.

use thiserror::Error;

/// Errors that can occur during TLV parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TLVError {
    #[error("Unexpected end of data while parsing tag")]
    UnexpectedEndTag,

    #[error("Unexpected end of data while parsing length")]
    UnexpectedEndLength,

    #[error("Unexpected end of data while parsing value")]
    UnexpectedEndValue,

    #[error("Length too large: {0}")]
    LengthTooLarge(usize),
}

/// A single Simple-TLV
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TLV {
    pub tag: u8,
    pub value: Vec<u8>,
}

impl TLV {
    pub fn new(tag: u8, value: Vec<u8>) -> Self {
        Self { tag, value }
    }

    /// Encode tag, length and value
    pub fn encode(&self) -> Result<Vec<u8>, TLVError> {
        let len = self.value.len();
        let mut out = Vec::with_capacity(4 + len);
        out.push(self.tag);
        if len < 0xFF {
            out.push(len as u8);
        } else if len <= u16::MAX as usize {
            out.push(0xFF);
            out.extend_from_slice(&(len as u16).to_be_bytes());
        } else {
            return Err(TLVError::LengthTooLarge(len));
        }
        out.extend_from_slice(&self.value);
        Ok(out)
    }

    /// Parse one TLV, returning it and the remaining bytes
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8]), TLVError> {
        let (&tag, rest) = data.split_first().ok_or(TLVError::UnexpectedEndTag)?;
        let (&first, rest) = rest.split_first().ok_or(TLVError::UnexpectedEndLength)?;
        let (len, rest) = if first == 0xFF {
            if rest.len() < 2 {
                return Err(TLVError::UnexpectedEndLength);
            }
            (u16::from_be_bytes([rest[0], rest[1]]) as usize, &rest[2..])
        } else {
            (first as usize, rest)
        };
        if rest.len() < len {
            return Err(TLVError::UnexpectedEndValue);
        }
        let (value, rest) = rest.split_at(len);
        Ok((Self::new(tag, value.to_vec()), rest))
    }
}

/// Parse every TLV in `data`
pub fn read_list(mut data: &[u8]) -> Result<Vec<TLV>, TLVError> {
    let mut list = Vec::new();
    while !data.is_empty() {
        let (tlv, rest) = TLV::parse(data)?;
        list.push(tlv);
        data = rest;
    }
    Ok(list)
}
