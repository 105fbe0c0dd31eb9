//! NDEF file container (Type 4 Tag)
//!
//! The NDEF file starts with NLEN, a 2-byte big-endian length of the
//! message that follows.

use super::NdefError;

/// Size of the NLEN field
pub const NLEN_SIZE: usize = 2;

/// An NDEF file holding no message (NLEN = 0)
pub const EMPTY_FILE: [u8; NLEN_SIZE] = [0x00, 0x00];

/// Prefix a message with its NLEN
pub fn wrap(message: &[u8]) -> Result<Vec<u8>, NdefError> {
    let len = u16::try_from(message.len()).map_err(|_| NdefError::MessageTooLong(message.len()))?;
    let mut file = Vec::with_capacity(NLEN_SIZE + message.len());
    file.extend_from_slice(&len.to_be_bytes());
    file.extend_from_slice(message);
    Ok(file)
}

/// Return the message contained in an NDEF file
///
/// Bytes past the declared length are ignored; a declared length larger
/// than the buffer is corrupt data.
pub fn unwrap(file: &[u8]) -> Result<&[u8], NdefError> {
    if file.len() < NLEN_SIZE {
        return Err(NdefError::Corrupt {
            declared: 0,
            available: file.len(),
        });
    }
    let declared = u16::from_be_bytes([file[0], file[1]]) as usize;
    let body = &file[NLEN_SIZE..];
    if declared > body.len() {
        return Err(NdefError::Corrupt {
            declared,
            available: body.len(),
        });
    }
    Ok(&body[..declared])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap() {
        assert_eq!(wrap(&[0xD1, 0x01]).unwrap(), vec![0x00, 0x02, 0xD1, 0x01]);
        assert_eq!(wrap(&[]).unwrap(), EMPTY_FILE.to_vec());

        let big = vec![0u8; 300];
        let file = wrap(&big).unwrap();
        assert_eq!(&file[..2], &[0x01, 0x2C]);
        assert_eq!(file.len(), 302);
    }

    #[test]
    fn test_wrap_too_long() {
        let huge = vec![0u8; 0x1_0000];
        assert_eq!(wrap(&huge), Err(NdefError::MessageTooLong(0x1_0000)));
    }

    #[test]
    fn test_unwrap() {
        assert_eq!(unwrap(&[0x00, 0x02, 0xAA, 0xBB]).unwrap(), &[0xAA, 0xBB]);
        // Trailing padding is not part of the message
        assert_eq!(unwrap(&[0x00, 0x01, 0xAA, 0x00, 0x00]).unwrap(), &[0xAA]);
        assert!(unwrap(&EMPTY_FILE).unwrap().is_empty());
    }

    #[test]
    fn test_unwrap_corrupt() {
        assert_eq!(
            unwrap(&[0x00, 0x05, 0xAA]),
            Err(NdefError::Corrupt { declared: 5, available: 1 })
        );
        assert!(matches!(unwrap(&[0x00]), Err(NdefError::Corrupt { .. })));
    }

    #[test]
    fn test_rewrap_is_idempotent() {
        for message in [vec![], vec![0xD1], vec![0x42; 255], vec![0x07; 1024]] {
            let file = wrap(&message).unwrap();
            assert_eq!(wrap(unwrap(&file).unwrap()).unwrap(), file);
        }
    }
}
