//! Status Word (SW) constants for APDU responses
//!
//! The Type 4 tag only ever answers with the handful of ISO 7816-4 status
//! words below.

/// Status Word constants
pub struct SW;

impl SW {
    /// Normal processing
    pub const SUCCESS: u16 = 0x9000;

    /// End of file reached before reading Ne bytes (offset past the file end)
    pub const END_OF_FILE: u16 = 0x6282;

    /// Wrong length (malformed command, bad Lc)
    pub const WRONG_LENGTH: u16 = 0x6700;

    /// Command not allowed (no current EF / write refused / unknown INS)
    pub const COMMAND_NOT_ALLOWED: u16 = 0x6986;

    /// File or application not found
    pub const FILE_NOT_FOUND: u16 = 0x6A82;

    /// Check if a status word indicates success
    #[inline]
    pub fn is_success(sw: u16) -> bool {
        sw == Self::SUCCESS
    }

    /// Short human readable name for log and CLI output
    pub fn describe(sw: u16) -> &'static str {
        match sw {
            Self::SUCCESS => "success",
            Self::END_OF_FILE => "end of file",
            Self::WRONG_LENGTH => "wrong length",
            Self::COMMAND_NOT_ALLOWED => "command not allowed",
            Self::FILE_NOT_FOUND => "file not found",
            _ => "unknown",
        }
    }
}
