//! NFC Forum Type 4 Tag application
//!
//! A single NDEF application exposing two files: the Capability Container
//! and the NDEF file.

pub mod cc;
pub mod session;
pub mod tlv;

pub use cc::CapabilityContainer;
pub use session::{read_slice, SelectedFile, SessionState, Type4Session};

/// NFC Forum NDEF Tag Application AID (mapping version 2.0)
pub const NDEF_AID: &[u8] = &[0xD2, 0x76, 0x00, 0x00, 0x85, 0x01, 0x01];

/// Capability Container file identifier
pub const CC_FILE_ID: u16 = 0xE103;

/// NDEF file identifier
pub const NDEF_FILE_ID: u16 = 0xE104;
