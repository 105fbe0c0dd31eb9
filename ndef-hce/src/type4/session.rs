//! Type 4 Tag APDU session
//!
//! Dispatches SELECT and READ BINARY over the two files of the NDEF tag
//! application. The session is read-only: UPDATE BINARY and every other
//! instruction answer `69 86`.

use log::{debug, info};

use super::{CapabilityContainer, CC_FILE_ID, NDEF_AID, NDEF_FILE_ID};
use crate::apdu::{ins, select, Response, APDU, SW};
use crate::binding::TagDataBinding;
use crate::selector::EmulationSelector;
use crate::store::{TagId, TagStore};

/// File currently selected by the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectedFile {
    #[default]
    None,
    CapabilityContainer,
    NdefFile,
}

/// Per-link session state
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub selected_file: SelectedFile,
    /// Identifier the cached payload was resolved for
    pub bound_identifier: Option<TagId>,
    pub cached_payload: Option<Vec<u8>>,
}

impl SessionState {
    /// Back to the initial state; the next READ resolves the payload again
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Type 4 Tag application bound to a tag store and an emulation selector
pub struct Type4Session<S, E> {
    binding: TagDataBinding<S, E>,
    cc: Vec<u8>,
    state: SessionState,
}

impl<S: TagStore, E: EmulationSelector> Type4Session<S, E> {
    pub fn new(binding: TagDataBinding<S, E>, cc: CapabilityContainer) -> Self {
        Self {
            binding: binding.with_max_ndef_size(cc.max_ndef_size),
            cc: cc.to_bytes(),
            state: SessionState::default(),
        }
    }

    pub fn binding(&self) -> &TagDataBinding<S, E> {
        &self.binding
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Reader left the field
    pub fn deactivate(&mut self) {
        self.state.reset();
    }

    /// Process an APDU command
    pub fn process_apdu(&mut self, cmd: &APDU) -> Response {
        match cmd.ins {
            ins::SELECT => self.handle_select(cmd),
            ins::READ_BINARY => self.handle_read_binary(cmd),
            ins::UPDATE_BINARY => {
                debug!("UPDATE BINARY rejected, tag is read-only");
                Response::error(SW::COMMAND_NOT_ALLOWED)
            }
            _ => {
                debug!("Unsupported instruction {:02X}", cmd.ins);
                Response::error(SW::COMMAND_NOT_ALLOWED)
            }
        }
    }

    fn handle_select(&mut self, cmd: &APDU) -> Response {
        match cmd.p1 {
            select::BY_NAME => self.select_application(cmd),
            select::BY_FILE_ID => self.select_file(cmd),
            p1 => {
                debug!("SELECT with unsupported P1={:02X}", p1);
                Response::error(SW::COMMAND_NOT_ALLOWED)
            }
        }
    }

    fn select_application(&mut self, cmd: &APDU) -> Response {
        if cmd.data != NDEF_AID {
            debug!("Unknown AID: {:02X?}", cmd.data);
            return Response::error(SW::FILE_NOT_FOUND);
        }
        if self.binding.current().is_none() {
            info!("NDEF application selected but no tag is emulated");
            return Response::error(SW::FILE_NOT_FOUND);
        }
        info!("Selected NDEF tag application");
        self.state.selected_file = SelectedFile::None;
        Response::ok()
    }

    fn select_file(&mut self, cmd: &APDU) -> Response {
        if cmd.data.len() != 2 {
            return Response::error(SW::WRONG_LENGTH);
        }
        let file_id = u16::from_be_bytes([cmd.data[0], cmd.data[1]]);
        self.state.selected_file = match file_id {
            CC_FILE_ID => SelectedFile::CapabilityContainer,
            NDEF_FILE_ID => SelectedFile::NdefFile,
            _ => {
                debug!("Unknown file {:04X}", file_id);
                return Response::error(SW::FILE_NOT_FOUND);
            }
        };
        debug!("Selected file {:04X}", file_id);
        Response::ok()
    }

    fn handle_read_binary(&mut self, cmd: &APDU) -> Response {
        let offset = cmd.p1p2() as usize;
        let requested = cmd.le.unwrap_or(0) as usize;

        match self.state.selected_file {
            SelectedFile::CapabilityContainer => read_slice(&self.cc, offset, requested),
            SelectedFile::NdefFile => match self.binding.payload_for(&mut self.state) {
                Some(file) => read_slice(file, offset, requested),
                None => Response::error(SW::FILE_NOT_FOUND),
            },
            SelectedFile::None => Response::error(SW::FILE_NOT_FOUND),
        }
    }
}

/// READ BINARY over `file`
///
/// A `requested` length of zero reads to the end of the file. Reading at
/// or past the end answers `62 82`.
pub fn read_slice(file: &[u8], offset: usize, requested: usize) -> Response {
    if offset >= file.len() {
        return Response::error(SW::END_OF_FILE);
    }
    let available = file.len() - offset;
    let len = if requested == 0 {
        available
    } else {
        requested.min(available)
    };
    Response::success(file[offset..offset + len].to_vec())
}
