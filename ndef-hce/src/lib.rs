//! Host card emulation of an NFC Forum Type 4 Tag
//!
//! The device answers a contactless reader as a read-only Type 4 Tag
//! holding one NDEF message. Which message is served is decided by the
//! host application: it picks a stored tag through an [`EmulationSelector`]
//! and the service resolves that tag's NDEF file from a [`TagStore`],
//! falling back to a URI derived from the tag identifier.
//!
//! The service supports:
//! - SELECT of the NDEF tag application and its two files
//! - READ BINARY of the Capability Container and the NDEF file
//! - NDEF Text, URI and vCard records
//!
//! # Example
//! ```
//! use ndef_hce::selector::SharedSelector;
//! use ndef_hce::store::{MemoryTagStore, TagId};
//! use ndef_hce::TagHostService;
//!
//! let selector = SharedSelector::with_selection(Some(TagId::from("AB12")));
//! let mut service = TagHostService::new(MemoryTagStore::new(), selector);
//! service.activate();
//!
//! let select = [0x00, 0xA4, 0x04, 0x00, 0x07, 0xD2, 0x76, 0x00, 0x00, 0x85, 0x01, 0x01, 0x00];
//! assert_eq!(service.process_command_apdu(&select), vec![0x90, 0x00]);
//! ```

pub mod apdu;
pub mod binding;
pub mod config;
pub mod ndef;
pub mod selector;
pub mod store;
pub mod type4;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use log::{debug, error, info};

use apdu::{parse_apdu, Response, SW};
use binding::TagDataBinding;
use config::Config;
use selector::EmulationSelector;
use store::{BoundedStore, JsonTagStore, TagStore};
use type4::{CapabilityContainer, Type4Session};

/// Service backed by the JSON store, which also holds the emulation selection
pub type JsonTagHostService = TagHostService<BoundedStore<JsonTagStore>, Arc<JsonTagStore>>;

/// Entry point for command APDUs received over the contactless link
pub struct TagHostService<S, E> {
    session: Type4Session<S, E>,
    active: bool,
}

impl<S: TagStore, E: EmulationSelector> TagHostService<S, E> {
    /// Service with the default URL template and Capability Container
    pub fn new(store: S, selector: E) -> Self {
        Self::with_session(Type4Session::new(
            TagDataBinding::new(store, selector),
            CapabilityContainer::default(),
        ))
    }

    pub fn with_session(session: Type4Session<S, E>) -> Self {
        Self {
            session,
            active: false,
        }
    }

    pub fn session(&self) -> &Type4Session<S, E> {
        &self.session
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// A reader entered the field
    pub fn activate(&mut self) {
        self.session.deactivate();
        self.active = true;
        info!("Contactless link activated");
    }

    /// The reader left the field or selected another application
    pub fn deactivate(&mut self) {
        self.session.deactivate();
        self.active = false;
        info!("Contactless link deactivated");
    }

    /// Process a raw command APDU and return the raw response APDU
    pub fn process_command_apdu(&mut self, apdu_bytes: &[u8]) -> Vec<u8> {
        if !self.active {
            // Some stacks deliver the first command before signalling activation
            self.activate();
        }

        let cmd = match parse_apdu(apdu_bytes) {
            Ok(apdu) => apdu,
            Err(e) => {
                error!("Failed to parse APDU: {}", e);
                return Response::error(SW::WRONG_LENGTH).to_bytes();
            }
        };

        debug!(
            "Processing APDU: CLA={:02X} INS={:02X} P1={:02X} P2={:02X}",
            cmd.cla, cmd.ins, cmd.p1, cmd.p2
        );

        let session = &mut self.session;
        let response = match panic::catch_unwind(AssertUnwindSafe(|| session.process_apdu(&cmd))) {
            Ok(response) => response,
            Err(_) => {
                error!("Internal fault while processing INS={:02X}", cmd.ins);
                Response::error(SW::COMMAND_NOT_ALLOWED)
            }
        };

        debug!(
            "Response: {} data bytes, SW={:04X} ({})",
            response.data.len(),
            response.sw(),
            SW::describe(response.sw())
        );
        response.to_bytes()
    }
}

impl JsonTagHostService {
    /// Service over the JSON store in `config.storage_dir`
    pub fn from_config(config: &Config) -> Self {
        let store = Arc::new(JsonTagStore::open(&config.storage_dir));
        Self::from_store(store, config)
    }

    /// Service over an already opened JSON store
    pub fn from_store(store: Arc<JsonTagStore>, config: &Config) -> Self {
        let binding = TagDataBinding::with_template(
            BoundedStore::from_arc(Arc::clone(&store), config.lookup_timeout),
            store,
            &config.url_template,
        );
        let cc = CapabilityContainer::with_max_ndef_size(config.max_ndef_size);
        Self::with_session(Type4Session::new(binding, cc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndef::builder;
    use crate::selector::SharedSelector;
    use crate::store::{MemoryTagStore, StoreError, TagData, TagId};
    use std::time::Duration;
    use tempfile::TempDir;

    const SELECT_AID: &[u8] = &[0x00, 0xA4, 0x04, 0x00, 0x07, 0xD2, 0x76, 0x00, 0x00, 0x85, 0x01, 0x01, 0x00];
    const SELECT_NDEF: &[u8] = &[0x00, 0xA4, 0x00, 0x0C, 0x02, 0xE1, 0x04];
    const READ_ALL: &[u8] = &[0x00, 0xB0, 0x00, 0x00, 0x00];

    struct PanickingStore;

    impl TagStore for PanickingStore {
        fn lookup(&self, _id: &TagId) -> Result<Option<Vec<u8>>, StoreError> {
            panic!("corrupt index");
        }

        fn store(&self, _id: &TagId, _ndef_file: Vec<u8>) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_malformed_apdu() {
        let mut service = TagHostService::new(MemoryTagStore::new(), SharedSelector::new());
        assert_eq!(service.process_command_apdu(&[0x00, 0xA4]), vec![0x67, 0x00]);
        assert_eq!(service.process_command_apdu(&[]), vec![0x67, 0x00]);
        assert_eq!(
            service.process_command_apdu(&[0x00, 0xA4, 0x04, 0x00, 0x07, 0xD2]),
            vec![0x67, 0x00]
        );
    }

    #[test]
    fn test_fault_containment() {
        let selector = SharedSelector::with_selection(Some(TagId::from("AB12")));
        let mut service = TagHostService::new(PanickingStore, selector);
        assert_eq!(service.process_command_apdu(SELECT_AID), vec![0x90, 0x00]);
        assert_eq!(service.process_command_apdu(SELECT_NDEF), vec![0x90, 0x00]);
        assert_eq!(service.process_command_apdu(READ_ALL), vec![0x69, 0x86]);

        // Still answering after the fault
        assert_eq!(service.process_command_apdu(SELECT_AID), vec![0x90, 0x00]);
    }

    #[test]
    fn test_activation_lifecycle() {
        let selector = SharedSelector::with_selection(Some(TagId::from("AB12")));
        let mut service = TagHostService::new(MemoryTagStore::new(), selector);
        assert!(!service.is_active());

        service.process_command_apdu(SELECT_NDEF);
        assert!(service.is_active());
        service.process_command_apdu(READ_ALL);
        assert!(service.session().state().cached_payload.is_some());

        service.deactivate();
        assert!(!service.is_active());
        assert!(service.session().state().cached_payload.is_none());
        assert_eq!(
            service.session().state().selected_file,
            type4::SelectedFile::None
        );
    }

    #[test]
    fn test_serves_stored_payload() {
        let store = MemoryTagStore::new();
        let id = TagId::from("04A1B2");
        let file = builder::text_message("hi").unwrap();
        store.store(&id, file.clone()).unwrap();

        let mut service = TagHostService::new(store, SharedSelector::with_selection(Some(id)));
        service.activate();
        service.process_command_apdu(SELECT_AID);
        service.process_command_apdu(SELECT_NDEF);

        let mut expected = file;
        expected.extend_from_slice(&[0x90, 0x00]);
        assert_eq!(service.process_command_apdu(READ_ALL), expected);
    }

    #[test]
    fn test_json_service_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            storage_dir: temp_dir.path().to_path_buf(),
            url_template: "https://tags.example.org/{id}".to_string(),
            lookup_timeout: Duration::from_secs(2),
            max_ndef_size: 1024,
        };

        let store = Arc::new(JsonTagStore::open(&config.storage_dir));
        let tag = TagData::authored("Site", builder::url_message("example.org").unwrap());
        let id = tag.uid.clone();
        store.save_tag(tag).unwrap();
        store.set_emulating(Some(id)).unwrap();

        let mut service = JsonTagHostService::from_config(&config);
        assert_eq!(service.process_command_apdu(SELECT_AID), vec![0x90, 0x00]);
        service.process_command_apdu(&[0x00, 0xA4, 0x00, 0x0C, 0x02, 0xE1, 0x03]);
        let cc = service.process_command_apdu(&[0x00, 0xB0, 0x00, 0x0B, 0x02]);
        assert_eq!(cc, vec![0x04, 0x00, 0x90, 0x00]);

        service.process_command_apdu(SELECT_NDEF);
        let mut expected = builder::url_message("example.org").unwrap();
        expected.extend_from_slice(&[0x90, 0x00]);
        assert_eq!(service.process_command_apdu(READ_ALL), expected);
    }

    #[test]
    fn test_json_service_default_message() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(JsonTagStore::open(temp_dir.path()));
        store.set_emulating(Some(TagId::from("AB12"))).unwrap();

        let config = Config {
            storage_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };
        let mut service = JsonTagHostService::from_store(Arc::clone(&store), &config);
        service.process_command_apdu(SELECT_AID);
        service.process_command_apdu(SELECT_NDEF);

        let mut expected = builder::url_message("https://example.com/tag/AB12").unwrap();
        expected.extend_from_slice(&[0x90, 0x00]);
        assert_eq!(service.process_command_apdu(READ_ALL), expected);

        store.set_emulating(None).unwrap();
        assert_eq!(service.process_command_apdu(READ_ALL), vec![0x6A, 0x82]);
    }
}
