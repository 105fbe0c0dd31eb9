//! Tag data binding
//!
//! Resolves the emulated identifier to the NDEF file served by the tag:
//! the stored file when one exists and is well formed, otherwise a URI
//! record synthesized from the configured template. Resolution never fails.

use log::{debug, info, warn};

use crate::ndef::{self, NdefError, NdefRecord};
use crate::selector::EmulationSelector;
use crate::store::{TagId, TagStore};
use crate::type4::cc::DEFAULT_MAX_NDEF_SIZE;
use crate::type4::SessionState;

/// Placeholder replaced by the identifier in URL templates
pub const ID_PLACEHOLDER: &str = "{id}";

/// Default URL served for tags without a stored NDEF file
pub const DEFAULT_URL_TEMPLATE: &str = "https://example.com/tag/{id}";

/// Binds the emulation selection to stored or synthesized NDEF files
pub struct TagDataBinding<S, E> {
    store: S,
    selector: E,
    url_template: String,
    /// Largest file the Capability Container lets readers expect
    max_ndef_size: usize,
}

impl<S: TagStore, E: EmulationSelector> TagDataBinding<S, E> {
    pub fn new(store: S, selector: E) -> Self {
        Self::with_template(store, selector, DEFAULT_URL_TEMPLATE)
    }

    pub fn with_template(store: S, selector: E, url_template: &str) -> Self {
        Self {
            store,
            selector,
            url_template: url_template.to_string(),
            max_ndef_size: DEFAULT_MAX_NDEF_SIZE as usize,
        }
    }

    /// Refuse files larger than `max_ndef_size`, normally the CC's value
    pub fn with_max_ndef_size(mut self, max_ndef_size: u16) -> Self {
        self.max_ndef_size = max_ndef_size as usize;
        self
    }

    pub fn max_ndef_size(&self) -> usize {
        self.max_ndef_size
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The identifier currently selected for emulation
    pub fn current(&self) -> Option<TagId> {
        self.selector.current()
    }

    /// The NDEF file for `id`
    pub fn resolve(&self, id: &TagId) -> Vec<u8> {
        match self.store.lookup(id) {
            Ok(Some(stored)) if !stored.is_empty() => match validate(&stored, self.max_ndef_size) {
                Ok(()) => {
                    debug!("Serving stored NDEF file for {} ({} bytes)", id, stored.len());
                    return stored;
                }
                Err(e) => warn!("Stored NDEF file for {} is unusable: {}", id, e),
            },
            Ok(_) => debug!("No stored NDEF file for {}", id),
            Err(e) => warn!("Tag store lookup for {} failed: {}", id, e),
        }
        self.synthesize(id)
    }

    /// Default message: a URI record built from the template
    pub fn synthesize(&self, id: &TagId) -> Vec<u8> {
        let url = self.url_template.replace(ID_PLACEHOLDER, id.as_str());
        let built = NdefRecord::Uri(url)
            .encode()
            .and_then(|record| ndef::file::wrap(&record))
            .and_then(|file| check_size(file, self.max_ndef_size));
        match built {
            Ok(file) => {
                debug!("Synthesized default NDEF file for {} ({} bytes)", id, file.len());
                file
            }
            Err(e) => {
                warn!("Cannot synthesize default message for {}: {}", id, e);
                ndef::file::EMPTY_FILE.to_vec()
            }
        }
    }

    /// The NDEF file for the session, reloading when the emulated tag changed
    ///
    /// Returns `None` when nothing is being emulated.
    pub fn payload_for<'s>(&self, state: &'s mut SessionState) -> Option<&'s [u8]> {
        let Some(current) = self.selector.current() else {
            if state.bound_identifier.take().is_some() {
                info!("Emulation stopped, dropping cached NDEF file");
            }
            state.cached_payload = None;
            return None;
        };

        let stale = state.bound_identifier.as_ref() != Some(&current) || state.cached_payload.is_none();
        if stale {
            info!("Binding session to tag {}", current);
            state.cached_payload = Some(self.resolve(&current));
            state.bound_identifier = Some(current);
        }
        state.cached_payload.as_deref()
    }
}

fn check_size(file: Vec<u8>, max: usize) -> Result<Vec<u8>, NdefError> {
    if file.len() > max {
        return Err(NdefError::FileTooLarge { size: file.len(), max });
    }
    Ok(file)
}

/// A stored file must fit the advertised size, unwrap, and hold a
/// parseable message (or be empty)
fn validate(file: &[u8], max: usize) -> Result<(), NdefError> {
    if file.len() > max {
        return Err(NdefError::FileTooLarge { size: file.len(), max });
    }
    let message = ndef::file::unwrap(file)?;
    if message.is_empty() {
        return Ok(());
    }
    ndef::parse_message(message).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndef::builder;
    use crate::selector::SharedSelector;
    use crate::store::{MemoryTagStore, StoreError};
    use std::cell::Cell;

    fn binding() -> TagDataBinding<MemoryTagStore, SharedSelector> {
        TagDataBinding::new(MemoryTagStore::new(), SharedSelector::new())
    }

    struct FailingStore;

    impl TagStore for FailingStore {
        fn lookup(&self, _id: &TagId) -> Result<Option<Vec<u8>>, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        fn store(&self, _id: &TagId, _ndef_file: Vec<u8>) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
    }

    #[derive(Default)]
    struct CountingStore {
        inner: MemoryTagStore,
        lookups: Cell<usize>,
    }

    impl TagStore for CountingStore {
        fn lookup(&self, id: &TagId) -> Result<Option<Vec<u8>>, StoreError> {
            self.lookups.set(self.lookups.get() + 1);
            self.inner.lookup(id)
        }

        fn store(&self, id: &TagId, ndef_file: Vec<u8>) -> Result<(), StoreError> {
            self.inner.store(id, ndef_file)
        }
    }

    #[test]
    fn test_stored_payload_verbatim() {
        let binding = binding();
        let id = TagId::from("04A1");
        let stored = builder::text_message("stored").unwrap();
        binding.store().store(&id, stored.clone()).unwrap();
        assert_eq!(binding.resolve(&id), stored);
    }

    #[test]
    fn test_synthesized_default() {
        let binding = binding();
        let file = binding.resolve(&TagId::from("AB12"));
        assert_eq!(file, builder::url_message("https://example.com/tag/AB12").unwrap());
    }

    #[test]
    fn test_custom_template() {
        let binding = TagDataBinding::with_template(
            MemoryTagStore::new(),
            SharedSelector::new(),
            "nfc://uid/{id}",
        );
        let file = binding.resolve(&TagId::from("04A1"));
        let record = NdefRecord::decode(ndef::file::unwrap(&file).unwrap()).unwrap();
        assert_eq!(record, NdefRecord::uri("nfc://uid/04A1"));
    }

    #[test]
    fn test_store_failure_falls_back() {
        let binding = TagDataBinding::new(FailingStore, SharedSelector::new());
        let file = binding.resolve(&TagId::from("AB12"));
        assert_eq!(file, builder::url_message("https://example.com/tag/AB12").unwrap());
    }

    #[test]
    fn test_corrupt_payload_falls_back() {
        let binding = binding();
        let id = TagId::from("AB12");
        binding.store().store(&id, vec![0x00, 0x40, 0xD1, 0x01]).unwrap();
        assert_eq!(binding.resolve(&id), binding.synthesize(&id));

        // NLEN fits but the record inside is truncated
        binding.store().store(&id, vec![0x00, 0x02, 0xD1, 0x01]).unwrap();
        assert_eq!(binding.resolve(&id), binding.synthesize(&id));
    }

    #[test]
    fn test_file_over_max_size_falls_back() {
        let binding = binding();
        let id = TagId::from("AB12");
        let records: Vec<NdefRecord> = (0..20)
            .map(|_| NdefRecord::text("en", &"x".repeat(200)))
            .collect();
        let large = ndef::file::wrap(&ndef::encode_message(&records).unwrap()).unwrap();
        assert!(large.len() > binding.max_ndef_size());
        binding.store().store(&id, large).unwrap();

        let served = binding.resolve(&id);
        assert_eq!(served, binding.synthesize(&id));
        assert!(served.len() <= 2048);
    }

    #[test]
    fn test_custom_max_size() {
        let binding = binding().with_max_ndef_size(16);
        let id = TagId::from("AB12");
        let stored = builder::text_message("twenty bytes of text").unwrap();
        binding.store().store(&id, stored).unwrap();

        // Neither the stored file nor the default URI fit in 16 bytes
        assert_eq!(binding.resolve(&id), ndef::file::EMPTY_FILE.to_vec());

        let small = builder::text_message("ok").unwrap();
        assert!(small.len() <= 16);
        binding.store().store(&id, small.clone()).unwrap();
        assert_eq!(binding.resolve(&id), small);
    }

    #[test]
    fn test_oversized_template_serves_empty_file() {
        let template = format!("https://example.com/{}/{{id}}", "x".repeat(400));
        let binding = TagDataBinding::with_template(MemoryTagStore::new(), SharedSelector::new(), &template);
        assert_eq!(binding.resolve(&TagId::from("AB12")), ndef::file::EMPTY_FILE.to_vec());
    }

    #[test]
    fn test_cache_reloads_only_on_identifier_change() {
        let selector = SharedSelector::new();
        let binding = TagDataBinding::new(CountingStore::default(), selector.clone());
        let mut state = SessionState::default();

        assert!(binding.payload_for(&mut state).is_none());
        assert_eq!(binding.store().lookups.get(), 0);

        selector.set(TagId::from("AAAA"));
        let first = binding.payload_for(&mut state).unwrap().to_vec();
        binding.payload_for(&mut state).unwrap();
        binding.payload_for(&mut state).unwrap();
        assert_eq!(binding.store().lookups.get(), 1);
        assert_eq!(state.bound_identifier, Some(TagId::from("AAAA")));

        selector.set(TagId::from("BBBB"));
        let second = binding.payload_for(&mut state).unwrap().to_vec();
        assert_eq!(binding.store().lookups.get(), 2);
        assert_ne!(first, second);

        selector.clear();
        assert!(binding.payload_for(&mut state).is_none());
        assert!(state.bound_identifier.is_none());
        assert!(state.cached_payload.is_none());
    }
}
