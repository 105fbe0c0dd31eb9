//! Tag storage
//!
//! The emulator only needs one thing from storage: the NDEF file recorded
//! for an identifier. [`TagStore`] is that seam. [`MemoryTagStore`] backs
//! tests and embedders that keep tags elsewhere, [`JsonTagStore`] persists
//! full [`TagData`] records to disk, and [`BoundedStore`] puts a deadline on
//! lookups against either.

pub mod bounded;
pub mod json;
pub mod model;

pub use bounded::BoundedStore;
pub use json::JsonTagStore;
pub use model::{TagData, TagId, TagType};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use thiserror::Error;

/// Errors a tag store can report
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored tag document is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lookup did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Tag store unavailable: {0}")]
    Unavailable(String),

    #[error("Refusing to overwrite unreadable tag document {0:?}")]
    Unreadable(PathBuf),
}

/// Source of stored NDEF files, keyed by tag identifier
pub trait TagStore {
    /// The wrapped NDEF file stored for `id`, if any
    fn lookup(&self, id: &TagId) -> Result<Option<Vec<u8>>, StoreError>;

    /// Record a wrapped NDEF file for `id`, replacing any previous one
    fn store(&self, id: &TagId, ndef_file: Vec<u8>) -> Result<(), StoreError>;
}

impl<T: TagStore + ?Sized> TagStore for Arc<T> {
    fn lookup(&self, id: &TagId) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).lookup(id)
    }

    fn store(&self, id: &TagId, ndef_file: Vec<u8>) -> Result<(), StoreError> {
        (**self).store(id, ndef_file)
    }
}

/// In-memory tag store
#[derive(Debug, Default)]
pub struct MemoryTagStore {
    files: RwLock<HashMap<TagId, Vec<u8>>>,
}

impl MemoryTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    pub fn remove(&self, id: &TagId) -> Option<Vec<u8>> {
        self.files.write().remove(id)
    }
}

impl TagStore for MemoryTagStore {
    fn lookup(&self, id: &TagId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.files.read().get(id).cloned())
    }

    fn store(&self, id: &TagId, ndef_file: Vec<u8>) -> Result<(), StoreError> {
        self.files.write().insert(id.clone(), ndef_file);
        Ok(())
    }
}
