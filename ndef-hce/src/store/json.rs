//! JSON tag store
//!
//! Keeps every saved tag, plus the identifier selected for emulation, in a
//! single `tags.json` document inside the storage directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::model::{TagData, TagId};
use super::{StoreError, TagStore};
use crate::selector::EmulationSelector;

/// On-disk document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TagDocument {
    #[serde(default)]
    tags: Vec<TagData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    emulating: Option<TagId>,
}

/// Handles persistent storage of saved tags
pub struct JsonTagStore {
    storage_dir: PathBuf,
    state_file: PathBuf,
    document: RwLock<TagDocument>,
    /// Set when the document on disk exists but could not be loaded
    unreadable: AtomicBool,
}

impl JsonTagStore {
    const DEFAULT_STATE_FILE: &'static str = "tags.json";

    /// Create a store rooted at `storage_dir`; call [`load`](Self::load) to read it
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        let storage_dir = storage_dir.into();
        let state_file = storage_dir.join(Self::DEFAULT_STATE_FILE);
        Self {
            storage_dir,
            state_file,
            document: RwLock::new(TagDocument::default()),
            unreadable: AtomicBool::new(false),
        }
    }

    /// Create and load in one step
    pub fn open(storage_dir: impl Into<PathBuf>) -> Self {
        let store = Self::new(storage_dir);
        store.load();
        store
    }

    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    /// Whether the last load found a document it could not parse
    pub fn is_unreadable(&self) -> bool {
        self.unreadable.load(Ordering::SeqCst)
    }

    fn ensure_writable(&self) -> Result<(), StoreError> {
        if self.is_unreadable() {
            return Err(StoreError::Unreadable(self.state_file.clone()));
        }
        Ok(())
    }

    fn ensure_storage_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.storage_dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&self.storage_dir, fs::Permissions::from_mode(0o700));
        }
        Ok(())
    }

    /// Load saved tags from storage
    ///
    /// Returns true if a document was loaded. A missing or unreadable
    /// document leaves the store empty; an unreadable one is also never
    /// overwritten, so every later save fails until it is repaired.
    pub fn load(&self) -> bool {
        if !self.state_file.exists() {
            info!("No saved tags at {:?}", self.state_file);
            *self.document.write() = TagDocument::default();
            self.unreadable.store(false, Ordering::SeqCst);
            return false;
        }

        let parsed = fs::read_to_string(&self.state_file)
            .map_err(StoreError::from)
            .and_then(|content| serde_json::from_str::<TagDocument>(&content).map_err(StoreError::from));

        match parsed {
            Ok(mut document) => {
                document.tags.retain(|tag| !tag.uid.as_str().is_empty());
                info!("Loaded {} tag(s) from {:?}", document.tags.len(), self.state_file);
                *self.document.write() = document;
                self.unreadable.store(false, Ordering::SeqCst);
                true
            }
            Err(e) => {
                warn!("Failed to load saved tags from {:?}, not saving over it: {}", self.state_file, e);
                *self.document.write() = TagDocument::default();
                self.unreadable.store(true, Ordering::SeqCst);
                false
            }
        }
    }

    /// Write the document back to storage
    pub fn save(&self) -> Result<(), StoreError> {
        self.ensure_writable()?;
        self.ensure_storage_dir()?;
        let json = serde_json::to_string_pretty(&*self.document.read())?;

        let tmp = self.state_file.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600));
        }
        fs::rename(&tmp, &self.state_file)?;
        debug!("Saved tags to {:?}", self.state_file);
        Ok(())
    }

    /// Insert or update a tag
    ///
    /// Updating keeps the previous name when the incoming tag only carries
    /// the placeholder name.
    pub fn save_tag(&self, tag: TagData) -> Result<(), StoreError> {
        self.ensure_writable()?;
        {
            let mut document = self.document.write();
            match document.tags.iter_mut().find(|t| t.uid == tag.uid) {
                Some(existing) => {
                    let name = if tag.has_default_name() {
                        existing.name.clone()
                    } else {
                        tag.name.clone()
                    };
                    *existing = TagData { name, ..tag };
                }
                None => document.tags.push(tag),
            }
        }
        self.save()
    }

    pub fn all_tags(&self) -> Vec<TagData> {
        self.document.read().tags.clone()
    }

    pub fn tag(&self, id: &TagId) -> Option<TagData> {
        self.document.read().tags.iter().find(|t| &t.uid == id).cloned()
    }

    /// Delete a tag; returns false if it did not exist
    ///
    /// Deleting the emulated tag also stops emulation.
    pub fn delete_tag(&self, id: &TagId) -> Result<bool, StoreError> {
        self.ensure_writable()?;
        let removed = {
            let mut document = self.document.write();
            let before = document.tags.len();
            document.tags.retain(|t| &t.uid != id);
            if document.emulating.as_ref() == Some(id) {
                document.emulating = None;
            }
            document.tags.len() != before
        };
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// Rename a tag; returns false if it did not exist
    pub fn rename_tag(&self, id: &TagId, name: &str) -> Result<bool, StoreError> {
        self.ensure_writable()?;
        let renamed = {
            let mut document = self.document.write();
            match document.tags.iter_mut().find(|t| &t.uid == id) {
                Some(tag) => {
                    tag.name = name.to_string();
                    true
                }
                None => false,
            }
        };
        if renamed {
            self.save()?;
        }
        Ok(renamed)
    }

    /// Select a tag for emulation, or stop emulating with `None`
    pub fn set_emulating(&self, id: Option<TagId>) -> Result<(), StoreError> {
        self.ensure_writable()?;
        match &id {
            Some(id) => info!("Emulating tag {}", id),
            None => info!("Emulation stopped"),
        }
        self.document.write().emulating = id;
        self.save()
    }
}

impl TagStore for JsonTagStore {
    fn lookup(&self, id: &TagId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .document
            .read()
            .tags
            .iter()
            .find(|t| &t.uid == id)
            .and_then(|t| t.ndef_message.clone())
            .filter(|file| !file.is_empty()))
    }

    fn store(&self, id: &TagId, ndef_file: Vec<u8>) -> Result<(), StoreError> {
        let mut tag = self
            .tag(id)
            .unwrap_or_else(|| TagData::new(id.clone(), ""));
        tag.set_ndef(ndef_file);
        self.save_tag(tag)
    }
}

impl EmulationSelector for JsonTagStore {
    fn current(&self) -> Option<TagId> {
        self.document.read().emulating.clone()
    }
}
