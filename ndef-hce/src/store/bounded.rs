//! Deadline for tag store lookups
//!
//! A reader gives up on a tag that does not answer quickly, so a slow
//! backing store must not hold the APDU exchange. [`BoundedStore`] runs each
//! lookup on a worker thread and stops waiting after the configured
//! timeout. The worker is left to finish on its own.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use log::{debug, warn};

use super::{StoreError, TagId, TagStore};

/// Tag store wrapper with a lookup timeout
#[derive(Debug)]
pub struct BoundedStore<S> {
    inner: Arc<S>,
    timeout: Duration,
}

impl<S> BoundedStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self::from_arc(Arc::new(inner), timeout)
    }

    pub fn from_arc(inner: Arc<S>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &Arc<S> {
        &self.inner
    }
}

impl<S> TagStore for BoundedStore<S>
where
    S: TagStore + Send + Sync + 'static,
{
    fn lookup(&self, id: &TagId) -> Result<Option<Vec<u8>>, StoreError> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let store = Arc::clone(&self.inner);
        let worker_id = id.clone();

        thread::Builder::new()
            .name("tag-lookup".to_string())
            .spawn(move || {
                // The receiver may already have timed out
                let _ = tx.send(store.lookup(&worker_id));
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => {
                debug!("Lookup for {} completed", id);
                result
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!("Lookup for {} timed out after {:?}", id, self.timeout);
                Err(StoreError::Timeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Lookup worker for {} exited without a result", id);
                Err(StoreError::Unavailable("lookup worker exited".to_string()))
            }
        }
    }

    fn store(&self, id: &TagId, ndef_file: Vec<u8>) -> Result<(), StoreError> {
        self.inner.store(id, ndef_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTagStore;

    struct SlowStore(Duration);

    impl TagStore for SlowStore {
        fn lookup(&self, _id: &TagId) -> Result<Option<Vec<u8>>, StoreError> {
            thread::sleep(self.0);
            Ok(Some(vec![0x00, 0x00]))
        }

        fn store(&self, _id: &TagId, _ndef_file: Vec<u8>) -> Result<(), StoreError> {
            Ok(())
        }
    }

    struct PanickingStore;

    impl TagStore for PanickingStore {
        fn lookup(&self, _id: &TagId) -> Result<Option<Vec<u8>>, StoreError> {
            panic!("backing store exploded");
        }

        fn store(&self, _id: &TagId, _ndef_file: Vec<u8>) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_fast_lookup_passes_through() {
        let memory = MemoryTagStore::new();
        let id = TagId::from("04A1");
        memory.store(&id, vec![0x00, 0x01, 0xAA]).unwrap();

        let store = BoundedStore::new(memory, Duration::from_secs(2));
        assert_eq!(store.lookup(&id).unwrap(), Some(vec![0x00, 0x01, 0xAA]));
        assert!(store.lookup(&TagId::from("missing")).unwrap().is_none());
    }

    #[test]
    fn test_slow_lookup_times_out() {
        let store = BoundedStore::new(SlowStore(Duration::from_millis(500)), Duration::from_millis(20));
        assert!(matches!(
            store.lookup(&TagId::from("04A1")),
            Err(StoreError::Timeout(_))
        ));
    }

    #[test]
    fn test_panicking_lookup_is_unavailable() {
        let store = BoundedStore::new(PanickingStore, Duration::from_secs(2));
        assert!(matches!(
            store.lookup(&TagId::from("04A1")),
            Err(StoreError::Unavailable(_))
        ));
    }

    #[test]
    fn test_store_writes_through() {
        let store = BoundedStore::new(MemoryTagStore::new(), Duration::from_millis(50));
        let id = TagId::from("04A1");
        store.store(&id, vec![0x00, 0x00]).unwrap();
        assert_eq!(store.inner().lookup(&id).unwrap(), Some(vec![0x00, 0x00]));
    }
}
