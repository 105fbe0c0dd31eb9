//! Which tag is being emulated
//!
//! The host application decides which stored tag the device answers as;
//! the emulation core only reads that choice through [`EmulationSelector`].

use std::sync::Arc;

use log::info;
use parking_lot::RwLock;

use crate::store::TagId;

/// Source of the currently emulated tag identifier
pub trait EmulationSelector {
    /// The identifier selected for emulation, `None` when emulation is off
    fn current(&self) -> Option<TagId>;
}

impl<T: EmulationSelector + ?Sized> EmulationSelector for Arc<T> {
    fn current(&self) -> Option<TagId> {
        (**self).current()
    }
}

/// In-process selector shared between the host application and the service
///
/// Clones share the same selection.
#[derive(Debug, Clone, Default)]
pub struct SharedSelector {
    selected: Arc<RwLock<Option<TagId>>>,
}

impl SharedSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing selection
    pub fn with_selection(id: Option<TagId>) -> Self {
        let selector = Self::new();
        *selector.selected.write() = id;
        selector
    }

    pub fn set(&self, id: TagId) {
        info!("Emulating tag {}", id);
        *self.selected.write() = Some(id);
    }

    pub fn clear(&self) {
        if self.selected.write().take().is_some() {
            info!("Emulation stopped");
        }
    }

    pub fn is_emulating(&self) -> bool {
        self.selected.read().is_some()
    }
}

impl EmulationSelector for SharedSelector {
    fn current(&self) -> Option<TagId> {
        self.selected.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let selector = SharedSelector::new();
        assert!(selector.current().is_none());
        assert!(!selector.is_emulating());
    }

    #[test]
    fn test_clones_share_selection() {
        let selector = SharedSelector::new();
        let host_side = selector.clone();
        host_side.set(TagId::from("04A1"));
        assert_eq!(selector.current(), Some(TagId::from("04A1")));

        host_side.clear();
        assert!(selector.current().is_none());
    }

    #[test]
    fn test_with_selection() {
        let selector = SharedSelector::with_selection(Some(TagId::from("AB12")));
        assert!(selector.is_emulating());
    }
}
