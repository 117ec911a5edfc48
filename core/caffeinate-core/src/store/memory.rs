//! In-memory shared store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::context::SharedStore;

/// A map shared by handle: clones observe the same slots, which is exactly
/// what simulated sibling tabs need.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a usable map; storage never panics callers.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of live slots. Test/diagnostic convenience.
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SharedStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.slots().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.slots().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.slots().remove(key);
    }
}
