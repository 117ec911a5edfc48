//! The coordination context: the only handles a component may touch.
//!
//! Every tab shares exactly one mutable resource with its siblings - the
//! key/value store - and that store offers no locking, no transactions, and
//! no change notification. Rather than reaching for ambient globals the way
//! a page script would, each component receives a [`CoordinationContext`]
//! carrying the tab identity, the store handle, and the clock.

use std::sync::Arc;

use crate::identity::TabId;

/// Millisecond wall-clock source.
///
/// The protocol only ever compares differences of `now_ms` values, so any
/// monotonically non-decreasing source works. Simulation and tests use
/// [`crate::clock::ManualClock`].
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// The shared key/value store visible to every tab of one origin.
///
/// Implementations are shared handles: cloning or wrapping in `Arc` must
/// observe the same underlying slots. There is deliberately no
/// compare-and-swap here - the storage mechanisms this models don't offer
/// one, and the protocol documents the resulting acquire race instead of
/// pretending to eliminate it.
///
/// Write failures are the implementation's problem to log; a read that
/// fails or returns garbage is simply "value absent" to callers.
pub trait SharedStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Handles threaded through every component of one tab's engine.
pub struct CoordinationContext {
    tab_id: TabId,
    store: Arc<dyn SharedStore>,
    clock: Arc<dyn Clock>,
}

impl CoordinationContext {
    pub fn new(tab_id: TabId, store: Arc<dyn SharedStore>, clock: Arc<dyn Clock>) -> Self {
        CoordinationContext {
            tab_id,
            store,
            clock,
        }
    }

    pub fn tab_id(&self) -> &TabId {
        &self.tab_id
    }

    pub fn store(&self) -> &dyn SharedStore {
        self.store.as_ref()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}
