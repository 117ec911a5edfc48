//! Shared fixtures for unit tests.

use std::sync::Arc;

use crate::clock::ManualClock;
use crate::context::CoordinationContext;
use crate::host::{PageSnapshot, TabHost};
use crate::identity;
use crate::store::MemoryStore;

/// A scriptable browsing context. Tests poke the public fields directly.
pub struct FakeHost {
    pub url: String,
    pub body: Option<String>,
    pub ui_ready: bool,
    pub slot: Option<String>,
    pub navigations: Vec<(String, bool)>,
    pub activity_count: u32,
    pub alert_count: u32,
}

impl FakeHost {
    pub fn new(url: &str) -> Self {
        FakeHost {
            url: url.to_string(),
            body: Some(String::new()),
            ui_ready: true,
            slot: None,
            navigations: Vec::new(),
            activity_count: 0,
            alert_count: 0,
        }
    }

    /// The same context after a navigation: the context-scoped slot
    /// survives, everything page-bound resets.
    pub fn reload_at(&self, url: &str) -> FakeHost {
        FakeHost {
            slot: self.slot.clone(),
            ..FakeHost::new(url)
        }
    }
}

impl TabHost for FakeHost {
    fn context_slot(&self) -> Option<String> {
        self.slot.clone()
    }

    fn set_context_slot(&mut self, value: &str) {
        self.slot = Some(value.to_string());
    }

    fn page(&self) -> PageSnapshot {
        PageSnapshot {
            url: self.url.clone(),
            body_text: self.body.clone(),
            ui_ready: self.ui_ready,
        }
    }

    fn navigate(&mut self, url: &str, replace: bool) {
        self.navigations.push((url.to_string(), replace));
    }

    fn emit_activity(&mut self) {
        self.activity_count += 1;
    }

    fn show_manual_alert(&mut self) {
        self.alert_count += 1;
    }
}

/// A context over a fresh in-memory store and a manual clock at `now_ms`.
pub fn test_context(now_ms: u64) -> (CoordinationContext, ManualClock) {
    let mut host = FakeHost::new("https://h.example.test/");
    let tab_id = identity::ensure_identity(&mut host);
    let clock = ManualClock::new(now_ms);
    let ctx = CoordinationContext::new(
        tab_id,
        Arc::new(MemoryStore::new()),
        Arc::new(clock.clone()),
    );
    (ctx, clock)
}
