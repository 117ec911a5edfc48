//! A simulated browser tab.
//!
//! Owns the context-scoped slot (the identity's home), the currently
//! loaded page, and the side-effect outbox the world drains after each
//! tick. Navigations are recorded, not performed: the world resolves them
//! on the next step, which is also what gives the simulation its one-step
//! navigation latency.

use caffeinate_core::{PageSnapshot, TabHost};

use crate::app::PageLoad;

pub struct SimTab {
    pub label: String,
    slot: Option<String>,
    page: PageLoad,
    pending_nav: Option<(String, bool)>,
    activity_pending: u32,
    /// Totals kept for assertions and the end-of-run summary.
    pub activity_total: u32,
    pub alert_count: u32,
}

impl SimTab {
    pub fn new(label: &str, initial: PageLoad) -> Self {
        SimTab {
            label: label.to_string(),
            slot: None,
            page: initial,
            pending_nav: None,
            activity_pending: 0,
            activity_total: 0,
            alert_count: 0,
        }
    }

    pub fn current_url(&self) -> &str {
        &self.page.url
    }

    /// Loads a resolved page into the context (a completed navigation).
    pub fn load(&mut self, page: PageLoad) {
        self.page = page;
        self.pending_nav = None;
    }

    pub fn take_pending_nav(&mut self) -> Option<(String, bool)> {
        self.pending_nav.take()
    }

    pub fn take_pending_activity(&mut self) -> u32 {
        std::mem::take(&mut self.activity_pending)
    }
}

impl TabHost for SimTab {
    fn context_slot(&self) -> Option<String> {
        self.slot.clone()
    }

    fn set_context_slot(&mut self, value: &str) {
        self.slot = Some(value.to_string());
    }

    fn page(&self) -> PageSnapshot {
        PageSnapshot {
            url: self.page.url.clone(),
            body_text: self.page.body_text.clone(),
            ui_ready: self.page.ui_ready,
        }
    }

    fn navigate(&mut self, url: &str, replace: bool) {
        tracing::debug!(tab = %self.label, url = %url, replace, "Tab navigating");
        self.pending_nav = Some((url.to_string(), replace));
    }

    fn emit_activity(&mut self) {
        self.activity_pending += 1;
        self.activity_total += 1;
    }

    fn show_manual_alert(&mut self) {
        self.alert_count += 1;
        tracing::warn!(tab = %self.label, "Manual re-auth banner shown");
    }
}
