//! The browsing-context boundary.
//!
//! Everything the engine knows about "its" tab - the visible URL, the page
//! text, whether the host UI has finished rendering - arrives through this
//! trait, and everything it does to the tab (navigate, emit a synthetic
//! activity event, present the manual-intervention alert) leaves through
//! it. The coordination logic itself never touches a DOM selector.

/// A point-in-time view of the page a tab is showing.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    /// The full visible URL (href).
    pub url: String,
    /// The page's text content. `None` very early in a load, before the
    /// body exists; classification is skipped entirely in that case.
    pub body_text: Option<String>,
    /// Readiness predicate: the host application's UI has finished its own
    /// initial render (a landmark element is present).
    pub ui_ready: bool,
}

/// One independent browsing context, as seen by the engine.
pub trait TabHost {
    /// Reads the context-scoped slot that persists across in-context
    /// navigations but is never shared with sibling tabs.
    fn context_slot(&self) -> Option<String>;

    /// Writes the context-scoped slot.
    fn set_context_slot(&mut self, value: &str);

    /// Current page snapshot.
    fn page(&self) -> PageSnapshot;

    /// Navigates the context. `replace` substitutes the current history
    /// entry instead of pushing a new one. Either way the context unloads;
    /// nothing scheduled in it runs afterwards.
    fn navigate(&mut self, url: &str, replace: bool);

    /// Dispatches the synthetic pointer-down interaction the host
    /// application's idle-timeout listener consumes.
    fn emit_activity(&mut self);

    /// Presents the persistent manual-intervention notice. Idempotent.
    fn show_manual_alert(&mut self);
}
