//! The simulation world: one shared store, one clock, N tabs.
//!
//! Each `step` advances the clock, lets the application's idle model run,
//! resolves pending navigations (rebooting the navigated tab's engine -
//! a navigation is a context reload), bounces pages the application's own
//! client code would bounce, and then ticks every surviving engine. Tabs
//! share nothing but the store and the clock, exactly like the real thing.

use std::sync::Arc;

use caffeinate_core::{CaffeinateConfig, ManualClock, MemoryStore, Orchestrator, SharedStore};

use crate::app::HostApp;
use crate::tab::SimTab;

/// Simulation epoch. Arbitrary but fixed: runs are reproducible.
const START_MS: u64 = 1_700_000_000_000;

struct TabEntry {
    tab: SimTab,
    orch: Option<Orchestrator>,
}

pub struct SimWorld {
    pub clock: ManualClock,
    pub store: Arc<dyn SharedStore>,
    pub app: HostApp,
    cfg: CaffeinateConfig,
    tabs: Vec<TabEntry>,
}

impl SimWorld {
    pub fn new(cfg: CaffeinateConfig, app: HostApp) -> Self {
        Self::with_store(cfg, app, Arc::new(MemoryStore::new()))
    }

    /// A world over a caller-chosen store - the file-backed store turns a
    /// run into something siblings in other processes can observe.
    pub fn with_store(cfg: CaffeinateConfig, app: HostApp, store: Arc<dyn SharedStore>) -> Self {
        SimWorld {
            clock: ManualClock::new(START_MS),
            store,
            app,
            cfg,
            tabs: Vec::new(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        use caffeinate_core::Clock;
        self.clock.now_ms()
    }

    /// Opens a tab at an application path and boots its engine.
    pub fn open_tab(&mut self, label: &str, path: &str) {
        let url = format!("{}{}", self.app.origin(), path);
        let page = self.app.load(&url, self.now_ms());
        tracing::info!(tab = %label, url = %page.url, "Tab opened");
        self.tabs.push(TabEntry {
            tab: SimTab::new(label, page),
            orch: None,
        });
        let idx = self.tabs.len() - 1;
        self.tabs[idx].orch = self.boot_at(idx);
    }

    /// Removes a tab without any cleanup - a crash or an abrupt close.
    /// Whatever it left in the shared store stays there.
    pub fn close_tab(&mut self, label: &str) {
        self.tabs.retain(|e| e.tab.label != label);
        tracing::info!(tab = %label, "Tab closed");
    }

    pub fn tab(&self, label: &str) -> Option<&SimTab> {
        self.tabs.iter().find(|e| e.tab.label == label).map(|e| &e.tab)
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    pub fn lock_present(&self) -> bool {
        self.store.get(caffeinate_core::lock::REAUTH_LOCK_KEY).is_some()
    }

    /// Advances the whole world by `dt_ms`.
    pub fn step(&mut self, dt_ms: u64) {
        self.clock.advance(dt_ms);
        let now = self.now_ms();
        self.app.tick(now);

        // Split borrows: navigations need &mut app, ticking needs &mut tab.
        let mut reboots: Vec<usize> = Vec::new();
        for (idx, entry) in self.tabs.iter_mut().enumerate() {
            if let Some((target, _replace)) = entry.tab.take_pending_nav() {
                let page = self.app.load(&target, now);
                tracing::debug!(tab = %entry.tab.label, url = %page.url, "Navigation resolved");
                entry.tab.load(page);
                reboots.push(idx);
            } else if let Some(bounce) = self.app.refresh(entry.tab.current_url()) {
                tracing::debug!(tab = %entry.tab.label, url = %bounce.url, "Application bounced a dead view");
                entry.tab.load(bounce);
                reboots.push(idx);
            }
        }
        for idx in reboots {
            // Context reload: a fresh engine in the same context.
            let orch = self.boot_at(idx);
            self.tabs[idx].orch = orch;
        }

        for entry in &mut self.tabs {
            if let Some(orch) = &mut entry.orch {
                orch.tick(&mut entry.tab);
            }
            let activity = entry.tab.take_pending_activity();
            if activity > 0 {
                self.app.note_activity(now);
            }
        }
    }

    fn boot_at(&mut self, idx: usize) -> Option<Orchestrator> {
        let cfg = self.cfg.clone();
        let store = Arc::clone(&self.store);
        let clock = Arc::new(self.clock.clone());
        let entry = &mut self.tabs[idx];
        match Orchestrator::start(cfg, store, clock, &mut entry.tab) {
            Ok(orch) => Some(orch),
            Err(err) => {
                tracing::error!(tab = %entry.tab.label, error = %err, "Engine failed to start");
                None
            }
        }
    }

    /// Runs `duration_ms` of simulated time in `step_ms` increments.
    pub fn run_for(&mut self, duration_ms: u64, step_ms: u64) {
        let step_ms = step_ms.max(1);
        let mut elapsed = 0;
        while elapsed < duration_ms {
            self.step(step_ms);
            elapsed += step_ms;
        }
    }
}
