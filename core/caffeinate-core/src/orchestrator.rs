//! The per-tab run loop.
//!
//! Wires identity, bookmarks, the lock, the detector, and keepalive into
//! one cooperative scheduler. Startup first settles bookmark restoration,
//! then runs three independent periodic activities: the session-state
//! check, the visible-URL watcher, and keepalive. A redirect unloads the
//! context: the scheduler is cleared and the orchestrator goes inert,
//! because nothing scheduled in an unloading context ever runs.

use std::sync::Arc;

use crate::bookmark::{self, RestoreOutcome};
use crate::config::CaffeinateConfig;
use crate::context::{Clock, CoordinationContext, SharedStore};
use crate::detect::{SessionState, SessionStateDetector};
use crate::error::Result;
use crate::host::{PageSnapshot, TabHost};
use crate::identity::{self, TabId};
use crate::schedule::{Scheduler, TaskKind};
use crate::{keepalive, lock, urls};

/// What the lock protocol did with an invalid session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockAction {
    /// This tab acquired the lease and navigated to the SSO target.
    Redirected,
    /// Another context holds the lease; a lock-watch poll is running.
    Waiting,
    /// Nothing could be done this tick.
    None,
}

/// Where the orchestrator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Bookmark restoration poll active; the rest of startup is suppressed.
    Restoring,
    /// Steady-state periodic activities running.
    Steady,
    /// A navigation was issued; this context is gone.
    Unloaded,
}

pub struct Orchestrator {
    cfg: CaffeinateConfig,
    ctx: CoordinationContext,
    detector: SessionStateDetector,
    sched: Scheduler,
    phase: Phase,
    restore_attempts: u32,
    last_seen_url: Option<String>,
    /// Application origin learned from the last check off the IdP, used to
    /// build the SSO target and the waiting tab's return navigation.
    app_origin: Option<String>,
    /// Latched by ManualInterventionRequired; cleared by a later Healthy
    /// observation. While set, no redirect is retried.
    manual_hold: bool,
    first_check_done: bool,
}

impl Orchestrator {
    /// Runs the startup sequence for a freshly loaded context.
    pub fn start(
        cfg: CaffeinateConfig,
        store: Arc<dyn SharedStore>,
        clock: Arc<dyn Clock>,
        host: &mut dyn TabHost,
    ) -> Result<Self> {
        let tab_id = identity::ensure_identity(host);
        let detector = SessionStateDetector::new(&cfg)?;
        let ctx = CoordinationContext::new(tab_id, store, clock);

        let page = host.page();
        let mut orch = Orchestrator {
            app_origin: if urls::is_idp_url(&page.url, &cfg) {
                None
            } else {
                urls::origin_of(&page.url)
            },
            cfg,
            ctx,
            detector,
            sched: Scheduler::new(),
            phase: Phase::Steady,
            restore_attempts: 0,
            last_seen_url: None,
            manual_hold: false,
            first_check_done: false,
        };

        let now = orch.ctx.now_ms();
        if bookmark::confirm_arrival(&orch.ctx, &orch.cfg, &page.url) {
            // Arrived at a previously bookmarked destination (typically the
            // tail end of a restore redirect). Straight to steady state.
            orch.begin_steady(now);
        } else if orch.has_bookmark() && urls::is_landing(&page.url, &orch.cfg) {
            tracing::debug!(tab_id = %orch.ctx.tab_id(), "Bookmark pending; starting restoration poll");
            orch.phase = Phase::Restoring;
            orch.sched.schedule_every(
                TaskKind::RestorePoll,
                now + orch.cfg.restore_poll_ms,
                orch.cfg.restore_poll_ms,
            );
        } else {
            orch.begin_steady(now);
        }
        Ok(orch)
    }

    pub fn tab_id(&self) -> &TabId {
        self.ctx.tab_id()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_unloaded(&self) -> bool {
        self.phase == Phase::Unloaded
    }

    /// Earliest instant at which `tick` has work to do.
    pub fn next_wakeup_ms(&self) -> Option<u64> {
        self.sched.next_due_ms()
    }

    /// Dispatches every task due at the context's current time.
    pub fn tick(&mut self, host: &mut dyn TabHost) {
        if self.phase == Phase::Unloaded {
            return;
        }
        let now = self.ctx.now_ms();
        for kind in self.sched.take_due(now) {
            if self.phase == Phase::Unloaded {
                break;
            }
            self.handle(kind, host);
        }
    }

    fn has_bookmark(&self) -> bool {
        self.ctx
            .store()
            .get(&bookmark::bookmark_key(self.ctx.tab_id()))
            .is_some()
    }

    fn begin_steady(&mut self, now: u64) {
        self.phase = Phase::Steady;
        self.sched.schedule_every(
            TaskKind::ReadinessPoll,
            now + self.cfg.readiness_poll_ms,
            self.cfg.readiness_poll_ms,
        );
        self.sched.schedule_every(
            TaskKind::StateCheck,
            now + self.cfg.state_check_period_ms,
            self.cfg.state_check_period_ms,
        );
        self.sched.schedule_every(
            TaskKind::UrlWatch,
            now + self.cfg.url_watch_period_ms,
            self.cfg.url_watch_period_ms,
        );
        keepalive::arm(&mut self.sched, now, &self.cfg);
    }

    fn handle(&mut self, kind: TaskKind, host: &mut dyn TabHost) {
        match kind {
            TaskKind::RestorePoll => self.on_restore_poll(host),
            TaskKind::ReadinessPoll => self.on_readiness_poll(host),
            TaskKind::StateCheck => self.run_state_check(host),
            TaskKind::UrlWatch => self.on_url_watch(host),
            TaskKind::KeepaliveWarmup => {
                keepalive::on_warmup_elapsed(&mut self.sched, self.ctx.now_ms(), &self.cfg)
            }
            TaskKind::Keepalive => self.on_keepalive(host),
            TaskKind::LockWatch => self.on_lock_watch(host),
        }
    }

    fn on_restore_poll(&mut self, host: &mut dyn TabHost) {
        self.restore_attempts += 1;
        let page = host.page();
        match bookmark::try_restore(&self.ctx, &self.cfg, &page.url, host) {
            RestoreOutcome::Redirected => self.unload(),
            RestoreOutcome::Consumed => {
                self.sched.cancel(TaskKind::RestorePoll);
                self.begin_steady(self.ctx.now_ms());
            }
            RestoreOutcome::NotApplicable => {
                if self.restore_attempts >= self.cfg.restore_max_attempts {
                    tracing::debug!(
                        tab_id = %self.ctx.tab_id(),
                        attempts = self.restore_attempts,
                        "Restoration attempts exhausted; bookmark left in place"
                    );
                    self.sched.cancel(TaskKind::RestorePoll);
                    self.begin_steady(self.ctx.now_ms());
                }
            }
        }
    }

    fn on_readiness_poll(&mut self, host: &mut dyn TabHost) {
        if self.first_check_done {
            self.sched.cancel(TaskKind::ReadinessPoll);
            return;
        }
        let page = host.page();
        if page.ui_ready || urls::is_login_path(&page.url, &self.cfg) {
            self.sched.cancel(TaskKind::ReadinessPoll);
            self.run_state_check(host);
        }
    }

    fn on_url_watch(&mut self, host: &mut dyn TabHost) {
        let page = host.page();
        if self.last_seen_url.as_deref() != Some(page.url.as_str()) {
            self.last_seen_url = Some(page.url.clone());
            bookmark::save(&self.ctx, &self.cfg, &page.url);
        }
    }

    fn on_keepalive(&mut self, host: &mut dyn TabHost) {
        let page = host.page();
        let state = self.detector.classify(&self.ctx, &page);
        if keepalive::should_signal(state, !urls::is_idp_url(&page.url, &self.cfg)) {
            host.emit_activity();
            tracing::debug!(tab_id = %self.ctx.tab_id(), "Keepalive signal sent");
        }
    }

    fn on_lock_watch(&mut self, host: &mut dyn TabHost) {
        if lock::is_held(&self.ctx, self.cfg.lock_ttl_ms) {
            return;
        }
        // The re-auth handshake finished (or the lease expired). A fresh
        // load of the application origin re-runs the whole detection
        // pipeline safely - deliberately not the bookmarked deep link.
        let page = host.page();
        match self.app_origin.clone().or_else(|| urls::origin_of(&page.url)) {
            Some(origin) => {
                tracing::info!(tab_id = %self.ctx.tab_id(), "Lock cleared; returning to application origin");
                self.redirect(host, &origin, false);
            }
            None => {
                tracing::warn!(tab_id = %self.ctx.tab_id(), url = %page.url, "Cannot resolve application origin; stopping lock watch");
                self.sched.cancel(TaskKind::LockWatch);
            }
        }
    }

    fn run_state_check(&mut self, host: &mut dyn TabHost) {
        self.first_check_done = true;
        let page = host.page();
        if !urls::is_idp_url(&page.url, &self.cfg) {
            if let Some(origin) = urls::origin_of(&page.url) {
                self.app_origin = Some(origin);
            }
        }

        let Some(state) = self.detector.classify(&self.ctx, &page) else {
            // Body not available yet: no classification this tick.
            return;
        };

        match state {
            SessionState::Healthy => {
                if self.manual_hold {
                    tracing::info!(tab_id = %self.ctx.tab_id(), "Session healthy again; manual hold cleared");
                    self.manual_hold = false;
                }
                self.sched.cancel(TaskKind::LockWatch);
                if !urls::is_idp_url(&page.url, &self.cfg) {
                    lock::release(&self.ctx);
                }
            }
            SessionState::ManualInterventionRequired => {
                if !self.manual_hold {
                    self.manual_hold = true;
                    tracing::warn!(
                        tab_id = %self.ctx.tab_id(),
                        url = %page.url,
                        "Manual intervention required; automation paused"
                    );
                    host.show_manual_alert();
                }
            }
            SessionState::TransitionalAuth => {
                self.ensure_waiting();
            }
            SessionState::LoggedOut | SessionState::LoginRequired => {
                if self.manual_hold {
                    return;
                }
                self.try_acquire_or_wait(host, &page);
            }
        }
    }

    /// The lock protocol: acquire-and-redirect, or wait on the holder.
    fn try_acquire_or_wait(&mut self, host: &mut dyn TabHost, page: &PageSnapshot) -> LockAction {
        // Re-read under the same tick: the detector's view may already be
        // stale by one sibling write.
        if lock::is_held(&self.ctx, self.cfg.lock_ttl_ms) {
            self.ensure_waiting();
            return LockAction::Waiting;
        }

        let Some(origin) = self.app_origin.clone().or_else(|| urls::origin_of(&page.url)) else {
            tracing::warn!(tab_id = %self.ctx.tab_id(), url = %page.url, "Cannot resolve application origin for SSO redirect");
            return LockAction::None;
        };

        lock::acquire(&self.ctx);
        let target = self.cfg.sso_target(&origin);
        tracing::info!(tab_id = %self.ctx.tab_id(), target = %target, "Redirecting to SSO");
        self.redirect(host, &target, false);
        LockAction::Redirected
    }

    fn ensure_waiting(&mut self) {
        if !self.sched.is_scheduled(TaskKind::LockWatch) {
            tracing::debug!(tab_id = %self.ctx.tab_id(), "Re-auth in progress elsewhere; watching lock");
            self.sched.schedule_every(
                TaskKind::LockWatch,
                self.ctx.now_ms() + self.cfg.lock_watch_period_ms,
                self.cfg.lock_watch_period_ms,
            );
        }
    }

    fn redirect(&mut self, host: &mut dyn TabHost, url: &str, replace: bool) {
        host.navigate(url, replace);
        self.unload();
    }

    fn unload(&mut self) {
        self.sched.clear();
        self.phase = Phase::Unloaded;
    }
}
