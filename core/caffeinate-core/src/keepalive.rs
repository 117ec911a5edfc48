//! Keepalive scheduling and the signal-or-stay-silent rule.
//!
//! One periodic timer, armed after a warm-up delay so it never races the
//! page's own load. Its only decision is "are we allowed to be
//! idle-signal-active": a tick on a Healthy page on the application origin
//! emits the synthetic activity event, anything else stays silent and
//! leaves re-authentication to the orchestrator's own state handling.
//! This component never initiates a redirect.

use crate::config::CaffeinateConfig;
use crate::detect::SessionState;
use crate::schedule::{Scheduler, TaskKind};

/// Arms the warm-up one-shot at startup.
pub fn arm(sched: &mut Scheduler, now_ms: u64, cfg: &CaffeinateConfig) {
    sched.schedule_once(TaskKind::KeepaliveWarmup, now_ms + cfg.keepalive_warmup_ms);
}

/// Promotes the elapsed warm-up into the periodic tick.
pub fn on_warmup_elapsed(sched: &mut Scheduler, now_ms: u64, cfg: &CaffeinateConfig) {
    sched.schedule_every(
        TaskKind::Keepalive,
        now_ms + cfg.keepalive_period_ms,
        cfg.keepalive_period_ms,
    );
}

/// Whether this tick may emit the synthetic activity signal.
pub fn should_signal(state: Option<SessionState>, on_app_origin: bool) -> bool {
    matches!(state, Some(SessionState::Healthy)) && on_app_origin
}
