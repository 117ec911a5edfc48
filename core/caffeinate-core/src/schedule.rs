//! The per-tab cooperative scheduler.
//!
//! Each tab is a single-threaded event loop: every periodic activity
//! (state check, URL watcher, keepalive, restoration poll, lock watch) is a
//! scheduled callback, and no two callbacks within one tab ever run
//! simultaneously. This module models those callbacks as explicit tasks
//! with a due time, an optional period, and - the invariant that matters -
//! a cancellation path. A task that outlives its documented lifetime is a
//! leak and a defect.
//!
//! "Waiting" is always a future due time, never a busy loop.

/// Every periodic activity the orchestrator runs. At most one instance of
/// each kind is scheduled at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Bounded poll attempting bookmark restoration at startup.
    RestorePoll,
    /// One-shot-per-ready poll firing the first classification as soon as
    /// the host UI reports readiness.
    ReadinessPoll,
    /// The 5s session-state check.
    StateCheck,
    /// The 2s visible-URL watcher feeding the bookmark store.
    UrlWatch,
    /// Warm-up delay before keepalive begins.
    KeepaliveWarmup,
    /// The periodic keepalive tick.
    Keepalive,
    /// The 2s poll a waiting tab runs against the re-auth lock.
    LockWatch,
}

#[derive(Debug)]
struct Task {
    kind: TaskKind,
    due_ms: u64,
    period_ms: Option<u64>,
    seq: u64,
}

/// A cancellable task queue with deterministic due-order dispatch.
#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Vec<Task>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler::default()
    }

    /// Schedules a one-shot task, replacing any existing task of the kind.
    pub fn schedule_once(&mut self, kind: TaskKind, due_ms: u64) {
        self.insert(kind, due_ms, None);
    }

    /// Schedules a repeating task, replacing any existing task of the kind.
    pub fn schedule_every(&mut self, kind: TaskKind, first_due_ms: u64, period_ms: u64) {
        self.insert(kind, first_due_ms, Some(period_ms.max(1)));
    }

    fn insert(&mut self, kind: TaskKind, due_ms: u64, period_ms: Option<u64>) {
        self.cancel(kind);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.push(Task {
            kind,
            due_ms,
            period_ms,
            seq,
        });
    }

    pub fn cancel(&mut self, kind: TaskKind) {
        self.tasks.retain(|t| t.kind != kind);
    }

    /// Drops every task. Used when the context unloads.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn is_scheduled(&self, kind: TaskKind) -> bool {
        self.tasks.iter().any(|t| t.kind == kind)
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Earliest due time among scheduled tasks, for drivers that want to
    /// sleep instead of spin.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.tasks.iter().map(|t| t.due_ms).min()
    }

    /// Removes and returns every task due at `now_ms`, in deterministic
    /// (due time, scheduling order) order. Periodic tasks are re-armed for
    /// `now_ms + period`: like a browser interval under a slow event loop,
    /// missed ticks coalesce rather than burst.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<TaskKind> {
        let mut due: Vec<(u64, u64, TaskKind)> = Vec::new();
        for task in &mut self.tasks {
            if task.due_ms <= now_ms {
                due.push((task.due_ms, task.seq, task.kind));
                if let Some(period) = task.period_ms {
                    task.due_ms = now_ms + period;
                }
            }
        }
        self.tasks
            .retain(|t| t.period_ms.is_some() || t.due_ms > now_ms);
        due.sort_by_key(|&(due_ms, seq, _)| (due_ms, seq));
        due.into_iter().map(|(_, _, kind)| kind).collect()
    }
}
