//! # caffeinate-core
//!
//! Cross-context session-coordination engine: keeps a session alive against
//! a host application's idle timeout while several independent tabs of that
//! application coordinate - through nothing but a slow shared key/value
//! store - over which of them performs the expensive SSO re-authentication
//! redirect, and how each gets back to the page it was on afterwards.
//!
//! ## Design Principles
//!
//! - **Synchronous**: no async runtime dependency. Each tab is a
//!   cooperative scheduler the embedder drives with [`Orchestrator::tick`].
//! - **Not thread-safe**: one orchestrator belongs to one tab's event
//!   loop. The shared store implementations are the only cross-tab pieces.
//! - **Graceful degradation**: missing or corrupt storage reads as absent,
//!   never as an error.
//! - **No hidden globals**: tab identity, store handle, and clock travel in
//!   a [`CoordinationContext`] passed into every component.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use caffeinate_core::{CaffeinateConfig, Orchestrator};
//!
//! let cfg = caffeinate_core::load_config(None)?;
//! let mut orch = Orchestrator::start(cfg, store, clock, &mut host)?;
//! loop { /* advance time, then */ orch.tick(&mut host); }
//! ```

// Public modules
pub mod bookmark;
pub mod clock;
pub mod config;
pub mod context;
pub mod detect;
pub mod error;
pub mod host;
pub mod identity;
pub mod keepalive;
pub mod lock;
pub mod orchestrator;
pub mod schedule;
pub mod store;
pub mod urls;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items at crate root
pub use clock::{ManualClock, SystemClock};
pub use config::{load_config, CaffeinateConfig};
pub use context::{Clock, CoordinationContext, SharedStore};
pub use detect::{SessionState, SessionStateDetector};
pub use error::{CaffeinateError, Result};
pub use host::{PageSnapshot, TabHost};
pub use identity::{ensure_identity, TabId};
pub use orchestrator::{LockAction, Orchestrator, Phase};
pub use store::{JsonFileStore, MemoryStore};
