//! Deterministic multi-tab rehearsal harness for the coordination engine.
//!
//! Everything runs on a manual clock against an in-memory shared store, so
//! scenarios - session expiry with five tabs open, a failing identity
//! provider, a tab crashing mid-handshake - replay identically every time.

pub mod app;
pub mod tab;
pub mod world;

pub use app::{HostApp, PageLoad, SsoMode};
pub use tab::SimTab;
pub use world::SimWorld;
