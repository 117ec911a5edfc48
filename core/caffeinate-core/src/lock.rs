//! The re-authentication lock.
//!
//! A single shared-store slot holding a millisecond timestamp. It is a
//! lease, not a mutex: the holder is whoever wrote a timestamp younger than
//! the TTL, nobody is recorded as the owner, and expiry needs no active
//! party. The store offers no compare-and-swap, so two tabs whose checks
//! fire inside the same window can both "acquire" - a bounded, documented
//! race whose worst outcome is one extra identity-provider round trip.

use crate::context::CoordinationContext;

/// Single slot, global to the origin - deliberately NOT per tab.
pub const REAUTH_LOCK_KEY: &str = "jss_reauth_lock";

/// Observed lock state at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    /// No usable lease: slot empty, malformed, or older than the TTL.
    Absent,
    /// A lease younger than the TTL exists.
    Held { age_ms: u64 },
}

/// Reads the lock with the TTL applied.
///
/// A malformed stored value parses as absent - storage garbage is never
/// fatal. A timestamp from the future (clock skew between tabs) reads as
/// age 0 and therefore held.
pub fn status(ctx: &CoordinationContext, ttl_ms: u64) -> LockStatus {
    let Some(raw) = ctx.store().get(REAUTH_LOCK_KEY) else {
        return LockStatus::Absent;
    };
    let Ok(acquired_at) = raw.trim().parse::<u64>() else {
        tracing::warn!(value = %raw, "Discarding malformed re-auth lock value");
        return LockStatus::Absent;
    };
    let age_ms = ctx.now_ms().saturating_sub(acquired_at);
    if age_ms < ttl_ms {
        LockStatus::Held { age_ms }
    } else {
        LockStatus::Absent
    }
}

pub fn is_held(ctx: &CoordinationContext, ttl_ms: u64) -> bool {
    matches!(status(ctx, ttl_ms), LockStatus::Held { .. })
}

/// Writes a fresh lease timestamp. This IS the acquisition; see the module
/// docs for the accepted race window.
pub fn acquire(ctx: &CoordinationContext) {
    let now = ctx.now_ms();
    ctx.store().set(REAUTH_LOCK_KEY, &now.to_string());
    tracing::info!(tab_id = %ctx.tab_id(), acquired_at = now, "Acquired re-auth lock");
}

/// Clears the lock if present.
///
/// Called by any tab that observes a Healthy session on the application
/// origin. This both finalizes a successful handshake and self-heals a
/// lease abandoned by a closed or crashed tab.
pub fn release(ctx: &CoordinationContext) {
    if ctx.store().get(REAUTH_LOCK_KEY).is_some() {
        ctx.store().remove(REAUTH_LOCK_KEY);
        tracing::info!(tab_id = %ctx.tab_id(), "Released re-auth lock");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_context;

    const TTL: u64 = 45_000;

    #[test]
    fn test_empty_slot_is_absent() {
        let (ctx, _clock) = test_context(100_000);
        assert_eq!(status(&ctx, TTL), LockStatus::Absent);
    }

    #[test]
    fn test_fresh_lease_is_held() {
        let (ctx, clock) = test_context(100_000);
        acquire(&ctx);
        clock.advance(44_999);
        assert_eq!(status(&ctx, TTL), LockStatus::Held { age_ms: 44_999 });
    }

    #[test]
    fn test_lease_expires_at_ttl_regardless_of_stored_value() {
        let (ctx, clock) = test_context(100_000);
        acquire(&ctx);
        clock.advance(45_000);
        assert_eq!(status(&ctx, TTL), LockStatus::Absent);
        // The slot still physically holds the stale value.
        assert!(ctx.store().get(REAUTH_LOCK_KEY).is_some());
    }

    #[test]
    fn test_malformed_value_is_absent() {
        let (ctx, _clock) = test_context(100_000);
        ctx.store().set(REAUTH_LOCK_KEY, "not-a-timestamp");
        assert_eq!(status(&ctx, TTL), LockStatus::Absent);
    }

    #[test]
    fn test_future_timestamp_reads_as_held() {
        let (ctx, _clock) = test_context(100_000);
        ctx.store().set(REAUTH_LOCK_KEY, "150000");
        assert_eq!(status(&ctx, TTL), LockStatus::Held { age_ms: 0 });
    }

    #[test]
    fn test_release_clears_even_a_stale_lease() {
        let (ctx, clock) = test_context(100_000);
        acquire(&ctx);
        clock.advance(120_000);
        release(&ctx);
        assert!(ctx.store().get(REAUTH_LOCK_KEY).is_none());
    }

    #[test]
    fn test_release_on_empty_slot_is_a_no_op() {
        let (ctx, _clock) = test_context(100_000);
        release(&ctx);
        assert!(ctx.store().get(REAUTH_LOCK_KEY).is_none());
    }
}
