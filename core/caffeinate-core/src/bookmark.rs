//! Per-tab deep-link bookmarks.
//!
//! Each tab records the last "safe" URL it visited under its own
//! shared-store key. When a context later finds itself back on the landing
//! page (after an SSO round trip, a reload, a crash), the bookmark is what
//! brings the user back to where they were.
//!
//! Deletion is deferred: a bookmark survives the redirect-replace that
//! consumes it and is removed only when a later check confirms the
//! destination was actually reached. Deleting eagerly at redirect time
//! loses the deep link whenever the navigation is interrupted.

use crate::config::CaffeinateConfig;
use crate::context::CoordinationContext;
use crate::host::TabHost;
use crate::identity::TabId;
use crate::urls;

pub fn bookmark_key(tab_id: &TabId) -> String {
    format!("bookmark_{}", tab_id)
}

/// Result of one restoration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The destination was already reached; bookmark deleted, no navigation.
    Consumed,
    /// A redirect-replace to the bookmark was issued. The bookmark stays
    /// until a later check observes arrival.
    Redirected,
    /// Nothing to do this attempt.
    NotApplicable,
}

impl RestoreOutcome {
    /// Whether the restoration poll should stop.
    pub fn is_settled(&self) -> bool {
        !matches!(self, RestoreOutcome::NotApplicable)
    }
}

/// Records `current_url` as this tab's bookmark iff it passes the
/// eligibility predicate. Transitional URLs are skipped so a restore can
/// never loop through the auth flow.
pub fn save(ctx: &CoordinationContext, cfg: &CaffeinateConfig, current_url: &str) {
    if !urls::bookmark_eligible(current_url, cfg) {
        return;
    }
    ctx.store().set(&bookmark_key(ctx.tab_id()), current_url);
    tracing::debug!(tab_id = %ctx.tab_id(), url = %current_url, "Bookmarked");
}

/// Consumes the bookmark when `current_url` confirms arrival at it.
///
/// This is the deferred half of a redirect-replace restore: the context
/// that issued the redirect unloads, and the fresh context deletes the
/// bookmark here once it finds itself at the destination.
pub fn confirm_arrival(
    ctx: &CoordinationContext,
    cfg: &CaffeinateConfig,
    current_url: &str,
) -> bool {
    let key = bookmark_key(ctx.tab_id());
    let Some(saved) = ctx.store().get(&key) else {
        return false;
    };
    if !urls::urls_equivalent(current_url, &saved, cfg) {
        return false;
    }
    ctx.store().remove(&key);
    tracing::debug!(tab_id = %ctx.tab_id(), url = %saved, "Bookmark consumed at destination");
    true
}

/// Attempts to restore this tab's bookmark against the current URL.
pub fn try_restore(
    ctx: &CoordinationContext,
    cfg: &CaffeinateConfig,
    current_url: &str,
    host: &mut dyn TabHost,
) -> RestoreOutcome {
    let key = bookmark_key(ctx.tab_id());
    if ctx.store().get(&key).is_none() {
        return RestoreOutcome::NotApplicable;
    }

    if confirm_arrival(ctx, cfg, current_url) {
        // Reached by whatever means - consume without navigating.
        return RestoreOutcome::Consumed;
    }
    let Some(saved) = ctx.store().get(&key) else {
        return RestoreOutcome::NotApplicable;
    };

    if urls::is_landing(current_url, cfg) {
        tracing::info!(tab_id = %ctx.tab_id(), url = %saved, "Restoring bookmark");
        host.navigate(&saved, true);
        return RestoreOutcome::Redirected;
    }

    // Not at the destination and not at landing: the user may be navigating
    // somewhere else on purpose. Leave everything alone.
    RestoreOutcome::NotApplicable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_context, FakeHost};

    fn cfg() -> CaffeinateConfig {
        CaffeinateConfig::default()
    }

    const DEEP_LINK: &str = "https://h.example.test/app/computers/42";

    #[test]
    fn test_save_skips_ineligible_urls() {
        let (ctx, _clock) = test_context(0);
        save(&ctx, &cfg(), "https://h.example.test/dashboard");
        save(&ctx, &cfg(), "https://h.example.test/login?x=1");
        assert!(ctx.store().get(&bookmark_key(ctx.tab_id())).is_none());
    }

    #[test]
    fn test_save_overwrites_on_each_eligible_navigation() {
        let (ctx, _clock) = test_context(0);
        save(&ctx, &cfg(), DEEP_LINK);
        save(&ctx, &cfg(), "https://h.example.test/policies/7");
        assert_eq!(
            ctx.store().get(&bookmark_key(ctx.tab_id())).as_deref(),
            Some("https://h.example.test/policies/7")
        );
    }

    #[test]
    fn test_restore_with_no_bookmark_is_not_applicable() {
        let (ctx, _clock) = test_context(0);
        let mut host = FakeHost::new("https://h.example.test/dashboard");
        let outcome = try_restore(&ctx, &cfg(), "https://h.example.test/dashboard", &mut host);
        assert_eq!(outcome, RestoreOutcome::NotApplicable);
        assert!(host.navigations.is_empty());
    }

    #[test]
    fn test_restore_from_landing_redirects_and_keeps_bookmark() {
        let (ctx, _clock) = test_context(0);
        save(&ctx, &cfg(), DEEP_LINK);

        let mut host = FakeHost::new("https://h.example.test/dashboard");
        let outcome = try_restore(&ctx, &cfg(), "https://h.example.test/dashboard", &mut host);

        assert_eq!(outcome, RestoreOutcome::Redirected);
        assert_eq!(host.navigations, vec![(DEEP_LINK.to_string(), true)]);
        // Deferred deletion: still present until arrival is confirmed.
        assert!(ctx.store().get(&bookmark_key(ctx.tab_id())).is_some());
    }

    #[test]
    fn test_exact_match_consumes_without_navigation() {
        let (ctx, _clock) = test_context(0);
        save(&ctx, &cfg(), DEEP_LINK);

        let mut host = FakeHost::new(DEEP_LINK);
        let outcome = try_restore(&ctx, &cfg(), DEEP_LINK, &mut host);

        assert_eq!(outcome, RestoreOutcome::Consumed);
        assert!(host.navigations.is_empty());
        assert!(ctx.store().get(&bookmark_key(ctx.tab_id())).is_none());
    }

    #[test]
    fn test_match_ignores_trailing_discriminator() {
        let (ctx, _clock) = test_context(0);
        save(&ctx, &cfg(), "https://h.example.test/computers?id=42&o=r");

        let current = "https://h.example.test/computers?id=42";
        let mut host = FakeHost::new(current);
        assert_eq!(
            try_restore(&ctx, &cfg(), current, &mut host),
            RestoreOutcome::Consumed
        );
    }

    #[test]
    fn test_no_action_away_from_landing() {
        let (ctx, _clock) = test_context(0);
        save(&ctx, &cfg(), DEEP_LINK);

        let elsewhere = "https://h.example.test/app/policies/9";
        let mut host = FakeHost::new(elsewhere);
        let outcome = try_restore(&ctx, &cfg(), elsewhere, &mut host);

        assert_eq!(outcome, RestoreOutcome::NotApplicable);
        assert!(host.navigations.is_empty());
        assert!(ctx.store().get(&bookmark_key(ctx.tab_id())).is_some());
    }
}
