//! Session-state detection.
//!
//! A pure classification over the current URL and page text, evaluated
//! fresh on every check - never cached across checks. The output drives
//! the orchestrator's transitions; the detector itself takes no action.
//!
//! Precedence matters: a failing identity provider looks a lot like an
//! ordinary logout page, and retrying the redirect against it would loop
//! forever. Manual-intervention detection therefore runs first.

use regex::Regex;

use crate::config::CaffeinateConfig;
use crate::context::CoordinationContext;
use crate::host::PageSnapshot;
use crate::{lock, urls};

/// Classification of the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Host application usable; keepalive signaling should continue.
    Healthy,
    /// An auth flow is needed and no sibling holds the re-auth lock.
    LoginRequired,
    /// The session was logged out and no sibling holds the re-auth lock.
    LoggedOut,
    /// The identity provider itself is failing; automation must stop and a
    /// persistent notice must be shown.
    ManualInterventionRequired,
    /// Login/logout detected while a sibling context holds the re-auth
    /// lock: wait, don't storm the identity provider.
    TransitionalAuth,
}

pub struct SessionStateDetector {
    cfg: CaffeinateConfig,
    resume_auth: Regex,
}

impl SessionStateDetector {
    pub fn new(cfg: &CaffeinateConfig) -> crate::error::Result<Self> {
        let resume_auth = Regex::new(&cfg.resume_auth_pattern).map_err(|err| {
            crate::error::CaffeinateError::ConfigPattern {
                field: "resume_auth_pattern".to_string(),
                details: err.to_string(),
            }
        })?;
        Ok(SessionStateDetector {
            cfg: cfg.clone(),
            resume_auth,
        })
    }

    /// Classifies the page, or `None` when the body is not yet available.
    ///
    /// Skipping is deliberate: very early in a load there is nothing to
    /// classify, and guessing either Healthy or LoggedOut would act on a
    /// page that doesn't exist yet.
    pub fn classify(&self, ctx: &CoordinationContext, page: &PageSnapshot) -> Option<SessionState> {
        let body = page.body_text.as_deref()?;
        let url = page.url.as_str();
        let cfg = &self.cfg;

        let on_auth_page = urls::is_login_path(url, cfg) || urls::is_idp_url(url, cfg);
        let has_failure = cfg.failure_url_markers.iter().any(|m| url.contains(m.as_str()))
            || cfg
                .failure_text_markers
                .iter()
                .any(|m| body.contains(m.as_str()));
        if on_auth_page && has_failure {
            return Some(SessionState::ManualInterventionRequired);
        }

        let logged_out =
            urls::is_logout_path(url, cfg) || body.contains(cfg.logged_out_text.as_str());
        // The denied markers must ALL appear; an empty list disables the rule
        // rather than matching everything vacuously.
        let access_denied = !cfg.denied_text_markers.is_empty()
            && cfg
                .denied_text_markers
                .iter()
                .all(|m| body.contains(m.as_str()));
        let login_required = urls::is_login_path(url, cfg)
            || urls::has_original_url_marker(url, cfg)
            || self.resume_auth.is_match(url)
            || access_denied;

        if logged_out || login_required {
            if lock::is_held(ctx, cfg.lock_ttl_ms) {
                return Some(SessionState::TransitionalAuth);
            }
            return Some(if logged_out {
                SessionState::LoggedOut
            } else {
                SessionState::LoginRequired
            });
        }

        Some(SessionState::Healthy)
    }
}
