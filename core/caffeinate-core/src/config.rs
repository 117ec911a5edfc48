//! Configuration for the coordination engine.
//!
//! Everything here is an operator-set constant: the identity-provider
//! suffix, the timer periods, the lock TTL, and the URL/text markers the
//! detector matches against. Values load from a TOML file when one exists
//! and fall back to defaults otherwise; a present-but-malformed file is a
//! real error rather than a silent fallback.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CaffeinateError, Result};

const DEFAULT_CONFIG_RELATIVE_PATH: &str = ".caffeinate/config.toml";

/// Operator configuration for one host-application origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaffeinateConfig {
    /// Identity-provider suffix appended to `/oauth2/authorization/` on the
    /// application origin to form the SSO redirect target.
    pub idp_suffix: String,

    /// Marker identifying the identity provider's own origin. A URL whose
    /// host contains this string is never bookmarked and is treated as an
    /// auth page by the detector.
    pub idp_host_marker: String,

    /// Period between synthetic activity signals while Healthy.
    pub keepalive_period_ms: u64,
    /// Warm-up delay before the first keepalive tick, to avoid racing the
    /// page's own load.
    pub keepalive_warmup_ms: u64,

    /// Period of the session-state check.
    pub state_check_period_ms: u64,
    /// Period of the visible-URL watcher that feeds the bookmark store.
    pub url_watch_period_ms: u64,
    /// Period of the UI-readiness poll that fires the first classification.
    pub readiness_poll_ms: u64,

    /// Re-auth lock lease duration. A stored timestamp older than this is
    /// treated as absent regardless of its value.
    pub lock_ttl_ms: u64,
    /// Period of the lock-watch poll run by waiting tabs.
    pub lock_watch_period_ms: u64,

    /// Period of the bookmark-restoration poll.
    pub restore_poll_ms: u64,
    /// Attempt cap for the bookmark-restoration poll.
    pub restore_max_attempts: u32,

    /// Exact paths treated as the landing page.
    pub landing_paths: Vec<String>,
    /// Path fragments (landing files) also treated as landing.
    pub landing_files: Vec<String>,
    /// Path fragment identifying login pages.
    pub login_path_marker: String,
    /// Path fragment identifying logout pages.
    pub logout_path_marker: String,
    /// Query marker the host adds when stashing a return URL of its own.
    pub original_url_marker: String,

    /// URL fragments that signal an auth failure.
    pub failure_url_markers: Vec<String>,
    /// Page-text fragments that signal an auth failure.
    pub failure_text_markers: Vec<String>,
    /// Page text confirming a completed logout.
    pub logged_out_text: String,
    /// Page-text fragments that must ALL be present for the access-denied
    /// re-auth trigger.
    pub denied_text_markers: Vec<String>,
    /// Identity-provider "resume authorization" URL pattern (regex).
    pub resume_auth_pattern: String,

    /// Query key ignored when deciding whether the current URL already
    /// equals a bookmark (the host appends a trailing view discriminator).
    pub restore_discriminator_key: String,
}

impl Default for CaffeinateConfig {
    fn default() -> Self {
        CaffeinateConfig {
            idp_suffix: "idp".to_string(),
            idp_host_marker: "auth.".to_string(),
            keepalive_period_ms: 120_000,
            keepalive_warmup_ms: 45_000,
            state_check_period_ms: 5_000,
            url_watch_period_ms: 2_000,
            readiness_poll_ms: 1_000,
            lock_ttl_ms: 45_000,
            lock_watch_period_ms: 2_000,
            restore_poll_ms: 500,
            restore_max_attempts: 60,
            landing_paths: vec!["/".to_string(), "/dashboard".to_string()],
            landing_files: vec!["dashboard.html".to_string(), "index.html".to_string()],
            login_path_marker: "/login".to_string(),
            logout_path_marker: "/logout".to_string(),
            original_url_marker: "original_url=".to_string(),
            failure_url_markers: vec!["error=".to_string(), "forbidden".to_string()],
            failure_text_markers: vec![
                "something went wrong".to_string(),
                "forbidden".to_string(),
            ],
            logged_out_text: "successfully logged out".to_string(),
            denied_text_markers: vec![
                "Access denied".to_string(),
                "identity provider".to_string(),
            ],
            resume_auth_pattern: r"(?i)/resume.*authoriz|authoriz.*resume".to_string(),
            restore_discriminator_key: "o".to_string(),
        }
    }
}

impl CaffeinateConfig {
    /// The SSO redirect target for a given application origin.
    pub fn sso_target(&self, app_origin: &str) -> String {
        format!(
            "{}/oauth2/authorization/{}",
            app_origin.trim_end_matches('/'),
            self.idp_suffix
        )
    }
}

/// Default on-disk location of the operator config.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(DEFAULT_CONFIG_RELATIVE_PATH))
}

/// Loads the configuration from `path`, or from the default location.
///
/// A missing file yields defaults. A file that exists but cannot be read or
/// parsed is an error: the operator asked for specific settings and silently
/// ignoring them would be worse than failing.
pub fn load_config(path: Option<PathBuf>) -> Result<CaffeinateConfig> {
    let config_path = match path.or_else(default_config_path) {
        Some(path) => path,
        None => return Ok(CaffeinateConfig::default()),
    };

    if !config_path.exists() {
        return Ok(CaffeinateConfig::default());
    }

    let content = fs_err::read_to_string(&config_path).map_err(|err| CaffeinateError::ConfigRead {
        path: config_path.clone(),
        source: err,
    })?;
    toml::from_str::<CaffeinateConfig>(&content).map_err(|err| CaffeinateError::ConfigMalformed {
        path: config_path,
        details: err.to_string(),
    })
}
