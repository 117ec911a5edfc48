//! The simulated host application and its identity provider.
//!
//! Serves pages the way the real application would: authenticated routes
//! while the session is valid, a bounce to the login screen when it is
//! not, an SSO endpoint that either completes the handshake or strands the
//! browser on a failing identity-provider page. The app also runs the
//! client-side idle timeout the whole exercise exists to defeat.

use caffeinate_core::CaffeinateConfig;

/// What a navigation resolved to.
#[derive(Debug, Clone)]
pub struct PageLoad {
    pub url: String,
    pub body_text: Option<String>,
    pub ui_ready: bool,
}

impl PageLoad {
    fn ready(url: String, body: &str) -> Self {
        PageLoad {
            url,
            body_text: Some(body.to_string()),
            ui_ready: true,
        }
    }
}

/// Whether the identity provider completes handshakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SsoMode {
    Succeeds,
    Fails,
}

pub struct HostApp {
    origin: String,
    idp_host: String,
    cfg: CaffeinateConfig,
    session_valid: bool,
    sso_mode: SsoMode,
    /// Idle timeout; 0 disables the idle model.
    idle_timeout_ms: u64,
    last_activity_ms: u64,
    /// Completed SSO handshakes.
    pub logins: u32,
    /// Navigations that reached the SSO endpoint. The mutual-exclusion
    /// property is about keeping this at one per outage.
    pub sso_redirects: u32,
}

impl HostApp {
    pub fn new(origin: &str, idp_host: &str, cfg: CaffeinateConfig) -> Self {
        HostApp {
            origin: origin.trim_end_matches('/').to_string(),
            idp_host: idp_host.to_string(),
            cfg,
            session_valid: true,
            sso_mode: SsoMode::Succeeds,
            idle_timeout_ms: 0,
            last_activity_ms: 0,
            logins: 0,
            sso_redirects: 0,
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn session_valid(&self) -> bool {
        self.session_valid
    }

    pub fn set_sso_mode(&mut self, mode: SsoMode) {
        self.sso_mode = mode;
    }

    pub fn set_idle_timeout_ms(&mut self, timeout_ms: u64, now_ms: u64) {
        self.idle_timeout_ms = timeout_ms;
        self.last_activity_ms = now_ms;
    }

    pub fn expire_session(&mut self) {
        if self.session_valid {
            tracing::info!("Host session expired");
            self.session_valid = false;
        }
    }

    /// A pointer-down reached the document; the idle timer resets.
    pub fn note_activity(&mut self, now_ms: u64) {
        self.last_activity_ms = now_ms;
    }

    /// Advances the idle model.
    pub fn tick(&mut self, now_ms: u64) {
        if self.session_valid
            && self.idle_timeout_ms > 0
            && now_ms.saturating_sub(self.last_activity_ms) >= self.idle_timeout_ms
        {
            tracing::info!("Idle timeout reached");
            self.session_valid = false;
        }
    }

    fn is_app_url(&self, url: &str) -> bool {
        url.starts_with(&self.origin)
    }

    fn path_of(url: &str) -> String {
        url::Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| "/".to_string())
    }

    fn login_bounce(&self, requested: &str) -> PageLoad {
        let encoded: String = url::form_urlencoded::byte_serialize(requested.as_bytes()).collect();
        PageLoad::ready(
            format!("{}/login?original_url={}", self.origin, encoded),
            "Please enter your credentials to sign in.",
        )
    }

    /// Resolves an actual navigation, with all its side effects.
    pub fn load(&mut self, requested: &str, now_ms: u64) -> PageLoad {
        let sso_target = self.cfg.sso_target(&self.origin);
        if requested.starts_with(&sso_target) {
            self.sso_redirects += 1;
            return match self.sso_mode {
                SsoMode::Succeeds => {
                    self.session_valid = true;
                    self.logins += 1;
                    self.last_activity_ms = now_ms;
                    tracing::info!(total = self.logins, "SSO handshake completed");
                    PageLoad::ready(format!("{}/dashboard", self.origin), "Dashboard")
                }
                SsoMode::Fails => {
                    tracing::warn!("SSO handshake failed at the identity provider");
                    PageLoad::ready(
                        format!("https://{}/authorize?error=access_denied", self.idp_host),
                        "Sorry, something went wrong completing your sign-in.",
                    )
                }
            };
        }

        if !self.is_app_url(requested) {
            // Off-origin (identity provider) pages are static.
            return PageLoad::ready(requested.to_string(), "Identity provider");
        }

        let path = Self::path_of(requested);
        if path.contains(&self.cfg.login_path_marker) {
            return PageLoad::ready(
                requested.to_string(),
                "Please enter your credentials to sign in.",
            );
        }
        if path.contains(&self.cfg.logout_path_marker) {
            self.session_valid = false;
            return PageLoad::ready(requested.to_string(), "You have successfully logged out.");
        }
        if !self.session_valid {
            return self.login_bounce(requested);
        }
        if self.cfg.landing_paths.iter().any(|p| p == &path) {
            return PageLoad::ready(requested.to_string(), "Dashboard");
        }
        PageLoad::ready(requested.to_string(), &format!("Application page {path}"))
    }

    /// What an already loaded page shows now, without navigation side
    /// effects. Returns `Some` only when the application's own client-side
    /// code would bounce this page (an authenticated view whose session
    /// died); the tab treats that as a real navigation.
    pub fn refresh(&self, current_url: &str) -> Option<PageLoad> {
        if self.session_valid || !self.is_app_url(current_url) {
            return None;
        }
        let path = Self::path_of(current_url);
        if path.contains(&self.cfg.login_path_marker)
            || path.contains(&self.cfg.logout_path_marker)
        {
            return None;
        }
        Some(self.login_bounce(current_url))
    }
}
