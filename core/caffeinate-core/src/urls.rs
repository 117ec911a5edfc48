//! URL classification.
//!
//! Pure predicates over the visible URL, shared by the bookmark store and
//! the session-state detector. All of them are defensive: an unparsable
//! URL never panics, it just fails the predicate.

use url::Url;

use crate::config::CaffeinateConfig;

pub fn parse(raw: &str) -> Option<Url> {
    Url::parse(raw).ok()
}

/// `scheme://host[:port]` of an absolute URL.
pub fn origin_of(raw: &str) -> Option<String> {
    let parsed = parse(raw)?;
    parsed.host_str()?;
    Some(parsed.origin().ascii_serialization())
}

/// True when the URL lives on the identity provider's origin.
pub fn is_idp_url(raw: &str, cfg: &CaffeinateConfig) -> bool {
    parse(raw)
        .and_then(|u| u.host_str().map(|h| h.contains(&cfg.idp_host_marker)))
        .unwrap_or(false)
}

/// True when the URL is the application's default/home route, where
/// bookmark restoration is attempted.
pub fn is_landing(raw: &str, cfg: &CaffeinateConfig) -> bool {
    let Some(parsed) = parse(raw) else {
        return false;
    };
    let path = parsed.path();
    cfg.landing_paths.iter().any(|p| p == path)
        || cfg.landing_files.iter().any(|f| path.contains(f.as_str()))
}

pub fn is_login_path(raw: &str, cfg: &CaffeinateConfig) -> bool {
    parse(raw).is_some_and(|u| u.path().contains(&cfg.login_path_marker))
}

pub fn is_logout_path(raw: &str, cfg: &CaffeinateConfig) -> bool {
    parse(raw).is_some_and(|u| u.path().contains(&cfg.logout_path_marker))
}

/// The host application stashes its own return URL under this marker while
/// mid-auth; such URLs are transitional and must never be bookmarked.
pub fn has_original_url_marker(raw: &str, cfg: &CaffeinateConfig) -> bool {
    raw.contains(&cfg.original_url_marker)
}

/// The bookmark eligibility predicate.
///
/// Only URLs that are safe to return to after an interruption pass:
/// anything transitional (landing, auth flow, logout, IdP-hosted) would
/// otherwise cause a restore loop.
pub fn bookmark_eligible(raw: &str, cfg: &CaffeinateConfig) -> bool {
    let Some(parsed) = parse(raw) else {
        return false;
    };
    if parsed.host_str().is_none() {
        return false;
    }
    !(is_landing(raw, cfg)
        || is_login_path(raw, cfg)
        || is_logout_path(raw, cfg)
        || has_original_url_marker(raw, cfg)
        || is_idp_url(raw, cfg))
}

/// Whether two URLs name the same destination, ignoring only a trailing
/// query discriminator (the host appends a view/operation key that changes
/// without the destination changing).
pub fn urls_equivalent(a: &str, b: &str, cfg: &CaffeinateConfig) -> bool {
    let (Some(ua), Some(ub)) = (parse(a), parse(b)) else {
        return a == b;
    };

    if ua.scheme() != ub.scheme()
        || ua.host_str() != ub.host_str()
        || ua.port_or_known_default() != ub.port_or_known_default()
        || ua.path() != ub.path()
        || ua.fragment() != ub.fragment()
    {
        return false;
    }

    stripped_query(&ua, &cfg.restore_discriminator_key)
        == stripped_query(&ub, &cfg.restore_discriminator_key)
}

fn stripped_query(url: &Url, discriminator: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.last().is_some_and(|(k, _)| k == discriminator) {
        pairs.pop();
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> CaffeinateConfig {
        CaffeinateConfig::default()
    }

    #[test]
    fn test_eligibility_rejects_transitional_urls() {
        let cfg = cfg();
        for url in [
            "https://host.example.test/",
            "https://host.example.test/dashboard",
            "https://host.example.test/app/dashboard.html",
            "https://host.example.test/users/logout",
            "https://host.example.test/login?next=x",
            "https://host.example.test/saml?original_url=https%3A%2F%2Fhost",
            "https://auth.example.test/authorize",
            "not a url",
        ] {
            assert!(!bookmark_eligible(url, &cfg), "{url} should be ineligible");
        }
    }

    #[test]
    fn test_eligibility_accepts_deep_links() {
        let cfg = cfg();
        for url in [
            "https://host.example.test/app/computers/42",
            "https://host.example.test/policies?id=5&o=r",
        ] {
            assert!(bookmark_eligible(url, &cfg), "{url} should be eligible");
        }
    }

    #[test]
    fn test_landing_detection() {
        let cfg = cfg();
        assert!(is_landing("https://h.example.test/", &cfg));
        assert!(is_landing("https://h.example.test/dashboard", &cfg));
        assert!(is_landing("https://h.example.test/legacy/index.html", &cfg));
        assert!(!is_landing("https://h.example.test/computers/1", &cfg));
    }

    #[test]
    fn test_equivalence_ignores_trailing_discriminator_only() {
        let cfg = cfg();
        assert!(urls_equivalent(
            "https://h.example.test/computers?id=42&o=r",
            "https://h.example.test/computers?id=42",
            &cfg,
        ));
        // A discriminator that is not trailing is part of the destination.
        assert!(!urls_equivalent(
            "https://h.example.test/computers?o=r&id=42",
            "https://h.example.test/computers?id=42",
            &cfg,
        ));
        assert!(!urls_equivalent(
            "https://h.example.test/computers?id=42",
            "https://h.example.test/computers?id=43",
            &cfg,
        ));
        assert!(!urls_equivalent(
            "https://h.example.test/computers/42",
            "https://h.example.test/computers/43",
            &cfg,
        ));
    }

    #[test]
    fn test_origin_of() {
        assert_eq!(
            origin_of("https://h.example.test:8443/a/b?c=d").as_deref(),
            Some("https://h.example.test:8443")
        );
        assert_eq!(origin_of("nonsense"), None);
    }

    #[test]
    fn test_idp_detection_is_host_scoped() {
        let cfg = cfg();
        assert!(is_idp_url("https://auth.example.test/authorize", &cfg));
        // The marker must appear in the host, not the path.
        assert!(!is_idp_url("https://h.example.test/auth.page", &cfg));
    }
}
