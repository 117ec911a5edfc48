//! End-to-end coordination scenarios against the simulated host.

use caffeinate_core::{lock, CaffeinateConfig, SharedStore};
use caffeinate_sim::{HostApp, SimWorld, SsoMode};

const APP: &str = "https://h.example.test";
const IDP: &str = "auth.example.test";
const STEP_MS: u64 = 250;

fn world() -> SimWorld {
    let cfg = CaffeinateConfig::default();
    let app = HostApp::new(APP, IDP, cfg.clone());
    SimWorld::new(cfg, app)
}

#[test]
fn end_to_end_two_tab_reauth() {
    let mut w = world();
    w.open_tab("A", "/app/computers/42");
    w.run_for(1_000, STEP_MS);
    w.open_tab("B", "/app/policies/7");

    // Long enough for both URL watchers to bookmark their deep links.
    w.run_for(5_000, STEP_MS);

    w.app.expire_session();
    w.run_for(120_000, STEP_MS);

    // Exactly one tab performed the handshake; the lock is gone; both tabs
    // are back at the pages they were viewing.
    assert_eq!(w.app.sso_redirects, 1);
    assert_eq!(w.app.logins, 1);
    assert!(!w.lock_present());
    assert!(w.app.session_valid());
    assert_eq!(w.tab("A").unwrap().current_url(), format!("{APP}/app/computers/42"));
    assert_eq!(w.tab("B").unwrap().current_url(), format!("{APP}/app/policies/7"));
}

#[test]
fn lock_admits_one_redirect_across_five_staggered_tabs() {
    let mut w = world();
    for i in 1..=5 {
        w.open_tab(&format!("tab{i}"), &format!("/app/computers/{i}"));
        // Staggered phases, all larger than the simulation granularity.
        w.run_for(700 * i, STEP_MS);
    }
    w.run_for(5_000, STEP_MS);

    w.app.expire_session();
    w.run_for(180_000, STEP_MS);

    assert_eq!(w.app.sso_redirects, 1, "one redirect per lock epoch");
    assert!(!w.lock_present());
    for i in 1..=5 {
        assert_eq!(
            w.tab(&format!("tab{i}")).unwrap().current_url(),
            format!("{APP}/app/computers/{i}")
        );
    }
}

#[test]
fn crashed_lock_holder_recovers_via_ttl() {
    let mut w = world();
    w.open_tab("A", "/app/computers/42");
    w.open_tab("B", "/app/policies/7");
    w.run_for(5_000, STEP_MS);

    w.app.expire_session();

    // Run until A grabs the lock, then kill it before its SSO navigation
    // resolves: the classic crash-mid-handshake.
    let mut waited = 0;
    while !w.lock_present() && waited < 15_000 {
        w.step(STEP_MS);
        waited += STEP_MS;
    }
    assert!(w.lock_present(), "a tab should have acquired the lock");
    assert_eq!(w.app.sso_redirects, 0, "crash happens before the redirect lands");
    w.close_tab("A");

    // B must outwait the stale lease (45s TTL), then complete the
    // handshake itself.
    w.run_for(120_000, STEP_MS);
    assert_eq!(w.app.logins, 1);
    assert!(!w.lock_present());
    assert!(w.app.session_valid());
    assert_eq!(w.tab("B").unwrap().current_url(), format!("{APP}/app/policies/7"));
}

#[test]
fn healthy_tab_clears_lock_abandoned_by_crashed_sibling() {
    let mut w = world();
    w.open_tab("B", "/app/policies/7");
    w.run_for(2_000, STEP_MS);

    // A sibling acquired the lock and vanished; the session never actually
    // became invalid.
    let stamp = w.now_ms().to_string();
    w.store.set(lock::REAUTH_LOCK_KEY, &stamp);

    w.run_for(10_000, STEP_MS);
    assert!(!w.lock_present(), "healthy observation clears the abandoned lock");
    assert_eq!(w.app.sso_redirects, 0);
}

#[test]
fn failing_idp_alerts_once_and_never_storms() {
    let mut w = world();
    w.app.set_sso_mode(SsoMode::Fails);
    w.open_tab("A", "/app/computers/1");
    w.run_for(3_000, STEP_MS);

    w.app.expire_session();
    w.run_for(180_000, STEP_MS);

    let a = w.tab("A").unwrap();
    assert_eq!(a.alert_count, 1, "persistent banner shown exactly once");
    assert_eq!(w.app.sso_redirects, 1, "no retry against the failing provider");
    assert!(a.current_url().contains(IDP));
}

#[test]
fn keepalive_defeats_idle_timeout() {
    let mut w = world();
    let now = w.now_ms();
    w.app.set_idle_timeout_ms(300_000, now);
    w.open_tab("A", "/app/computers/1");

    w.run_for(900_000, STEP_MS);

    assert!(w.app.session_valid());
    assert_eq!(w.app.logins, 0, "keepalive means no re-auth was ever needed");
    assert!(w.tab("A").unwrap().activity_total >= 5);
}

#[test]
fn without_keepalive_the_idle_timeout_wins() {
    let mut cfg = CaffeinateConfig::default();
    // Warm-up longer than the run: keepalive never gets a tick.
    cfg.keepalive_warmup_ms = 10_000_000;
    let app = HostApp::new(APP, IDP, cfg.clone());
    let mut w = SimWorld::new(cfg, app);

    let now = w.now_ms();
    w.app.set_idle_timeout_ms(300_000, now);
    w.open_tab("A", "/app/computers/1");

    w.run_for(900_000, STEP_MS);

    // The session idled out and the engine had to re-authenticate.
    assert!(w.app.logins >= 1);
    assert_eq!(w.tab("A").unwrap().activity_total, 0);
}
