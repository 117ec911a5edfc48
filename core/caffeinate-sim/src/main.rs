//! caffeinate-sim: multi-tab rehearsal for the coordination engine.
//!
//! Opens N simulated tabs against a scripted host application, then runs
//! scenarios a real deployment will face: session expiry with every tab
//! open at a deep link, a failing identity provider, idle timeouts with
//! and without keepalive. Useful for eyeballing the event sequence before
//! pointing the engine at anything real.

mod logging;

use std::path::PathBuf;
use std::process;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info};

use caffeinate_sim::{HostApp, SimWorld, SsoMode};

#[derive(Parser)]
#[command(name = "caffeinate-sim")]
#[command(about = "Multi-tab session keepalive rehearsal")]
#[command(version)]
struct Cli {
    /// Number of simultaneously open tabs
    #[arg(long, default_value_t = 2)]
    tabs: u32,

    /// Simulated run length, after all tabs are open
    #[arg(long, default_value_t = 600)]
    duration_secs: u64,

    /// Event-loop granularity of the simulation
    #[arg(long, default_value_t = 250)]
    step_ms: u64,

    /// Force session expiry at this offset into the run
    #[arg(long)]
    expire_at_secs: Option<u64>,

    /// Idle timeout of the simulated application; 0 disables the idle model
    #[arg(long, default_value_t = 300)]
    idle_timeout_secs: u64,

    /// Make the identity provider fail handshakes
    #[arg(long)]
    sso_fail: bool,

    /// Application origin
    #[arg(long, default_value = "https://app.example.test")]
    origin: String,

    /// Identity provider host
    #[arg(long, default_value = "auth.example.test")]
    idp_host: String,

    /// Operator config (TOML); defaults to ~/.caffeinate/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Back the shared store with this JSON file instead of memory
    #[arg(long)]
    store_file: Option<PathBuf>,

    /// Seed for the stagger between tab openings
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let _logging_guard = logging::init(cli.log_file.as_deref());

    if url::Url::parse(&cli.origin).is_err() {
        error!(origin = %cli.origin, "Application origin is not a valid URL");
        process::exit(1);
    }

    let cfg = match caffeinate_core::load_config(cli.config.clone()) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(error = %err, "Failed to load configuration");
            process::exit(1);
        }
    };

    let mut app = HostApp::new(&cli.origin, &cli.idp_host, cfg.clone());
    if cli.sso_fail {
        app.set_sso_mode(SsoMode::Fails);
    }

    let mut world = match &cli.store_file {
        Some(path) => SimWorld::with_store(
            cfg.clone(),
            app,
            std::sync::Arc::new(caffeinate_core::JsonFileStore::new(path)),
        ),
        None => SimWorld::new(cfg, app),
    };
    let now = world.now_ms();
    world
        .app
        .set_idle_timeout_ms(cli.idle_timeout_secs * 1_000, now);

    // Staggered phases: real tabs never open in lockstep.
    let mut rng = StdRng::seed_from_u64(cli.seed);
    for i in 1..=cli.tabs {
        world.open_tab(&format!("tab{i}"), &format!("/app/computers/{i}"));
        world.run_for(rng.gen_range(200..=3_000), cli.step_ms);
    }

    let total_ms = cli.duration_secs * 1_000;
    match cli.expire_at_secs {
        Some(at_secs) => {
            let at_ms = (at_secs * 1_000).min(total_ms);
            world.run_for(at_ms, cli.step_ms);
            world.app.expire_session();
            world.run_for(total_ms - at_ms, cli.step_ms);
        }
        None => world.run_for(total_ms, cli.step_ms),
    }

    summarize(&world, cli.tabs);
}

fn summarize(world: &SimWorld, tabs: u32) {
    info!(
        sso_redirects = world.app.sso_redirects,
        logins = world.app.logins,
        session_valid = world.app.session_valid(),
        lock_present = world.lock_present(),
        "Run complete"
    );
    for i in 1..=tabs {
        let label = format!("tab{i}");
        if let Some(tab) = world.tab(&label) {
            info!(
                tab = %label,
                url = %tab.current_url(),
                activity = tab.activity_total,
                alerts = tab.alert_count,
                "Final tab state"
            );
        }
    }
}
