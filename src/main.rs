pub mod models {
    pub mod accessory;
    pub mod device;
}

pub mod attributes;
pub mod client;
pub mod config;
pub mod gateway;
pub mod mapping;
pub mod state;
pub mod services {
    pub mod commands;
    pub mod console;
    pub mod poll;
    pub mod simulated;
}

use crate::client::HttpGateway;
use crate::config::Config;
use crate::gateway::{Gateway, Serialized};
use crate::services::poll::{self, PollLoop};
use crate::services::simulated::SimulatedGateway;
use crate::services::{commands, console};
use crate::state::AccessoryState;
use log::{error, info, warn};
use std::sync::Arc;

pub fn run() -> Result<(), String> {
    // 1) Load config
    let cfg = Config::from_env()?;
    info!(
        "Config loaded (gateway={}, poll_interval={}s, profile={}, name={}, supply_flow_state_policy={})",
        cfg.gateway_url.as_deref().unwrap_or("simulated"),
        cfg.poll_interval.as_secs(),
        cfg.profile,
        cfg.accessory_name,
        cfg.supply_flow_policy
    );

    // 2) Gateway, one call at a time
    let gateway: Arc<dyn Gateway> = match &cfg.gateway_url {
        Some(url) => Arc::new(Serialized::new(HttpGateway::new(url.as_str(), cfg.gateway_timeout))),
        None => {
            warn!("GATEWAY_URL not set; running against a simulated device");
            Arc::new(Serialized::new(SimulatedGateway::new()))
        }
    };

    // 3) Accessory state with defaults, then write handlers
    let state = Arc::new(AccessoryState::new(cfg.accessory_name.clone(), cfg.profile));
    let handlers = commands::register_all(&state, Arc::clone(&gateway));
    info!(
        "Accessory `{}` exposes {} characteristic(s), {} writable",
        state.name(),
        state.attributes().count(),
        handlers
    );

    // 4) First sync up front so startup problems show immediately
    match poll::sync_once(gateway.as_ref(), &state, &cfg.policies()) {
        Ok(n) => info!("Initial sync complete ({} characteristic(s))", n),
        Err(e) => warn!("Initial sync failed, poll loop will keep retrying: {}", e),
    }

    // 5) Poll loop
    let poller = PollLoop::new(Arc::clone(&gateway), Arc::clone(&state), cfg.policies(), cfg.poll_interval);
    let handle = poller.spawn()?;
    info!("Poll loop started (interval={}s)", cfg.poll_interval.as_secs());

    // 6) Console shell on stdin
    let stdin = std::io::stdin();
    if let Err(e) = console::run(&state, stdin.lock(), std::io::stdout()) {
        warn!("Console stopped: {}", e);
    }
    info!("Console input closed; poll loop keeps running");

    handle.join().map_err(|_| "poll thread panicked".to_string())
}

fn main() {
    let loaded_env = match config::load_env_from_args(std::env::args_os().skip(1)) {
        Ok(info) => info,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    // Init logging after environment so RUST_LOG from .env is respected.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some(info) = loaded_env.as_ref() {
        let origin = if info.explicit { "CLI-specified" } else { "default" };
        info!("Environment loaded from {} .env file: {}", origin, info.path.display());
    }

    info!(
        "nilan-bridge {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run() {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}
