pub mod models {
    pub mod color;
    pub mod events;
    pub mod luminaire;
    pub mod state;
}

pub mod client;
pub mod config;
pub mod env_file;
pub mod error;
pub mod services {
    pub mod coalescer;
    pub mod color_mode;
    pub mod convert;
    pub mod diff;
    pub mod driver;
    pub mod engine;
    pub mod luminaires;
    pub mod sanitize;
    pub mod state_cache;
    pub mod transition;
}

use crate::client::{BridgeClient, DeviceTransport, DryRunTransport};
use crate::config::Config;
use crate::services::convert::PaletteConversion;
use crate::services::driver::{run_loop, JsonLinesSink};
use crate::services::engine::Engine;
use log::{error, info, warn};
use std::io::BufRead;
use std::sync::mpsc;
use std::thread;

pub fn run() -> Result<(), String> {
    // 1) Load config
    let cfg = Config::from_env()?;
    info!(
        "Config loaded (bridge={}, request_timeout={}ms, default_transition={}ms)",
        cfg.bridge
            .as_ref()
            .map(|b| b.authority.to_string())
            .unwrap_or_else(|| "-".to_string()),
        cfg.request_timeout.as_millis(),
        cfg.default_transition_ms
    );

    // 2) Pick the transport
    let transport: Box<dyn DeviceTransport> = match &cfg.bridge {
        Some(bridge) => Box::new(BridgeClient::new(&bridge.authority, &bridge.username, cfg.request_timeout)),
        None => {
            warn!("HUE_IP not set; running in dry-run mode, device commands are only logged");
            Box::new(DryRunTransport)
        }
    };

    // 3) Stdin reader feeds the single consumer below
    let (tx, rx) = mpsc::channel::<String>();
    let reader = thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Reading stdin failed: {}", e);
                        break;
                    }
                }
            }
        })
        .map_err(|e| format!("failed to spawn stdin reader: {}", e))?;

    // 4) Event loop: one turn per event
    let mut engine = Engine::new(Box::new(PaletteConversion), cfg.default_transition_ms);
    let mut sink = JsonLinesSink::new(std::io::stdout());
    info!("Waiting for events on stdin");
    let summary = run_loop(&mut engine, transport.as_ref(), &mut sink, rx);

    reader.join().map_err(|_| "stdin reader panicked".to_string())?;
    info!(
        "Input closed after {} turn(s): {} command(s) sent, {} send failure(s), {} rejected event(s)",
        summary.turns, summary.commands_sent, summary.send_failures, summary.rejected
    );
    Ok(())
}

fn main() {
    let loaded_env = match env_file::load_from_args(std::env::args_os().skip(1)) {
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
        "luminaire-sync {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run() {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}
