//! SanketaCNC - UDP command-and-control endpoint daemon
//!
//! Binds one UDP socket for advertisement and session traffic, announces
//! itself on the local network, then serves a single controlling peer at a
//! time: `HELLO` handshake, length-prefixed JSON commands, one response per
//! command. A `quit` command stops the daemon.

use sanketa_cnc::config::AppConfig;
use sanketa_cnc::drivers;
use sanketa_cnc::error::{Error, Result};
use sanketa_cnc::server::{CncServer, Dispatcher};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Resolve the configuration file path from the command line.
///
/// Accepts a bare positional path or a `--config <path>` / `-c <path>`
/// flag pair; with no arguments the system-wide `/etc/sanketa-cnc.toml`
/// is used.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    // Flag form wins over a positional path
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    "/etc/sanketa-cnc.toml".to_string()
}

fn main() -> Result<()> {
    let config_path = parse_config_path();
    let config = AppConfig::from_file(&config_path)?;

    // Initialize logger; RUST_LOG overrides the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("SanketaCNC v0.1.0 starting...");
    log::info!("Using config: {}", config_path);

    // Set up shutdown signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    // Build collaborators from config
    let hub_factory = drivers::create_hub_factory(&config.hub)?;
    let sensor = drivers::create_sensor(&config.sensor)?;
    log::info!(
        "Hub driver: {}, distance sensor: {}",
        config.hub.hub_type,
        if sensor.is_some() { "configured" } else { "absent" }
    );

    let dispatcher = Dispatcher::new(hub_factory, sensor, config.timeouts.timings());
    let mut server = CncServer::bind(
        config.network.bind_addr()?,
        dispatcher,
        config.timeouts.read_timeout(),
        Arc::clone(&running),
    )?;

    log::info!("Serving on {}. Press Ctrl-C to stop.", server.local_addr());
    server.run()?;

    log::info!("SanketaCNC stopped");
    Ok(())
}
