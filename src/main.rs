use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::sync::Arc;

use mist::{
    arguments::{config_path_override, is_demo_enabled, is_help_requested, port_override, print_help},
    config::{self, CONFIG_FILE_PATH},
    demo,
    engine::Mist,
    logger::{self, LogTag},
    store::SqliteStore,
    templates::TemplateRenderer,
    webserver::{self, AppState},
};

/// Main entry point for Mist
///
/// Loads configuration, opens the store, optionally starts the demo and runs
/// the webserver until Ctrl+C.
#[tokio::main]
async fn main() {
    logger::init();

    if is_help_requested() {
        print_help();
        std::process::exit(0);
    }

    if let Err(e) = run().await {
        logger::error(LogTag::System, &format!("Mist failed: {:#}", e));
        logger::flush();
        std::process::exit(1);
    }

    logger::flush();
}

async fn run() -> Result<()> {
    logger::info(LogTag::System, "Mist starting up...");

    let override_path = config_path_override();
    let config_path = override_path
        .clone()
        .unwrap_or_else(|| CONFIG_FILE_PATH.to_string());
    let first_run = !Path::new(&config_path).exists();
    match &override_path {
        Some(path) => config::load_config_from_path(path),
        None => config::load_config(),
    }
    .with_context(|| format!("loading configuration from {}", config_path))?;

    if first_run {
        match config::save_config(Some(&config_path)) {
            Ok(()) => logger::info(
                LogTag::Config,
                &format!("Wrote default configuration to {}", config_path),
            ),
            Err(e) => logger::warning(LogTag::Config, &e),
        }
    }

    let mut cfg = config::get_config_clone();
    if let Some(port) = port_override() {
        logger::info(LogTag::Config, &format!("Port overridden to {}", port));
        cfg.webserver.port = port;
    }

    let store = Arc::new(
        SqliteStore::open(&cfg.store.database_path)
            .with_context(|| format!("opening store at {}", cfg.store.database_path))?,
    );
    let renderer = Arc::new(TemplateRenderer::from_config(&cfg.templates));
    let mist = Mist::new(store.clone(), renderer);

    if is_demo_enabled() {
        logger::info(LogTag::Demo, "Demo mode enabled");
        demo::start(&mist, store.clone())
            .await
            .context("starting demo")?;
    }

    ctrlc::set_handler(|| {
        logger::info(LogTag::System, "Ctrl+C received, shutting down...");
        webserver::shutdown();
    })
    .context("installing Ctrl+C handler")?;

    let state = Arc::new(AppState::new(cfg, mist));
    webserver::start_server(state)
        .await
        .map_err(|e| anyhow!(e))?;

    logger::info(LogTag::System, "Mist stopped");
    Ok(())
}
