//! synthi - terminal patch matrix
//!
//! Run with: cargo run -- [config.ron] [patch.ron]

mod app;
mod ui;

use std::{fs::File, path::PathBuf, sync::Mutex};

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use synthi_matrix::EngineConfig;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "synthi.log";
const DEFAULT_PATCH: &str = "patch.ron";

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    // The terminal belongs to the UI, so logs go to a file
    let log = File::create(LOG_FILE).wrap_err("failed to create log file")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(log))
        .with_ansi(false)
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => EngineConfig::load(&path).wrap_err("failed to load config")?,
        None => EngineConfig::default(),
    };
    let patch_path = args.next().map(PathBuf::from);

    app::run(config, patch_path.unwrap_or_else(|| PathBuf::from(DEFAULT_PATCH)))
}
