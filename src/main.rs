use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};

use termdrill::cli::Cli;
use termdrill::config::{default_config_path, Config};
use termdrill::controller::{SessionController, SessionOptions};
use termdrill::services::{DeckDirectory, LocalAttemptStore, ProgressLog};
use termdrill::state::AppState;
use termdrill::tui;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = Config::load(&config_path)?;
    if let Some(dir) = &cli.decks {
        config.decks_dir = Some(dir.clone());
    }

    let log_path = cli.log_file.clone().unwrap_or_else(|| config.log_path());
    init_logging(&log_path, &config.log_level)?;

    let decks = DeckDirectory::new(config.decks_dir());

    if cli.list {
        let nodes = decks
            .list()
            .map_err(|e| format!("Cannot read {}: {}", decks.root().display(), e))?;
        if nodes.is_empty() {
            eprintln!("No decks in {}", decks.root().display());
        }
        for node in nodes {
            let limit = match node.time_limit {
                Some(secs) => termdrill::timer::format_duration(secs),
                None => "untimed".to_string(),
            };
            println!("{:<24} {:<6} {:>10}  {}", node.id, node.item_type.as_str(), limit, node.title);
        }
        return Ok(());
    }

    // clap guarantees a deck unless --list was given
    let Some(deck) = cli.deck.as_deref() else {
        return Err("no deck given".into());
    };

    let options = SessionOptions {
        mode: cli.mode.map(Into::into).unwrap_or(config.default_mode),
        band: config.trigger_band,
        clock: cli.clock_override(),
    };

    let attempts = Arc::new(LocalAttemptStore::new(config.attempts_dir(), decks.clone()));
    let progress = Arc::new(ProgressLog::new(config.progress_path()));

    let session = match SessionController::load(&decks, deck, attempts, progress, options) {
        Ok(session) => session,
        Err(e) => {
            error!("cannot start {}: {}", deck, e);
            tui::run_notice("Cannot start session", &e.to_string())?;
            return Ok(());
        }
    };

    info!("starting {} in {:?} mode", deck, options.mode);
    tui::run_tui(AppState::new(session, config.scroll_step()))?;
    Ok(())
}

/// Send the log to a file; the terminal belongs to the TUI. `RUST_LOG`
/// overrides the configured level.
fn init_logging(path: &Path, level: &str) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    env_logger::Builder::new()
        .parse_filters(level)
        .parse_env("RUST_LOG")
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_secs()
        .init();
    Ok(())
}
