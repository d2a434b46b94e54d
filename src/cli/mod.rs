use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::api::{AdvisoryValidation, HttpCatalogClient};
use crate::app::App;
use crate::config::{ConfigLoader, API_URL_ENV, CONFIG_ENV};

pub mod commands;

use self::commands::{AddArgs, DeleteArgs, EditArgs, ListArgs};

#[derive(Parser, Debug)]
#[command(
    name = "greeneats",
    version,
    about = "Terminal client for the GreenEats agricultural product catalog"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over GREENEATS_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Catalog backend base URL (overrides the config file)
    #[arg(long, env = API_URL_ENV)]
    pub api_url: Option<String>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive catalog (default)
    Tui,
    /// Print the catalog, newest first
    List(ListArgs),
    /// Create a product
    Add(AddArgs),
    /// Update fields of an existing product
    Edit(EditArgs),
    /// Delete a product
    Delete(DeleteArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let command = cli.command.unwrap_or(Commands::Tui);
    let log_target = match command {
        Commands::Tui => LogTarget::File(loader.paths().log_file()),
        _ => LogTarget::Stderr,
    };
    init_tracing(&cli.log_level, &log_target)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;

    let mut config = loader.load_or_init()?;
    if let Some(url) = cli.api_url {
        config.override_api_url(url);
    }
    tracing::info!(base_url = %config.api.base_url, validation = ?config.api.validation, "configuration loaded");

    let client = HttpCatalogClient::from_config(&config.api)
        .with_context(|| format!("creating catalog client for {}", config.api.base_url))?;
    let validation = AdvisoryValidation::new(config.api.validation);
    let config = Arc::new(config);
    match command {
        Commands::Tui => {
            let mut app = App::new(config, Box::new(client))?;
            commands::run_tui(&mut app)
        }
        Commands::List(args) => commands::list_products(&client, args),
        Commands::Add(args) => commands::add_product(&client, validation, args),
        Commands::Edit(args) => commands::edit_product(&client, validation, args),
        Commands::Delete(args) => commands::delete_product(&client, args),
    }
}

/// Where log lines go. The interactive client owns the terminal, so it logs to a file.
#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

fn init_tracing(level: &str, target: &LogTarget) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        match target {
            LogTarget::Stderr => fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init(),
            LogTarget::File(path) => {
                let file = open_log_file(path)?;
                fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init()
            }
        }
        Ok::<(), anyhow::Error>(())
    })
    .map(|_| ())
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}
