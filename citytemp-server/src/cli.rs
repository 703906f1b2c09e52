use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use inquire::{CustomType, Text};
use tracing::info;

use citytemp_core::{
    City, Config, OpenMeteoProvider, Refresher, StoreFactory, seed, sort_for_display,
};

use crate::routes::{self, AppState};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "citytemp", version, about = "Personal city list with current temperatures")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reload the default cities and serve the web page.
    Serve {
        /// Listen address, e.g. 0.0.0.0:8000.
        #[arg(long)]
        listen: Option<String>,

        /// Seed CSV with `city,latitude,longitude` columns.
        #[arg(long)]
        seed: Option<PathBuf>,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Interactively edit the configuration file.
    Configure,

    /// Fetch weather for stale cities once, then print the list.
    Refresh {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Print the stored list, warmest first.
    List {
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Debug, Args)]
pub struct StoreArgs {
    /// SQLite database file.
    #[arg(long)]
    pub database: Option<PathBuf>,
}

impl StoreArgs {
    fn apply(self, config: &mut Config) {
        if let Some(database) = self.database {
            config.database = Some(database);
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };
        let mut config = Config::load_from(&config_path)?;

        match self.command {
            Command::Serve { listen, seed, store } => {
                store.apply(&mut config);
                if listen.is_some() {
                    config.listen = listen;
                }
                if seed.is_some() {
                    config.seed_file = seed;
                }
                serve(&config).await
            }
            Command::Configure => configure(config, &config_path),
            Command::Refresh { store } => {
                store.apply(&mut config);
                let stores = StoreFactory::new(config.database()?)?;
                let mut db = stores.open()?;
                let summary = refresher(&config)?.refresh(&mut db, Utc::now()).await?;
                println!(
                    "Refreshed {} of {} stale cities ({} failed).",
                    summary.updated, summary.eligible, summary.failed
                );
                print_cities(db.list_cities()?);
                Ok(())
            }
            Command::List { store } => {
                store.apply(&mut config);
                let stores = StoreFactory::new(config.database()?)?;
                print_cities(stores.open()?.list_cities()?);
                Ok(())
            }
        }
    }
}

fn refresher(config: &Config) -> Result<Refresher> {
    let provider = OpenMeteoProvider::new(config.weather_endpoint(), config.request_timeout())
        .context("Failed to build weather HTTP client")?;
    Ok(Refresher::new(Arc::new(provider)))
}

async fn serve(config: &Config) -> Result<()> {
    let database = config.database()?;
    info!("Opening city database at {}", database.display());
    let stores = StoreFactory::new(database)?;

    {
        let mut store = stores.open()?;
        seed::seed_store_or_warn(&mut store, &config.seed_file());
    }

    let state = AppState { stores, refresher: refresher(config)? };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.listen())
        .await
        .with_context(|| format!("Failed to bind {}", config.listen()))?;
    info!("citytemp listening on {}", config.listen());
    axum::serve(listener, app).await?;

    Ok(())
}

fn configure(mut config: Config, path: &std::path::Path) -> Result<()> {
    println!("Configuring citytemp ({})", path.display());

    let listen = Text::new("Listen address:").with_default(config.listen()).prompt()?;
    let database = Text::new("Database file:")
        .with_default(&config.database()?.display().to_string())
        .prompt()?;
    let seed_file = Text::new("Seed CSV file:")
        .with_default(&config.seed_file().display().to_string())
        .prompt()?;
    let endpoint =
        Text::new("Weather endpoint:").with_default(config.weather_endpoint()).prompt()?;
    let timeout = CustomType::<u64>::new("Per-city request timeout (seconds):")
        .with_default(config.request_timeout().as_secs())
        .with_error_message("Please enter a whole number of seconds")
        .prompt()?;

    config.listen = Some(listen);
    config.database = Some(PathBuf::from(database));
    config.seed_file = Some(PathBuf::from(seed_file));
    config.weather_endpoint = Some(endpoint);
    config.request_timeout_secs = Some(timeout);

    config.save_to(path)?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

fn print_cities(mut cities: Vec<City>) {
    sort_for_display(&mut cities);

    if cities.is_empty() {
        println!("No cities.");
        return;
    }

    for city in cities {
        let temperature = city
            .temperature
            .map(|t| format!("{t:.1} °C"))
            .unwrap_or_else(|| "-".to_string());
        let updated = city
            .updated_at
            .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!("{:>4}  {:<24} {:>9}  {}", city.id, city.name, temperature, updated);
    }
}
