use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8000";
pub const DEFAULT_WEATHER_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// listen = "0.0.0.0:8000"
/// database = "/var/lib/citytemp/cities.db"
/// seed_file = "cities.csv"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Socket address the HTTP server binds to.
    pub listen: Option<String>,

    /// SQLite database file.
    pub database: Option<PathBuf>,

    /// CSV file with the default cities (`city,latitude,longitude`).
    pub seed_file: Option<PathBuf>,

    /// Base URL of the Open-Meteo compatible forecast endpoint.
    pub weather_endpoint: Option<String>,

    /// Per-city request timeout, in seconds.
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn listen(&self) -> &str {
        self.listen.as_deref().unwrap_or(DEFAULT_LISTEN)
    }

    /// Database path; falls back to `cities.db` in the platform data directory.
    pub fn database(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database {
            return Ok(path.clone());
        }
        Ok(project_dirs()?.data_dir().join("cities.db"))
    }

    pub fn seed_file(&self) -> PathBuf {
        self.seed_file.clone().unwrap_or_else(|| PathBuf::from("cities.csv"))
    }

    pub fn weather_endpoint(&self) -> &str {
        self.weather_endpoint.as_deref().unwrap_or(DEFAULT_WEATHER_ENDPOINT)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    /// Load config from an explicit file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "citytemp", "citytemp")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
