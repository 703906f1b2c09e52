//! Core library for the `citytemp` city list.
//!
//! This crate defines:
//! - Configuration handling
//! - The SQLite city store and its seed list
//! - Abstraction over weather providers, with an Open-Meteo implementation
//! - Concurrent fetching and the throttled refresh pass
//!
//! It is used by `citytemp-server`, but carries no HTTP surface of its own.

pub mod config;
pub mod fetcher;
pub mod model;
pub mod provider;
pub mod refresh;
pub mod seed;
pub mod store;

pub use config::Config;
pub use model::{City, DefaultCity, FetchOutcome, FetchTarget, sort_for_display};
pub use provider::{FetchError, OpenMeteoProvider, WeatherProvider};
pub use refresh::{RefreshSummary, Refresher};
pub use store::{CityStore, StoreFactory};
