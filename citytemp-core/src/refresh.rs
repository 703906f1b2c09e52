//! Throttled weather refresh: fetch only stale cities, store what came back.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;

use crate::fetcher::fetch_all;
use crate::model::{City, FetchTarget};
use crate::provider::WeatherProvider;
use crate::store::CityStore;

/// Minutes a fetched temperature stays fresh.
pub const STALE_AFTER_MINUTES: i64 = 15;

/// Whether `city` needs a new fetch at `now`: never fetched, or fetched more
/// than [`STALE_AFTER_MINUTES`] ago.
pub fn is_stale(city: &City, now: DateTime<Utc>) -> bool {
    match city.updated_at {
        None => true,
        Some(at) => now - at > TimeDelta::minutes(STALE_AFTER_MINUTES),
    }
}

pub fn select_stale(cities: &[City], now: DateTime<Utc>) -> Vec<FetchTarget> {
    cities.iter().filter(|c| is_stale(c, now)).map(FetchTarget::from).collect()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Cities that were stale and got a fetch attempt.
    pub eligible: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Runs one refresh pass against a store.
///
/// There is no locking across passes: two overlapping passes may both see a
/// city as stale and fetch it twice.
#[derive(Debug, Clone)]
pub struct Refresher {
    provider: Arc<dyn WeatherProvider>,
}

impl Refresher {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// Fetch every stale city and write successful results stamped with `now`.
    ///
    /// Failed fetches leave the city untouched. Nothing is fetched when no
    /// city is stale.
    pub async fn refresh(&self, store: &mut CityStore, now: DateTime<Utc>) -> Result<RefreshSummary> {
        let targets = select_stale(&store.list_cities()?, now);
        if targets.is_empty() {
            return Ok(RefreshSummary::default());
        }

        let outcomes = fetch_all(Arc::clone(&self.provider), &targets).await;

        let mut summary = RefreshSummary { eligible: targets.len(), ..Default::default() };
        for outcome in outcomes {
            match outcome.temperature {
                Some(temperature) => {
                    store.apply_weather(outcome.city_id, temperature, now)?;
                    summary.updated += 1;
                }
                None => summary.failed += 1,
            }
        }

        info!(
            eligible = summary.eligible,
            updated = summary.updated,
            failed = summary.failed,
            "weather refresh finished"
        );
        Ok(summary)
    }
}
