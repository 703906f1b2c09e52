//! Fan-out / fan-in weather fetching.
//!
//! One task per city; each task's failure is reported as "no data" for that
//! city only and never affects its siblings.

use std::{collections::HashMap, sync::Arc};

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::model::{FetchOutcome, FetchTarget};
use crate::provider::WeatherProvider;

/// Fetch the current temperature of every target concurrently.
///
/// Returns exactly one outcome per target, in completion order. Errors are
/// logged and swallowed.
pub async fn fetch_all(
    provider: Arc<dyn WeatherProvider>,
    targets: &[FetchTarget],
) -> Vec<FetchOutcome> {
    let mut tasks = JoinSet::new();
    let mut by_task = HashMap::with_capacity(targets.len());

    for target in targets.iter().copied() {
        let provider = Arc::clone(&provider);
        let handle = tasks.spawn(async move {
            let result = provider.current_temperature(target.latitude, target.longitude).await;
            (target.city_id, result)
        });
        by_task.insert(handle.id(), target.city_id);
    }

    let mut outcomes = Vec::with_capacity(targets.len());

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((city_id, Ok(temperature))) => {
                debug!(city_id, temperature, "fetched current weather");
                outcomes.push(FetchOutcome { city_id, temperature: Some(temperature) });
            }
            Ok((city_id, Err(err))) => {
                warn!(city_id, error = %err, "weather fetch failed");
                outcomes.push(FetchOutcome { city_id, temperature: None });
            }
            Err(join_err) => {
                let Some(&city_id) = by_task.get(&join_err.id()) else {
                    warn!(error = %join_err, "weather task for unknown city failed");
                    continue;
                };
                warn!(city_id, error = %join_err, "weather task aborted");
                outcomes.push(FetchOutcome { city_id, temperature: None });
            }
        }
    }

    outcomes
}
