use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A city on the user-visible list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature: Option<f64>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Seed record used to (re)build the city list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultCity {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// What the fetcher needs to know about one city.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchTarget {
    pub city_id: i64,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&City> for FetchTarget {
    fn from(city: &City) -> Self {
        Self {
            city_id: city.id,
            latitude: city.latitude,
            longitude: city.longitude,
        }
    }
}

/// Result of fetching one city. `temperature` is `None` when the fetch failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchOutcome {
    pub city_id: i64,
    pub temperature: Option<f64>,
}

/// Sort cities for display: warmest first, cities without a temperature last.
pub fn sort_for_display(cities: &mut [City]) {
    cities.sort_by(|a, b| match (a.temperature, b.temperature) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
