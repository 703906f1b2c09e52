//! Default city list loaded from a CSV file at startup.

use std::{io::Read, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use tracing::{info, warn};

use crate::model::DefaultCity;
use crate::store::CityStore;

#[derive(Debug, Deserialize)]
struct SeedRow {
    city: String,
    latitude: String,
    longitude: String,
}

impl SeedRow {
    fn into_default_city(self) -> Result<DefaultCity> {
        if self.city.trim().is_empty() {
            bail!("empty city name");
        }
        Ok(DefaultCity {
            latitude: parse_coordinate("latitude", &self.latitude)?,
            longitude: parse_coordinate("longitude", &self.longitude)?,
            name: self.city,
        })
    }
}

fn parse_coordinate(column: &str, raw: &str) -> Result<f64> {
    raw.trim().parse().map_err(|_| anyhow!("invalid {column} '{raw}'"))
}

/// Parse seed rows (`city,latitude,longitude` header, extra columns ignored).
///
/// City names are kept verbatim; blank names make the row malformed.
pub fn parse_seed<R: Read>(reader: R) -> Result<Vec<DefaultCity>> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);

    let defaults = rdr
        .deserialize::<SeedRow>()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(anyhow::Error::from)
                .and_then(SeedRow::into_default_city)
                .with_context(|| format!("Malformed seed row {}", i + 1))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(defaults)
}

pub fn load_seed_file(path: &Path) -> Result<Vec<DefaultCity>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open seed file: {}", path.display()))?;
    parse_seed(file).with_context(|| format!("Failed to parse seed file: {}", path.display()))
}

/// Rebuild the default and visible city lists from `path`.
///
/// Returns the number of cities now on the list.
pub fn seed_store(store: &mut CityStore, path: &Path) -> Result<usize> {
    let defaults = load_seed_file(path)?;
    store.replace_defaults(&defaults)
}

/// Startup seeding. Failures are logged and the store keeps its previous
/// contents.
pub fn seed_store_or_warn(store: &mut CityStore, path: &Path) {
    match seed_store(store, path) {
        Ok(count) => info!(count, seed = %path.display(), "reloaded cities from seed file"),
        Err(err) => warn!(seed = %path.display(), error = %format!("{err:#}"), "seeding failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SEED: &str = "city,latitude,longitude\nTokyo,35.6,139.7\nOslo,59.9,10.7\n";

    #[test]
    fn parses_rows_in_file_order() {
        let defaults = parse_seed(SEED.as_bytes()).unwrap();

        assert_eq!(
            defaults,
            vec![
                DefaultCity { name: "Tokyo".into(), latitude: 35.6, longitude: 139.7 },
                DefaultCity { name: "Oslo".into(), latitude: 59.9, longitude: 10.7 },
            ]
        );
    }

    #[test]
    fn columns_are_matched_by_header() {
        let csv = "country,longitude,city,latitude\nJP,139.7,\"Tokyo, Japan\",35.6\n";
        let defaults = parse_seed(csv.as_bytes()).unwrap();

        assert_eq!(defaults[0].name, "Tokyo, Japan");
        assert_eq!((defaults[0].latitude, defaults[0].longitude), (35.6, 139.7));
    }

    #[test]
    fn non_numeric_coordinate_is_an_error() {
        let csv = "city,latitude,longitude\nTokyo,north,139.7\n";
        let err = parse_seed(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Malformed seed row 1"));
    }

    #[test]
    fn blank_city_name_is_an_error() {
        for csv in ["city,latitude,longitude\n,35.6,139.7\n", "city,latitude,longitude\n  ,35.6,139.7\n"] {
            let err = parse_seed(csv.as_bytes()).unwrap_err();
            assert!(err.to_string().contains("Malformed seed row 1"));
        }
    }

    #[test]
    fn names_are_kept_verbatim() {
        let csv = "city,latitude,longitude\n Tokyo, 35.6 ,139.7\nTokyo,35.6,139.7\n";
        let defaults = parse_seed(csv.as_bytes()).unwrap();

        assert_eq!(defaults[0].name, " Tokyo");
        assert_eq!(defaults[0].latitude, 35.6);
        assert_eq!(defaults[1].name, "Tokyo");
    }

    #[test]
    fn seeding_populates_both_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cities.csv");
        fs::write(&path, SEED).unwrap();

        let mut store = CityStore::open_in_memory().unwrap();
        assert_eq!(seed_store(&mut store, &path).unwrap(), 2);

        assert_eq!(store.default_cities().unwrap().len(), 2);
        let cities = store.list_cities().unwrap();
        assert_eq!(cities.len(), 2);
        assert!(cities.iter().all(|c| c.temperature.is_none()));
    }

    #[test]
    fn failed_seeding_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.csv");
        let bad = dir.path().join("bad.csv");
        fs::write(&good, SEED).unwrap();
        fs::write(&bad, "city,latitude,longitude\nLima,-12.0,oops\n").unwrap();

        let mut store = CityStore::open_in_memory().unwrap();
        seed_store(&mut store, &good).unwrap();

        seed_store_or_warn(&mut store, &bad);
        seed_store_or_warn(&mut store, &dir.path().join("missing.csv"));

        assert_eq!(store.list_cities().unwrap().len(), 2);
        assert_eq!(store.default_cities().unwrap().len(), 2);
    }
}
