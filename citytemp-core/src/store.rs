//! SQLite-backed city storage.
//!
//! `CityStore` wraps a single connection and is meant to live for one unit of
//! work (an HTTP request, a CLI command). `StoreFactory` is the long-lived
//! piece: it knows where the database is and hands out fresh stores.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use crate::model::{City, DefaultCity};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS cities (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE CHECK (trim(name) <> ''),
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        temperature REAL,
        updated_at TEXT
    );

    CREATE TABLE IF NOT EXISTS default_cities (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL CHECK (trim(name) <> ''),
        latitude REAL NOT NULL,
        longitude REAL NOT NULL
    );
"#;

// Duplicate seed names collapse onto the first occurrence.
const MIRROR_DEFAULTS: &str = "INSERT OR IGNORE INTO cities (name, latitude, longitude)
     SELECT name, latitude, longitude FROM default_cities ORDER BY id";

/// Opens a `CityStore` per unit of work against one database file.
#[derive(Debug, Clone)]
pub struct StoreFactory {
    path: PathBuf,
}

impl StoreFactory {
    /// Create the factory, making sure the parent directory and schema exist.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let factory = Self { path };
        factory.open()?;
        Ok(factory)
    }

    pub fn open(&self) -> Result<CityStore> {
        CityStore::open(&self.path)
    }
}

/// City and default-city tables behind one SQLite connection.
///
/// The connection is closed when the store is dropped.
#[derive(Debug)]
pub struct CityStore {
    conn: Connection,
}

impl CityStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open city database: {}", path.display()))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::with_connection(conn)
    }

    /// Fresh in-memory database; nothing is shared between two of these.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).context("Failed to initialize city schema")?;
        Ok(Self { conn })
    }

    fn row_to_city(row: &rusqlite::Row) -> rusqlite::Result<City> {
        Ok(City {
            id: row.get(0)?,
            name: row.get(1)?,
            latitude: row.get(2)?,
            longitude: row.get(3)?,
            temperature: row.get(4)?,
            updated_at: row.get::<_, Option<DateTime<Utc>>>(5)?,
        })
    }

    /// All cities, in no particular order.
    pub fn list_cities(&self) -> Result<Vec<City>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, latitude, longitude, temperature, updated_at FROM cities",
        )?;
        let cities = stmt
            .query_map([], Self::row_to_city)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list cities")?;
        Ok(cities)
    }

    #[cfg(test)]
    pub fn get_city(&self, id: i64) -> Result<Option<City>> {
        use rusqlite::OptionalExtension;

        let city = self
            .conn
            .query_row(
                "SELECT id, name, latitude, longitude, temperature, updated_at
                 FROM cities WHERE id = ?1",
                params![id],
                Self::row_to_city,
            )
            .optional()
            .with_context(|| format!("Failed to load city {id}"))?;
        Ok(city)
    }

    /// Insert a city unless one with exactly the same name exists.
    ///
    /// Returns whether a row was inserted. Blank names are an error.
    pub fn add_city(&self, name: &str, latitude: f64, longitude: f64) -> Result<bool> {
        if name.trim().is_empty() {
            bail!("City name must not be empty");
        }

        let inserted = self
            .conn
            .execute(
                "INSERT INTO cities (name, latitude, longitude) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO NOTHING",
                params![name, latitude, longitude],
            )
            .with_context(|| format!("Failed to add city '{name}'"))?;
        Ok(inserted == 1)
    }

    /// Delete a city by id. Returns whether it existed.
    pub fn remove_city(&self, id: i64) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM cities WHERE id = ?1", params![id])
            .with_context(|| format!("Failed to remove city {id}"))?;
        Ok(removed == 1)
    }

    /// Replace every city with a fresh copy of the default list.
    ///
    /// Returns the number of cities afterwards.
    pub fn reset_cities(&mut self) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM cities", [])?;
        let count = tx.execute(MIRROR_DEFAULTS, [])?;
        tx.commit().context("Failed to reset cities")?;
        Ok(count)
    }

    /// Record a fetched temperature. Returns whether the city existed.
    pub fn apply_weather(&self, id: i64, temperature: f64, at: DateTime<Utc>) -> Result<bool> {
        let updated = self
            .conn
            .execute(
                "UPDATE cities SET temperature = ?1, updated_at = ?2 WHERE id = ?3",
                params![temperature, at, id],
            )
            .with_context(|| format!("Failed to store weather for city {id}"))?;
        Ok(updated == 1)
    }

    /// The seed list, in insertion order.
    pub fn default_cities(&self) -> Result<Vec<DefaultCity>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, latitude, longitude FROM default_cities ORDER BY id")?;
        let defaults = stmt
            .query_map([], |row| {
                Ok(DefaultCity {
                    name: row.get(0)?,
                    latitude: row.get(1)?,
                    longitude: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list default cities")?;
        Ok(defaults)
    }

    /// Clear both tables, store `defaults` as the seed list and mirror it into
    /// the city list. All or nothing.
    pub fn replace_defaults(&mut self, defaults: &[DefaultCity]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM cities", [])?;
        tx.execute("DELETE FROM default_cities", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO default_cities (name, latitude, longitude) VALUES (?1, ?2, ?3)",
            )?;
            for city in defaults {
                insert.execute(params![city.name, city.latitude, city.longitude])?;
            }
        }
        let count = tx.execute(MIRROR_DEFAULTS, [])?;
        tx.commit().context("Failed to replace default cities")?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn defaults() -> Vec<DefaultCity> {
        vec![
            DefaultCity { name: "Tokyo".into(), latitude: 35.6, longitude: 139.7 },
            DefaultCity { name: "Oslo".into(), latitude: 59.9, longitude: 10.7 },
        ]
    }

    fn seeded_store() -> CityStore {
        let mut store = CityStore::open_in_memory().unwrap();
        store.replace_defaults(&defaults()).unwrap();
        store
    }

    fn names(store: &CityStore) -> Vec<String> {
        let mut names: Vec<_> = store.list_cities().unwrap().into_iter().map(|c| c.name).collect();
        names.sort();
        names
    }

    #[test]
    fn replace_defaults_mirrors_into_cities() {
        let store = seeded_store();

        let cities = store.list_cities().unwrap();
        assert_eq!(cities.len(), 2);
        assert!(cities.iter().all(|c| c.temperature.is_none() && c.updated_at.is_none()));
        assert_eq!(store.default_cities().unwrap(), defaults());
    }

    #[test]
    fn add_city_twice_keeps_one() {
        let store = CityStore::open_in_memory().unwrap();

        assert!(store.add_city("X", 1.0, 2.0).unwrap());
        assert!(!store.add_city("X", 3.0, 4.0).unwrap());

        let cities = store.list_cities().unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!((cities[0].latitude, cities[0].longitude), (1.0, 2.0));
    }

    #[test]
    fn add_city_rejects_blank_names() {
        let store = CityStore::open_in_memory().unwrap();

        for name in ["", "   "] {
            let err = store.add_city(name, 1.0, 2.0).unwrap_err();
            assert!(err.to_string().contains("must not be empty"));
        }
        assert!(store.list_cities().unwrap().is_empty());
    }

    #[test]
    fn schema_rejects_blank_default_names() {
        let mut store = CityStore::open_in_memory().unwrap();
        store
            .replace_defaults(&[DefaultCity { name: "Oslo".into(), latitude: 59.9, longitude: 10.7 }])
            .unwrap();

        let blank = DefaultCity { name: " ".into(), latitude: 0.0, longitude: 0.0 };
        assert!(store.replace_defaults(&[blank]).is_err());

        assert_eq!(names(&store), ["Oslo"]);
    }

    #[test]
    fn add_city_name_match_is_case_sensitive() {
        let store = CityStore::open_in_memory().unwrap();

        store.add_city("paris", 48.8, 2.3).unwrap();
        store.add_city("Paris", 48.8, 2.3).unwrap();

        assert_eq!(store.list_cities().unwrap().len(), 2);
    }

    #[test]
    fn remove_missing_city_changes_nothing() {
        let store = seeded_store();
        let before = store.list_cities().unwrap();

        assert!(!store.remove_city(9_999).unwrap());
        assert_eq!(store.list_cities().unwrap(), before);
    }

    #[test]
    fn remove_existing_city() {
        let store = seeded_store();
        let tokyo = store.list_cities().unwrap().into_iter().find(|c| c.name == "Tokyo").unwrap();

        assert!(store.remove_city(tokyo.id).unwrap());
        assert_eq!(names(&store), ["Oslo"]);
    }

    #[test]
    fn reset_restores_defaults_and_clears_weather() {
        let mut store = seeded_store();
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();

        for city in store.list_cities().unwrap() {
            store.apply_weather(city.id, 12.5, now).unwrap();
        }
        store.add_city("Lima", -12.0, -77.0).unwrap();
        let oslo = store.list_cities().unwrap().into_iter().find(|c| c.name == "Oslo").unwrap();
        store.remove_city(oslo.id).unwrap();

        assert_eq!(store.reset_cities().unwrap(), 2);

        let cities = store.list_cities().unwrap();
        assert_eq!(names(&store), ["Oslo", "Tokyo"]);
        assert!(cities.iter().all(|c| c.temperature.is_none() && c.updated_at.is_none()));
    }

    #[test]
    fn apply_weather_sets_temperature_and_timestamp() {
        let store = seeded_store();
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let tokyo = store.list_cities().unwrap().into_iter().find(|c| c.name == "Tokyo").unwrap();

        assert!(store.apply_weather(tokyo.id, 20.0, now).unwrap());

        let tokyo = store.get_city(tokyo.id).unwrap().unwrap();
        assert_eq!(tokyo.temperature, Some(20.0));
        assert_eq!(tokyo.updated_at, Some(now));
    }

    #[test]
    fn apply_weather_to_missing_city_is_a_noop() {
        let store = seeded_store();
        let before = store.list_cities().unwrap();

        assert!(!store.apply_weather(424_242, 1.0, Utc::now()).unwrap());
        assert_eq!(store.list_cities().unwrap(), before);
    }

    #[test]
    fn duplicate_seed_names_collapse() {
        let mut store = CityStore::open_in_memory().unwrap();
        let mut seed = defaults();
        seed.push(DefaultCity { name: "Tokyo".into(), latitude: 0.0, longitude: 0.0 });

        assert_eq!(store.replace_defaults(&seed).unwrap(), 2);
        let tokyo = store.list_cities().unwrap().into_iter().find(|c| c.name == "Tokyo").unwrap();
        assert_eq!(tokyo.latitude, 35.6);
    }

    #[test]
    fn factory_stores_share_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let factory = StoreFactory::new(dir.path().join("data").join("cities.db")).unwrap();

        factory.open().unwrap().add_city("Berlin", 52.5, 13.4).unwrap();

        let cities = factory.open().unwrap().list_cities().unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].name, "Berlin");
    }
}
