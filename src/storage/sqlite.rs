//! SQLite event store.
//!
//! Keeps one row per event code. Writes are upserts, so a feed revision of
//! an already-stored event (a new magnitude, say) overwrites the row in place
//! instead of adding a duplicate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, named_params};

use crate::error::Result;
use crate::models::{EventRecord, StorageConfig};

use super::{DB_FILE, TEST_DB_FILE};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS quakes (
    code                    TEXT PRIMARY KEY NOT NULL,
    country                 TEXT NOT NULL,
    place                   TEXT NOT NULL,
    latitude                REAL NOT NULL,
    longitude               REAL NOT NULL,
    depth                   REAL NOT NULL,
    magnitude               REAL NOT NULL,
    magnitude_type          TEXT NOT NULL,
    event_type              TEXT NOT NULL,
    types                   TEXT NOT NULL,
    occurred_at_utc         TEXT NOT NULL,
    timezone_offset_minutes INTEGER NOT NULL,
    detail_url              TEXT NOT NULL,
    link_url                TEXT NOT NULL,
    announcement_text       TEXT NOT NULL,
    nearby_places           TEXT NOT NULL,
    first_seen_at           TEXT NOT NULL,
    updated_at              TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_quakes_occurred_at ON quakes (occurred_at_utc);
"#;

const COLUMNS: &str = "code, country, place, latitude, longitude, depth, magnitude, \
     magnitude_type, event_type, types, occurred_at_utc, timezone_offset_minutes, \
     detail_url, link_url, announcement_text, nearby_places";

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Durable table of seen events, keyed by event code.
pub struct EventStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl EventStore {
    /// Open (creating if needed) the store under `base_folder`.
    ///
    /// `test_mode` selects a separate file so tests never touch the
    /// production history.
    pub fn open(base_folder: impl AsRef<Path>, test_mode: bool) -> Result<Self> {
        Self::open_with_timeout(base_folder, test_mode, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open the store described by configuration.
    pub fn open_with(config: &StorageConfig, test_mode: bool) -> Result<Self> {
        Self::open_with_timeout(
            &config.base_folder,
            test_mode,
            Duration::from_millis(config.busy_timeout_ms),
        )
    }

    /// Open with an explicit lock wait bound.
    pub fn open_with_timeout(
        base_folder: impl AsRef<Path>,
        test_mode: bool,
        busy_timeout: Duration,
    ) -> Result<Self> {
        let base_folder = base_folder.as_ref();
        std::fs::create_dir_all(base_folder)?;

        let path = base_folder.join(Self::file_name(test_mode));
        log::debug!("Opening event store at {}", path.display());

        let conn = Connection::open(&path)?;
        let store = Self {
            conn,
            path: Some(path),
        };
        store.initialize(busy_timeout)?;
        Ok(store)
    }

    /// Open a throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        store.initialize(DEFAULT_BUSY_TIMEOUT)?;
        Ok(store)
    }

    /// Database file name for the given mode.
    pub fn file_name(test_mode: bool) -> &'static str {
        if test_mode { TEST_DB_FILE } else { DB_FILE }
    }

    /// Backing file, or `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn initialize(&self, busy_timeout: Duration) -> Result<()> {
        self.conn.busy_timeout(busy_timeout)?;
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Insert a record, or overwrite the row with the same code.
    pub fn upsert(&self, record: &EventRecord) -> Result<UpsertOutcome> {
        let existed = self.contains(&record.code)?;
        let now = format_timestamp(&Utc::now());
        let types = serde_json::to_string(&record.types)?;
        let nearby_places = serde_json::to_string(&record.nearby_places)?;

        self.conn.execute(
            &format!(
                "INSERT INTO quakes ({COLUMNS}, first_seen_at, updated_at)
                 VALUES (:code, :country, :place, :latitude, :longitude, :depth, :magnitude,
                         :magnitude_type, :event_type, :types, :occurred_at_utc,
                         :timezone_offset_minutes, :detail_url, :link_url,
                         :announcement_text, :nearby_places, :now, :now)
                 ON CONFLICT(code) DO UPDATE SET
                     country = excluded.country,
                     place = excluded.place,
                     latitude = excluded.latitude,
                     longitude = excluded.longitude,
                     depth = excluded.depth,
                     magnitude = excluded.magnitude,
                     magnitude_type = excluded.magnitude_type,
                     event_type = excluded.event_type,
                     types = excluded.types,
                     occurred_at_utc = excluded.occurred_at_utc,
                     timezone_offset_minutes = excluded.timezone_offset_minutes,
                     detail_url = excluded.detail_url,
                     link_url = excluded.link_url,
                     announcement_text = excluded.announcement_text,
                     nearby_places = excluded.nearby_places,
                     updated_at = excluded.updated_at"
            ),
            named_params! {
                ":code": record.code,
                ":country": record.country,
                ":place": record.place,
                ":latitude": record.latitude,
                ":longitude": record.longitude,
                ":depth": record.depth,
                ":magnitude": record.magnitude,
                ":magnitude_type": record.magnitude_type,
                ":event_type": record.event_type,
                ":types": types,
                ":occurred_at_utc": format_timestamp(&record.occurred_at_utc),
                ":timezone_offset_minutes": record.timezone_offset_minutes,
                ":detail_url": record.detail_url,
                ":link_url": record.link_url,
                ":announcement_text": record.announcement_text,
                ":nearby_places": nearby_places,
                ":now": now,
            },
        )?;

        let outcome = if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        };
        log::debug!("Upserted event {} ({:?})", record.code, outcome);
        Ok(outcome)
    }

    /// Look up one event by code.
    pub fn find_by_code(&self, code: &str) -> Result<Option<EventRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM quakes WHERE code = ?1"),
                [code],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Whether an event with this code is stored.
    pub fn contains(&self, code: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM quakes WHERE code = ?1", [code], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// Number of stored events.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM quakes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Most recent events by origin time, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<EventRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM quakes ORDER BY occurred_at_utc DESC, code LIMIT ?1"
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let records = stmt
            .query_map([limit], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(
    index: usize,
    error: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<EventRecord> {
    let types: String = row.get(9)?;
    let occurred_at: String = row.get(10)?;
    let nearby_places: String = row.get(15)?;

    Ok(EventRecord {
        code: row.get(0)?,
        country: row.get(1)?,
        place: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        depth: row.get(5)?,
        magnitude: row.get(6)?,
        magnitude_type: row.get(7)?,
        event_type: row.get(8)?,
        types: serde_json::from_str(&types).map_err(|e| conversion_error(9, e))?,
        occurred_at_utc: DateTime::parse_from_rfc3339(&occurred_at)
            .map_err(|e| conversion_error(10, e))?
            .with_timezone(&Utc),
        timezone_offset_minutes: row.get(11)?,
        detail_url: row.get(12)?,
        link_url: row.get(13)?,
        announcement_text: row.get(14)?,
        nearby_places: serde_json::from_str(&nearby_places)
            .map_err(|e| conversion_error(15, e))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NearbyPlace;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn philippines_record() -> EventRecord {
        EventRecord {
            code: "c000tmn4".to_string(),
            country: "Philippines".to_string(),
            place: "28km NNE of Cortes, Philippines".to_string(),
            latitude: 9.5166,
            longitude: 126.3037,
            depth: 84.37,
            magnitude: 4.8,
            magnitude_type: "mb".to_string(),
            event_type: "earthquake".to_string(),
            types: vec!["origin".to_string(), "phase-data".to_string()],
            occurred_at_utc: Utc
                .with_ymd_and_hms(2015, 2, 6, 9, 39, 8)
                .unwrap()
                .checked_add_signed(chrono::Duration::microseconds(39_999))
                .unwrap(),
            timezone_offset_minutes: 480,
            detail_url: "http://earthquake.usgs.gov/earthquakes/feed/v1.0/detail/usc000tmn4.geojson"
                .to_string(),
            link_url: "http://earthquake.usgs.gov/earthquakes/eventpage/usc000tmn4".to_string(),
            announcement_text: "SISMO. 4.8 grados mb en 28km NNE de Cortes, Philippines. A horas  http://earthquake.usgs.gov/earthquakes/eventpage/usc000tmn4".to_string(),
            nearby_places: vec![NearbyPlace {
                name: "Cortes, Philippines".to_string(),
                distance_km: 28.0,
                bearing: "NNE".to_string(),
            }],
        }
    }

    #[test]
    fn test_open_creates_test_file() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("nested/data");
        let store = EventStore::open(&base, true).unwrap();

        let expected = base.join("quakewatch_test.db");
        assert_eq!(store.path(), Some(expected.as_path()));
        assert!(expected.is_file());
        assert!(!base.join("quakewatch.db").exists());
    }

    #[test]
    fn test_production_and_test_files_are_separate() {
        let tmp = TempDir::new().unwrap();
        let prod = EventStore::open(tmp.path(), false).unwrap();
        let test = EventStore::open(tmp.path(), true).unwrap();

        test.upsert(&philippines_record()).unwrap();
        assert_eq!(test.count().unwrap(), 1);
        assert_eq!(prod.count().unwrap(), 0);
    }

    #[test]
    fn test_upsert_then_find_round_trips() {
        let store = EventStore::open_in_memory().unwrap();
        let record = philippines_record();

        assert_eq!(store.upsert(&record).unwrap(), UpsertOutcome::Inserted);
        let found = store.find_by_code("c000tmn4").unwrap().unwrap();
        assert_eq!(found, record);
    }

    #[test]
    fn test_find_missing_is_none() {
        let store = EventStore::open_in_memory().unwrap();
        assert!(store.find_by_code("nope").unwrap().is_none());
        assert!(!store.contains("nope").unwrap());
    }

    #[test]
    fn test_upsert_is_idempotent_and_updates() {
        let store = EventStore::open_in_memory().unwrap();
        let mut record = philippines_record();

        store.upsert(&record).unwrap();
        record.magnitude = 5.1;
        record.magnitude_type = "mww".to_string();
        assert_eq!(store.upsert(&record).unwrap(), UpsertOutcome::Updated);
        store.upsert(&record).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let found = store.find_by_code(&record.code).unwrap().unwrap();
        assert_eq!(found.magnitude, 5.1);
        assert_eq!(found.magnitude_type, "mww");
    }

    #[test]
    fn test_history_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let store = EventStore::open(tmp.path(), true).unwrap();
            store.upsert(&philippines_record()).unwrap();
        }
        let store = EventStore::open(tmp.path(), true).unwrap();
        assert!(store.contains("c000tmn4").unwrap());
    }

    #[test]
    fn test_recent_is_newest_first() {
        let store = EventStore::open_in_memory().unwrap();
        let older = philippines_record();
        let mut newer = philippines_record();
        newer.code = "c000tz01".to_string();
        newer.occurred_at_utc = older.occurred_at_utc + chrono::Duration::hours(3);

        store.upsert(&older).unwrap();
        store.upsert(&newer).unwrap();

        let recent = store.recent(10).unwrap();
        let codes: Vec<&str> = recent.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["c000tz01", "c000tmn4"]);
        assert_eq!(store.recent(1).unwrap().len(), 1);
    }
}
