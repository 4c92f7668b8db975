//! Keyed persistence of prediction records.
//!
//! Records live in a string key -> string value backend (the same shape as a
//! browser's local storage), under keys built by [`PredictionQuery::key`].
//! Only keys carrying [`KEY_PREFIX`] are ours; anything else sharing the
//! backend is left alone.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path, time::Duration};

use crate::{
    error::PersistenceError,
    model::{KEY_PREFIX, PredictionQuery, PredictionRecord, WeatherPrediction},
    province::Province,
};

/// Persistent key -> string mapping.
pub trait StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Insert or overwrite. Must be a single atomic step.
    fn set(&mut self, key: &str, value: String) -> Result<(), PersistenceError>;

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;

    /// Remove all of `keys` in one step: either every key goes or none does.
    fn remove_many(&mut self, keys: &[String]) -> Result<(), PersistenceError>;

    /// All keys, in the backend's own iteration order.
    fn keys(&self) -> Result<Vec<String>, PersistenceError>;
}

/// In-process backend. Iterates in key order.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: BTreeMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.entries.remove(key);
        Ok(())
    }

    fn remove_many(&mut self, keys: &[String]) -> Result<(), PersistenceError> {
        for key in keys {
            self.entries.remove(key);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// SQLite-backed key/value table. Every call goes to the database, so several
/// processes sharing one file see each other's writes; conflicting writes to
/// the same key resolve last-write-wins.
#[derive(Debug)]
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| PersistenceError::Io { path: parent.to_path_buf(), source })?;
        }

        let conn = Connection::open(path)?;
        let backend = Self::with_connection(conn)?;
        tracing::debug!(path = %path.display(), "opened history database");
        Ok(backend)
    }

    /// A private, non-persistent database (for tests).
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, PersistenceError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, PersistenceError> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn })
    }
}

impl StorageBackend for SqliteBackend {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self
            .conn
            .query_row("SELECT value FROM storage WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), PersistenceError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO storage (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.conn.execute("DELETE FROM storage WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn remove_many(&mut self, keys: &[String]) -> Result<(), PersistenceError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM storage WHERE key = ?1")?;
            for key in keys {
                stmt.execute(params![key])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        let mut stmt = self.conn.prepare("SELECT key FROM storage ORDER BY key")?;
        let keys = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

/// Persisted value layout. `savedAt` is absent in entries written by older clients.
#[derive(Debug, Serialize, Deserialize)]
struct StoredPrediction {
    prediction: WeatherPrediction,
    date: String,
    province: String,
    #[serde(rename = "savedAt", default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<String>,
}

impl From<&PredictionRecord> for StoredPrediction {
    fn from(record: &PredictionRecord) -> Self {
        let day_start = record.query.date.and_time(NaiveTime::MIN).and_utc();
        Self {
            prediction: record.prediction.clone(),
            date: day_start.to_rfc3339_opts(SecondsFormat::Millis, true),
            province: record.query.province.as_str().to_string(),
            saved_at: Some(record.saved_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

impl StoredPrediction {
    fn into_record(self, key: &str) -> Result<PredictionRecord, PersistenceError> {
        let malformed = |reason: String| PersistenceError::MalformedRecord { key: key.to_string(), reason };

        let province = Province::parse(&self.province).map_err(|e| malformed(e.to_string()))?;

        let (date, date_time) = match DateTime::parse_from_rfc3339(&self.date) {
            Ok(dt) => {
                let utc = dt.with_timezone(&Utc);
                (utc.date_naive(), utc)
            }
            Err(_) => {
                let day = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
                    .map_err(|_| malformed(format!("unparseable date '{}'", self.date)))?;
                (day, day.and_time(NaiveTime::MIN).and_utc())
            }
        };

        let saved_at = match self.saved_at {
            Some(stamp) => DateTime::parse_from_rfc3339(&stamp)
                .map_err(|_| malformed(format!("unparseable savedAt '{stamp}'")))?
                .with_timezone(&Utc),
            None => date_time,
        };

        let query = PredictionQuery::new(date, province);
        if query.key() != key {
            return Err(malformed(format!("contents belong under '{}'", query.key())));
        }

        Ok(PredictionRecord::new(query, self.prediction, saved_at))
    }
}

pub(crate) fn encode_record(record: &PredictionRecord) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(&StoredPrediction::from(record))?)
}

pub(crate) fn decode_record(key: &str, json: &str) -> Result<PredictionRecord, PersistenceError> {
    let stored: StoredPrediction = serde_json::from_str(json).map_err(|e| {
        PersistenceError::MalformedRecord { key: key.to_string(), reason: e.to_string() }
    })?;
    stored.into_record(key)
}

/// History of predictions, at most one per (date, province).
#[derive(Debug)]
pub struct PredictionStore<B> {
    backend: B,
}

impl<B: StorageBackend> PredictionStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Write the record under its query key, replacing any earlier one.
    pub fn save(&mut self, record: &PredictionRecord) -> Result<(), PersistenceError> {
        let key = record.key();
        let value = encode_record(record)?;
        self.backend.set(&key, value)?;
        tracing::debug!(%key, "saved prediction");
        Ok(())
    }

    pub fn get(&self, query: &PredictionQuery) -> Result<Option<PredictionRecord>, PersistenceError> {
        let key = query.key();
        self.backend.get(&key)?.map(|json| decode_record(&key, &json)).transpose()
    }

    /// Every stored record, in backend order.
    ///
    /// Fails on the first entry that does not decode; history is never
    /// silently shortened.
    pub fn list_all(&self) -> Result<Vec<PredictionRecord>, PersistenceError> {
        let mut records = Vec::new();
        for key in self.owned_keys()? {
            if let Some(json) = self.backend.get(&key)? {
                records.push(decode_record(&key, &json)?);
            }
        }
        tracing::debug!(count = records.len(), "listed predictions");
        Ok(records)
    }

    /// Drop one record. Works on entries that no longer decode.
    pub fn remove(&mut self, query: &PredictionQuery) -> Result<(), PersistenceError> {
        self.remove_key(&query.key())
    }

    pub fn remove_key(&mut self, key: &str) -> Result<(), PersistenceError> {
        if !key.starts_with(KEY_PREFIX) {
            return Ok(());
        }
        self.backend.remove(key)
    }

    /// Remove every record in one step; foreign keys are untouched.
    pub fn clear_all(&mut self) -> Result<(), PersistenceError> {
        let keys = self.owned_keys()?;
        self.backend.remove_many(&keys)?;
        tracing::debug!(removed = keys.len(), "cleared prediction history");
        Ok(())
    }

    fn owned_keys(&self) -> Result<Vec<String>, PersistenceError> {
        Ok(self.backend.keys()?.into_iter().filter(|k| k.starts_with(KEY_PREFIX)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{hue_prediction, query};
    use chrono::TimeZone;

    fn record(date: &str, province: &str) -> PredictionRecord {
        let saved_at = Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap();
        PredictionRecord::new(query(date, province), hue_prediction(), saved_at)
    }

    #[test]
    fn save_uses_query_key() {
        let mut store = PredictionStore::new(MemoryBackend::new());
        store.save(&record("2024-03-15", "Hue")).unwrap();

        assert_eq!(store.backend().keys().unwrap(), vec!["weather_2024-03-15_Hue".to_string()]);
    }

    #[test]
    fn later_save_for_same_pair_wins() {
        let mut store = PredictionStore::new(MemoryBackend::new());
        let first = record("2024-03-15", "Hue");
        let mut second = first.clone();
        second.prediction.have_rain = false;
        second.prediction.rain = 0.0;

        store.save(&first).unwrap();
        store.save(&second).unwrap();

        let all = store.list_all().unwrap();
        assert_eq!(all, vec![second.clone()]);
        assert_eq!(store.get(&second.query).unwrap(), Some(second));
    }

    #[test]
    fn hanoi_spellings_are_stored_separately() {
        let mut store = PredictionStore::new(MemoryBackend::new());
        store.save(&record("2024-03-15", "Ha Noi")).unwrap();
        store.save(&record("2024-03-15", "Hanoi")).unwrap();

        assert_eq!(store.list_all().unwrap().len(), 2);
    }

    #[test]
    fn clear_only_touches_own_keys() {
        let mut backend = MemoryBackend::new();
        backend.set("theme", "dark".into()).unwrap();
        let mut store = PredictionStore::new(backend);
        store.save(&record("2024-03-15", "Hue")).unwrap();
        store.save(&record("2024-03-16", "Vinh")).unwrap();

        store.clear_all().unwrap();

        assert!(store.list_all().unwrap().is_empty());
        assert_eq!(store.backend().get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn clear_on_empty_store_is_noop() {
        let mut store = PredictionStore::new(MemoryBackend::new());
        store.clear_all().unwrap();
        store.clear_all().unwrap();
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn listing_ignores_foreign_keys() {
        let mut backend = MemoryBackend::new();
        backend.set("other_app", "{not json".into()).unwrap();
        let mut store = PredictionStore::new(backend);
        store.save(&record("2024-03-15", "Hue")).unwrap();

        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn malformed_entry_fails_listing() {
        let mut backend = MemoryBackend::new();
        backend.set("weather_2024-03-15_Hue", "{not json".into()).unwrap();
        let store = PredictionStore::new(backend);

        match store.list_all().unwrap_err() {
            PersistenceError::MalformedRecord { key, .. } => assert_eq!(key, "weather_2024-03-15_Hue"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_entry_can_be_discarded() {
        let mut backend = MemoryBackend::new();
        backend.set("weather_2024-03-15_Hue", "{not json".into()).unwrap();
        let mut store = PredictionStore::new(backend);

        store.remove(&query("2024-03-15", "Hue")).unwrap();
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn remove_key_ignores_foreign_keys() {
        let mut backend = MemoryBackend::new();
        backend.set("theme", "dark".into()).unwrap();
        let mut store = PredictionStore::new(backend);

        store.remove_key("theme").unwrap();
        assert!(store.backend().get("theme").unwrap().is_some());
    }

    #[test]
    fn record_survives_encode_decode() {
        let rec = record("2024-12-31", "Ho Chi Minh City");
        let json = encode_record(&rec).unwrap();
        assert_eq!(decode_record(&rec.key(), &json).unwrap(), rec);
    }

    #[test]
    fn sub_millisecond_saved_at_survives_encode_decode() {
        let mut rec = record("2024-03-15", "Hue");
        rec.saved_at = Utc.with_ymd_and_hms(2026, 10, 17, 2, 7, 6).unwrap()
            + chrono::Duration::nanoseconds(23_652_333);

        let json = encode_record(&rec).unwrap();
        assert_eq!(decode_record(&rec.key(), &json).unwrap(), rec);
    }

    #[test]
    fn persisted_layout() {
        let json = encode_record(&record("2024-03-15", "Hue")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["date"], "2024-03-15T00:00:00.000Z");
        assert_eq!(value["province"], "Hue");
        assert_eq!(value["savedAt"], "2024-03-10T08:30:00Z");
        assert_eq!(value["prediction"]["wind_degree"], 190.0);
    }

    #[test]
    fn decodes_entries_without_saved_at() {
        let json = serde_json::json!({
            "prediction": serde_json::to_value(hue_prediction()).unwrap(),
            "date": "2024-03-15T09:12:44.123Z",
            "province": "Hue"
        })
        .to_string();

        let rec = decode_record("weather_2024-03-15_Hue", &json).unwrap();
        assert_eq!(rec.query, query("2024-03-15", "Hue"));
        assert_eq!(rec.saved_at, Utc.with_ymd_and_hms(2024, 3, 15, 9, 12, 44).unwrap() + chrono::Duration::milliseconds(123));
    }

    #[test]
    fn decodes_bare_day_dates() {
        let json = serde_json::json!({
            "prediction": serde_json::to_value(hue_prediction()).unwrap(),
            "date": "2024-03-15",
            "province": "Hue"
        })
        .to_string();

        let rec = decode_record("weather_2024-03-15_Hue", &json).unwrap();
        assert_eq!(rec.query.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[test]
    fn rejects_unknown_province_and_misplaced_entries() {
        let mut stored = StoredPrediction::from(&record("2024-03-15", "Hue"));
        stored.province = "Atlantis".into();
        let json = serde_json::to_string(&stored).unwrap();
        assert!(decode_record("weather_2024-03-15_Atlantis", &json).is_err());

        let json = encode_record(&record("2024-03-15", "Hue")).unwrap();
        assert!(decode_record("weather_2024-03-16_Hue", &json).is_err());
    }

    #[test]
    fn sqlite_backend_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");

        {
            let mut store = PredictionStore::new(SqliteBackend::open(&path).unwrap());
            store.save(&record("2024-03-15", "Hue")).unwrap();
            store.save(&record("2024-03-16", "Can Tho")).unwrap();
        }

        let store = PredictionStore::new(SqliteBackend::open(&path).unwrap());
        assert_eq!(store.list_all().unwrap().len(), 2);
    }

    #[test]
    fn concurrent_stores_keep_each_others_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");

        let mut a = PredictionStore::new(SqliteBackend::open(&path).unwrap());
        let mut b = PredictionStore::new(SqliteBackend::open(&path).unwrap());
        a.save(&record("2024-03-15", "Hue")).unwrap();
        b.save(&record("2024-03-16", "Vinh")).unwrap();

        let reopened = SqliteBackend::open(&path).unwrap();
        assert_eq!(
            reopened.keys().unwrap(),
            vec!["weather_2024-03-15_Hue".to_string(), "weather_2024-03-16_Vinh".to_string()]
        );
    }

    #[test]
    fn clear_from_another_store_is_not_undone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");

        let mut a = PredictionStore::new(SqliteBackend::open(&path).unwrap());
        let mut c = PredictionStore::new(SqliteBackend::open(&path).unwrap());
        a.save(&record("2024-03-15", "Hue")).unwrap();

        c.clear_all().unwrap();
        a.save(&record("2024-03-16", "Vinh")).unwrap();

        let reopened = SqliteBackend::open(&path).unwrap();
        assert_eq!(reopened.keys().unwrap(), vec!["weather_2024-03-16_Vinh".to_string()]);
    }

    #[test]
    fn failed_clear_removes_nothing() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend
            .conn
            .execute_batch(
                r#"
                CREATE TRIGGER keep_vinh BEFORE DELETE ON storage
                WHEN old.key = 'weather_2024-03-16_Vinh'
                BEGIN SELECT RAISE(ABORT, 'row is locked'); END;
                "#,
            )
            .unwrap();
        let mut store = PredictionStore::new(backend);
        store.save(&record("2024-03-15", "Hue")).unwrap();
        store.save(&record("2024-03-16", "Vinh")).unwrap();

        assert!(matches!(store.clear_all().unwrap_err(), PersistenceError::Database(_)));
        assert_eq!(store.list_all().unwrap().len(), 2);
    }

    #[test]
    fn sqlite_backend_rejects_non_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        fs::write(&path, "not a database ".repeat(100)).unwrap();

        assert!(matches!(
            SqliteBackend::open(&path).unwrap_err(),
            PersistenceError::Database(_)
        ));
    }
}
