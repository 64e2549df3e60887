#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Country snapshot store.
//!
//! Snapshots are persisted wholesale in `SQLite`, one row per country
//! with the full indicator payload as JSON. Every write also regenerates
//! a bulk JSON export next to the database; reads fall back to that
//! export when `SQLite` is unavailable, so a broken database file
//! degrades service instead of taking it down.
//!
//! Uses `switchy_database` for all database operations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use indicator_map_database_models::{CacheInfo, CacheSource, SnapshotSummary, StoredSnapshot};
use indicator_map_indicator_models::EntitySnapshot;
use moosicbox_json_utils::database::ToValue as _;
use serde::{Deserialize, Serialize};
use switchy_database::{Database, DatabaseValue};
use switchy_database_connection::init_sqlite_rusqlite;
use thiserror::Error;

/// Default path for the snapshot database.
pub const DEFAULT_DB_PATH: &str = "data/indicators.db";

/// Default path for the bulk JSON export.
pub const DEFAULT_JSON_PATH: &str = "data/africa_indicators.json";

/// Days until a stored snapshot is due for refresh.
pub const REFRESH_INTERVAL_DAYS: i64 = 30;

/// Database path from `INDICATOR_MAP_DB_PATH`, or the default.
#[must_use]
pub fn db_path_from_env() -> PathBuf {
    std::env::var("INDICATOR_MAP_DB_PATH").map_or_else(|_| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from)
}

/// JSON export path from `INDICATOR_MAP_JSON_PATH`, or the default.
#[must_use]
pub fn json_path_from_env() -> PathBuf {
    std::env::var("INDICATOR_MAP_JSON_PATH")
        .map_or_else(|_| PathBuf::from(DEFAULT_JSON_PATH), PathBuf::from)
}

/// Errors from snapshot store operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// A database query or command failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shape of the bulk JSON export file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport {
    /// When the export was written.
    generated_at: String,
    /// All stored snapshots, keyed by ISO3 code.
    countries: BTreeMap<String, EntitySnapshot>,
}

/// Opens (or creates) the snapshot `SQLite` database and ensures the
/// schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the database cannot be opened or schema
/// creation fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Database(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;

    Ok(db)
}

/// Creates the snapshot table if it doesn't already exist.
///
/// # Errors
///
/// Returns [`DbError`] if table or index creation fails.
pub async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS country_snapshots (
            iso3                   TEXT PRIMARY KEY,
            country_name           TEXT NOT NULL,
            region                 TEXT NOT NULL,
            data_json              TEXT NOT NULL,
            successful_indicators  INTEGER NOT NULL,
            last_updated           TEXT NOT NULL,
            next_update            TEXT NOT NULL
        )",
    )
    .await
    .map_err(|e| DbError::Database(e.to_string()))?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_country_snapshots_updated
         ON country_snapshots (last_updated)",
    )
    .await
    .map_err(|e| DbError::Database(e.to_string()))?;

    Ok(())
}

/// Snapshot persistence with `SQLite` primary and JSON export fallback.
pub struct SnapshotStore {
    db: Option<Arc<dyn Database>>,
    json_path: PathBuf,
}

impl SnapshotStore {
    /// Opens the store, degrading to JSON-only mode if the database
    /// cannot be opened.
    pub async fn connect(db_path: &Path, json_path: &Path) -> Self {
        let db = match open_db(db_path).await {
            Ok(db) => Some(Arc::from(db)),
            Err(e) => {
                log::warn!(
                    "could not open snapshot database at {}, running on JSON export only: {e}",
                    db_path.display()
                );
                None
            }
        };
        Self {
            db,
            json_path: json_path.to_path_buf(),
        }
    }

    /// Builds a store from an already-open database handle. Used by
    /// tests with an in-memory database.
    #[must_use]
    pub fn with_database(db: Option<Arc<dyn Database>>, json_path: PathBuf) -> Self {
        Self { db, json_path }
    }

    /// Whether the `SQLite` tier is available.
    #[must_use]
    pub const fn has_database(&self) -> bool {
        self.db.is_some()
    }

    /// Persists one snapshot and regenerates the bulk JSON export so
    /// the fallback tier never serves older data than `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the upsert or the export rewrite fails.
    pub async fn put(&self, snapshot: &EntitySnapshot) -> Result<(), DbError> {
        let Some(db) = &self.db else {
            return Err(DbError::Database(
                "cannot write snapshots without a database".to_string(),
            ));
        };

        let now = Utc::now();
        let next_update = now + Duration::days(REFRESH_INTERVAL_DAYS);
        let data_json = serde_json::to_string(snapshot)?;

        db.exec_raw_params(
            "INSERT INTO country_snapshots
               (iso3, country_name, region, data_json, successful_indicators,
                last_updated, next_update)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (iso3) DO UPDATE SET
               country_name = excluded.country_name,
               region = excluded.region,
               data_json = excluded.data_json,
               successful_indicators = excluded.successful_indicators,
               last_updated = excluded.last_updated,
               next_update = excluded.next_update",
            &[
                DatabaseValue::String(snapshot.iso3.clone()),
                DatabaseValue::String(snapshot.country_name.clone()),
                DatabaseValue::String(snapshot.region.clone()),
                DatabaseValue::String(data_json),
                DatabaseValue::Int32(i32::try_from(snapshot.successful_indicators).unwrap_or(0)),
                DatabaseValue::String(now.to_rfc3339()),
                DatabaseValue::String(next_update.to_rfc3339()),
            ],
        )
        .await
        .map_err(|e| DbError::Database(e.to_string()))?;

        self.export_json().await
    }

    /// Reads one snapshot, trying `SQLite` first and the JSON export
    /// second.
    ///
    /// A database failure is logged and treated as a miss rather than
    /// propagated, so reads survive a corrupt database file.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] only if the JSON export exists but cannot be
    /// read or parsed.
    pub async fn get(&self, iso3: &str) -> Result<Option<StoredSnapshot>, DbError> {
        let upper = iso3.to_ascii_uppercase();

        if let Some(db) = &self.db {
            match db
                .query_raw_params(
                    "SELECT data_json, last_updated, next_update
                     FROM country_snapshots WHERE iso3 = $1",
                    &[DatabaseValue::String(upper.clone())],
                )
                .await
            {
                Ok(rows) => {
                    if let Some(row) = rows.first() {
                        let data_json: String = row.to_value("data_json").unwrap_or_default();
                        let snapshot: EntitySnapshot = serde_json::from_str(&data_json)?;
                        let last_updated: String = row.to_value("last_updated").unwrap_or_default();
                        let next_update: String = row.to_value("next_update").unwrap_or_default();
                        return Ok(Some(StoredSnapshot {
                            snapshot,
                            source: CacheSource::Sqlite,
                            cache: CacheInfo {
                                last_updated,
                                refresh_due: is_due(&next_update),
                                next_update: Some(next_update),
                            },
                        }));
                    }
                }
                Err(e) => {
                    log::warn!("snapshot read failed for {upper}, trying JSON export: {e}");
                }
            }
        }

        let Some(export) = self.read_json_export()? else {
            return Ok(None);
        };
        Ok(export.countries.get(&upper).map(|snapshot| StoredSnapshot {
            snapshot: snapshot.clone(),
            source: CacheSource::JsonFallback,
            cache: CacheInfo {
                last_updated: export.generated_at.clone(),
                next_update: None,
                refresh_due: true,
            },
        }))
    }

    /// Lists all stored snapshots as summaries, ordered by ISO3 code,
    /// together with the tier that served the read.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if neither tier can be read.
    pub async fn list(&self) -> Result<(Vec<SnapshotSummary>, CacheSource), DbError> {
        if let Some(db) = &self.db {
            match db
                .query_raw_params(
                    "SELECT iso3, country_name, region, data_json,
                            successful_indicators, last_updated
                     FROM country_snapshots ORDER BY iso3",
                    &[],
                )
                .await
            {
                Ok(rows) => {
                    let mut summaries = Vec::with_capacity(rows.len());
                    for row in &rows {
                        let data_json: String = row.to_value("data_json").unwrap_or_default();
                        let snapshot: EntitySnapshot = serde_json::from_str(&data_json)?;
                        let successful: i64 =
                            row.to_value("successful_indicators").unwrap_or(0);
                        summaries.push(SnapshotSummary {
                            iso3: row.to_value("iso3").unwrap_or_default(),
                            country_name: row.to_value("country_name").unwrap_or_default(),
                            region: row.to_value("region").unwrap_or_default(),
                            completeness: snapshot.completeness,
                            successful_indicators: u32::try_from(successful).unwrap_or(0),
                            last_updated: row.to_value("last_updated").unwrap_or_default(),
                        });
                    }
                    return Ok((summaries, CacheSource::Sqlite));
                }
                Err(e) => {
                    log::warn!("snapshot listing failed, trying JSON export: {e}");
                }
            }
        }

        let Some(export) = self.read_json_export()? else {
            return Ok((Vec::new(), CacheSource::JsonFallback));
        };
        let summaries = export
            .countries
            .values()
            .map(|s| SnapshotSummary {
                iso3: s.iso3.clone(),
                country_name: s.country_name.clone(),
                region: s.region.clone(),
                completeness: s.completeness,
                successful_indicators: s.successful_indicators,
                last_updated: export.generated_at.clone(),
            })
            .collect();
        Ok((summaries, CacheSource::JsonFallback))
    }

    /// ISO3 codes of every stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if neither tier can be read.
    pub async fn available_countries(&self) -> Result<Vec<String>, DbError> {
        let (summaries, _) = self.list().await?;
        Ok(summaries.into_iter().map(|s| s.iso3).collect())
    }

    /// Whether a country is missing or past its scheduled refresh.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database query fails.
    pub async fn needs_refresh(&self, iso3: &str) -> Result<bool, DbError> {
        let Some(db) = &self.db else {
            return Ok(true);
        };
        let rows = db
            .query_raw_params(
                "SELECT next_update FROM country_snapshots WHERE iso3 = $1",
                &[DatabaseValue::String(iso3.to_ascii_uppercase())],
            )
            .await
            .map_err(|e| DbError::Database(e.to_string()))?;

        Ok(rows.first().is_none_or(|row| {
            let next_update: String = row.to_value("next_update").unwrap_or_default();
            is_due(&next_update)
        }))
    }

    /// Rewrites the bulk JSON export from the current database
    /// contents.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database cannot be read or the file
    /// cannot be written.
    pub async fn export_json(&self) -> Result<(), DbError> {
        let Some(db) = &self.db else {
            return Err(DbError::Database(
                "cannot export without a database".to_string(),
            ));
        };

        let rows = db
            .query_raw_params("SELECT iso3, data_json FROM country_snapshots", &[])
            .await
            .map_err(|e| DbError::Database(e.to_string()))?;

        let mut countries = BTreeMap::new();
        for row in &rows {
            let iso3: String = row.to_value("iso3").unwrap_or_default();
            let data_json: String = row.to_value("data_json").unwrap_or_default();
            let snapshot: EntitySnapshot = serde_json::from_str(&data_json)?;
            countries.insert(iso3, snapshot);
        }

        let export = JsonExport {
            generated_at: Utc::now().to_rfc3339(),
            countries,
        };

        if let Some(parent) = self.json_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.json_path, serde_json::to_string_pretty(&export)?)?;
        Ok(())
    }

    fn read_json_export(&self) -> Result<Option<JsonExport>, DbError> {
        match std::fs::read_to_string(&self.json_path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DbError::Io(e)),
        }
    }
}

/// Whether an RFC 3339 deadline has passed. Unparseable deadlines count
/// as due so a corrupt row gets refreshed rather than pinned forever.
fn is_due(next_update: &str) -> bool {
    DateTime::parse_from_rfc3339(next_update)
        .map_or(true, |deadline| deadline.with_timezone(&Utc) <= Utc::now())
}
