#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types returned by the snapshot store.

use indicator_map_indicator_models::EntitySnapshot;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Where a returned snapshot was read from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CacheSource {
    /// Read from the primary `SQLite` store.
    Sqlite,
    /// Read from the bulk JSON export because `SQLite` was unavailable
    /// or had no row for the country.
    JsonFallback,
}

/// Store-managed freshness metadata attached to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    /// RFC 3339 timestamp of the last successful refresh.
    pub last_updated: String,
    /// RFC 3339 timestamp when the snapshot becomes stale. `None` when
    /// the snapshot came from the JSON export, which carries no
    /// per-country schedule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_update: Option<String>,
    /// Whether the refresh schedule says this snapshot is due.
    pub refresh_due: bool,
}

/// A snapshot together with where it came from and how fresh it is.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSnapshot {
    /// The snapshot payload.
    pub snapshot: EntitySnapshot,
    /// Which store tier served the read.
    pub source: CacheSource,
    /// Freshness metadata.
    pub cache: CacheInfo,
}

/// One row of the country listing, without the full indicator payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    /// Three-letter ISO code.
    pub iso3: String,
    /// Human-readable country name.
    pub country_name: String,
    /// Continental sub-region.
    pub region: String,
    /// Percentage of indicators that produced a value.
    pub completeness: f64,
    /// Count of indicators that produced a value.
    pub successful_indicators: u32,
    /// RFC 3339 timestamp of the last successful refresh.
    pub last_updated: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_source_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&CacheSource::JsonFallback).unwrap(),
            "\"json_fallback\""
        );
        assert_eq!(CacheSource::Sqlite.to_string(), "sqlite");
    }

    #[test]
    fn cache_info_omits_absent_next_update() {
        let info = CacheInfo {
            last_updated: "2025-06-01T00:00:00Z".to_string(),
            next_update: None,
            refresh_due: true,
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("nextUpdate"));
        assert!(json.contains("refreshDue"));
    }
}
