#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! JSON response and query types for the HTTP API.

use indicator_map_database_models::{CacheInfo, CacheSource, SnapshotSummary};
use indicator_map_indicator_models::EntitySnapshot;
use indicator_map_source_models::Country;
use serde::{Deserialize, Serialize};

/// `GET /api/health` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Always true when the process is serving.
    pub healthy: bool,
    /// Crate version.
    pub version: String,
    /// Whether the `SQLite` tier is available (false in JSON-only mode).
    pub database_connected: bool,
    /// Number of countries with a stored snapshot.
    pub countries_stored: usize,
}

/// `GET /api/country/{iso3}` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCountryResponse {
    /// The full snapshot.
    pub data: EntitySnapshot,
    /// Which store tier served the read.
    pub source: CacheSource,
    /// Freshness metadata.
    pub cache_info: CacheInfo,
}

/// `GET /api/indicators` response: a point query resolved to the
/// nearest registered country.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPointResponse {
    /// The queried coordinate.
    pub coordinates: Coordinates,
    /// Optional free-form label echoed back from the query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// The country the point resolved to.
    pub country: Country,
    /// The country's snapshot.
    pub data: EntitySnapshot,
    /// Which store tier served the read.
    pub source: CacheSource,
    /// Freshness metadata.
    pub cache_info: CacheInfo,
}

/// `GET /api/countries` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCountryList {
    /// Number of countries listed.
    pub total: usize,
    /// One summary per stored country, ordered by ISO3 code.
    pub countries: Vec<SnapshotSummary>,
    /// Which store tier served the read.
    pub source: CacheSource,
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

/// Error body used by all non-2xx API responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Human-readable description.
    pub error: String,
    /// For unknown-country 404s: codes the caller can use instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_countries: Option<Vec<String>>,
    /// For malformed queries: an example of a valid request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

impl ApiError {
    /// A bare error with no hints.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            available_countries: None,
            example: None,
        }
    }
}

/// Query parameters for `GET /api/indicators`.
#[derive(Debug, Deserialize)]
pub struct PointQueryParams {
    /// Latitude in decimal degrees. Absence yields a 400.
    pub lat: Option<f64>,
    /// Longitude in decimal degrees. Absence yields a 400.
    pub lon: Option<f64>,
    /// Free-form label echoed back in the response.
    pub location: Option<String>,
    /// Explicit ISO3 override, skipping nearest-centroid resolution.
    pub country: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_hints_are_omitted_when_absent() {
        let err = ApiError::new("Unknown country: XYZ");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"], "Unknown country: XYZ");
        assert!(json.get("availableCountries").is_none());
        assert!(json.get("example").is_none());
    }

    #[test]
    fn health_serializes_camel_case() {
        let health = ApiHealth {
            healthy: true,
            version: "0.1.0".to_string(),
            database_connected: false,
            countries_stored: 3,
        };
        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["databaseConnected"], false);
        assert_eq!(json["countriesStored"], 3);
    }
}
