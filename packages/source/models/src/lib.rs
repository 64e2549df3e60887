#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data provider configuration types and the country registry entry.
//!
//! Provider endpoints and credentials are read from the environment once
//! at startup ([`ProviderSettings::from_env`]) and passed by reference
//! into the components that need them. No component reads the environment
//! on its own.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The external data provider behind an adapter.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Provider {
    /// Copernicus Climate Data Store (ERA5, satellite greenhouse gases,
    /// land cover).
    Copernicus,
    /// World Bank Open Data indicator API.
    WorldBank,
    /// WorldPop population statistics API.
    WorldPop,
}

/// Endpoint URLs and credentials for all providers.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Base URL for the Copernicus CDS API.
    pub copernicus_url: String,
    /// Copernicus API key. `None` means the climate adapters run in
    /// not-configured mode and report placeholder records.
    pub copernicus_key: Option<String>,
    /// Base URL for the World Bank indicator API.
    pub world_bank_url: String,
    /// Base URL for the WorldPop statistics API.
    pub worldpop_url: String,
}

impl ProviderSettings {
    /// Loads settings from the environment, falling back to the public
    /// production endpoints.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            copernicus_url: std::env::var("COPERNICUS_API_URL")
                .unwrap_or_else(|_| "https://cds.climate.copernicus.eu/api".to_string()),
            copernicus_key: std::env::var("COPERNICUS_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            world_bank_url: std::env::var("WORLD_BANK_API_URL")
                .unwrap_or_else(|_| "https://api.worldbank.org/v2".to_string()),
            worldpop_url: std::env::var("WORLDPOP_API_URL")
                .unwrap_or_else(|_| "https://www.worldpop.org/sdi/api".to_string()),
        }
    }
}

/// One entry in the embedded country registry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    /// Three-letter ISO code (e.g. "EGY").
    pub iso3: String,
    /// Human-readable name.
    pub name: String,
    /// Continental sub-region (e.g. "North Africa").
    pub region: String,
    /// Centroid latitude, used for point-sampled indicators.
    pub lat: f64,
    /// Centroid longitude.
    pub lon: f64,
}

/// Geographic envelope accepted by the point-lookup API.
///
/// Approximate bounds of the African continent; coordinates outside the
/// envelope are rejected at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoBounds {
    /// Southernmost accepted latitude.
    pub min_lat: f64,
    /// Northernmost accepted latitude.
    pub max_lat: f64,
    /// Westernmost accepted longitude.
    pub min_lon: f64,
    /// Easternmost accepted longitude.
    pub max_lon: f64,
}

/// The Africa envelope used throughout the system.
pub const AFRICA_BOUNDS: GeoBounds = GeoBounds {
    min_lat: -35.0,
    max_lat: 37.0,
    min_lon: -20.0,
    max_lon: 55.0,
};

impl GeoBounds {
    /// Whether a coordinate pair falls inside the envelope.
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}
