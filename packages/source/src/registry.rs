//! Country registry, baked into the binary at compile time.
//!
//! The registry is the single authority for which countries the system
//! covers. Lookups by ISO3 code drive the refresh pipeline and the
//! country API; nearest-centroid lookup resolves point queries.

use indicator_map_source_models::Country;
use serde::Deserialize;

/// Registry TOML embedded at compile time.
const AFRICA_TOML: &str = include_str!("../countries/africa.toml");

/// ISO3 codes processed by the default (test-scope) refresh run.
pub const TEST_SCOPE: &[&str] = &["EGY"];

#[derive(Deserialize)]
struct RegistryFile {
    countries: Vec<Country>,
}

/// Returns all registered countries in registry order.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (a compile-time guarantee
/// in practice since the registry ships inside the binary).
#[must_use]
pub fn all_countries() -> Vec<Country> {
    let file: RegistryFile =
        toml::from_str(AFRICA_TOML).unwrap_or_else(|e| panic!("Failed to parse africa.toml: {e}"));
    file.countries
}

/// Looks up a country by ISO3 code, case-insensitively.
#[must_use]
pub fn find_country(iso3: &str) -> Option<Country> {
    let upper = iso3.to_ascii_uppercase();
    all_countries().into_iter().find(|c| c.iso3 == upper)
}

/// Resolves a coordinate to the country with the nearest registered
/// centroid.
///
/// Distance is squared-degrees, which is good enough to pick the
/// closest of 54 centroids. Returns `None` only if the registry is
/// empty, which cannot happen with the embedded file.
#[must_use]
pub fn nearest_country(lat: f64, lon: f64) -> Option<Country> {
    all_countries().into_iter().min_by(|a, b| {
        let da = (a.lat - lat).powi(2) + (a.lon - lon).powi(2);
        let db = (b.lat - lat).powi(2) + (b.lon - lon).powi(2);
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    })
}
