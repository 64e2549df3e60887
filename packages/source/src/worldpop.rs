//! WorldPop population statistics client.
//!
//! Population rasters publish with a lag of a year or more, so the
//! client asks for recent years newest-first until one has an estimate.

use chrono::{Datelike, Utc};
use indicator_map_source_models::ProviderSettings;

use crate::{SourceError, retry};

/// How many years behind the current one to try before giving up.
const MAX_YEARS_BACK: i32 = 6;

/// A population density observation for one country.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityObservation {
    /// People per square kilometre.
    pub density: f64,
    /// Reference year of the underlying population raster.
    pub year: i32,
}

/// Fetches the most recent published population density estimate for a
/// country.
///
/// # Errors
///
/// Returns [`SourceError::NoData`] if no year within the lookback
/// window has an estimate, and transport errors otherwise.
#[allow(clippy::future_not_send)]
pub async fn fetch_density(
    client: &reqwest::Client,
    settings: &ProviderSettings,
    iso3: &str,
) -> Result<DensityObservation, SourceError> {
    let url = format!("{}/v1/population/density", settings.worldpop_url);
    let current_year = Utc::now().year();

    for year in ((current_year - MAX_YEARS_BACK)..current_year).rev() {
        let year_param = year.to_string();
        let body = retry::send_json(|| {
            client
                .get(&url)
                .query(&[("iso3", iso3), ("year", year_param.as_str())])
        })
        .await?;

        if let Some(obs) = parse_density(&body) {
            return Ok(obs);
        }
        log::debug!("WorldPop has no {year} estimate for {iso3}");
    }

    Err(SourceError::NoData {
        message: format!(
            "no population density estimate for {iso3} in the last {MAX_YEARS_BACK} years"
        ),
    })
}

/// Pulls the density and reference year out of a WorldPop response.
#[must_use]
pub fn parse_density(body: &serde_json::Value) -> Option<DensityObservation> {
    let data = body.get("data").unwrap_or(body);
    let density = data.get("density").and_then(serde_json::Value::as_f64)?;
    let year = data
        .get("year")
        .and_then(serde_json::Value::as_i64)
        .and_then(|y| i32::try_from(y).ok())?;
    Some(DensityObservation { density, year })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_wrapped_response() {
        let body = json!({"data": {"density": 102.8, "year": 2020}});
        assert_eq!(
            parse_density(&body),
            Some(DensityObservation {
                density: 102.8,
                year: 2020
            })
        );
    }

    #[test]
    fn parses_a_flat_response() {
        let body = json!({"density": 47.1, "year": 2021});
        assert_eq!(
            parse_density(&body),
            Some(DensityObservation {
                density: 47.1,
                year: 2021
            })
        );
    }

    #[test]
    fn null_density_yields_none() {
        let body = json!({"data": {"density": null, "year": 2020}});
        assert_eq!(parse_density(&body), None);
    }
}
