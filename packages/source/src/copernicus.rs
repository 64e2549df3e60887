//! Copernicus Climate Data Store client.
//!
//! Covers three products sampled at a country centroid: ERA5 surface
//! weather (temperature and precipitation), satellite column CO2, and
//! the annual land cover product (forest fraction).
//!
//! Daily products publish with several days of latency, and the lag
//! varies. The client walks backwards one day at a time from the
//! earliest plausible date until it finds a published observation,
//! bounded by [`MAX_OFFSET_DAYS`].

use chrono::{Duration, NaiveDate, Utc};
use indicator_map_source_models::{Provider, ProviderSettings};

use crate::{SourceError, retry};

/// Days behind today where daily products usually become available.
const FIRST_OFFSET_DAYS: i64 = 5;

/// Oldest observation the temporal backoff will accept. Anything older
/// is treated as the product being unavailable for the location.
const MAX_OFFSET_DAYS: i64 = 45;

/// One ERA5 surface sample at a point.
#[derive(Debug, Clone, PartialEq)]
pub struct Era5Sample {
    /// 2-metre air temperature in degrees Celsius.
    pub temperature_c: f64,
    /// Total daily precipitation in millimetres.
    pub precipitation_mm: f64,
    /// The observation date that was actually available.
    pub date: NaiveDate,
}

/// One satellite column CO2 sample at a point.
#[derive(Debug, Clone, PartialEq)]
pub struct Xco2Sample {
    /// Column-averaged CO2 concentration in ppm.
    pub ppm: f64,
    /// Reported measurement uncertainty in ppm, if any.
    pub uncertainty: Option<f64>,
    /// The observation date that was actually available.
    pub date: NaiveDate,
}

/// Candidate observation dates, newest first.
///
/// Starts [`FIRST_OFFSET_DAYS`] behind `today` and walks back one day
/// at a time to [`MAX_OFFSET_DAYS`] behind.
#[must_use]
pub fn backoff_dates(today: NaiveDate) -> Vec<NaiveDate> {
    (FIRST_OFFSET_DAYS..=MAX_OFFSET_DAYS)
        .map(|offset| today - Duration::days(offset))
        .collect()
}

/// Fetches the most recent published ERA5 sample at a point.
///
/// # Errors
///
/// Returns [`SourceError::NotConfigured`] without a configured API key,
/// [`SourceError::NoData`] if no date within the backoff window has a
/// published observation, and transport errors otherwise.
#[allow(clippy::future_not_send)]
pub async fn fetch_era5(
    client: &reqwest::Client,
    settings: &ProviderSettings,
    lat: f64,
    lon: f64,
) -> Result<Era5Sample, SourceError> {
    let key = require_key(settings)?;
    let url = format!("{}/v1/era5/point", settings.copernicus_url);

    for date in backoff_dates(Utc::now().date_naive()) {
        let body = retry::send_json(|| {
            client
                .get(&url)
                .bearer_auth(key)
                .query(&[
                    ("lat", lat.to_string()),
                    ("lon", lon.to_string()),
                    ("date", date.to_string()),
                ])
        })
        .await?;

        // A date that has not published yet comes back with nulls.
        let temperature_k = body
            .get("temperature")
            .and_then(serde_json::Value::as_f64);
        let precipitation_m = body
            .get("precipitation")
            .and_then(serde_json::Value::as_f64);

        if let (Some(t), Some(p)) = (temperature_k, precipitation_m) {
            // ERA5 reports Kelvin and metres; the canonical units are
            // Celsius and millimetres.
            return Ok(Era5Sample {
                temperature_c: t - 273.15,
                precipitation_mm: p * 1000.0,
                date,
            });
        }
        log::debug!("ERA5 not yet published for {date} at ({lat}, {lon})");
    }

    Err(SourceError::NoData {
        message: format!(
            "no ERA5 observation within {MAX_OFFSET_DAYS} days at ({lat}, {lon})"
        ),
    })
}

/// Fetches the most recent satellite column CO2 sample at a point.
///
/// # Errors
///
/// Same failure modes as [`fetch_era5`].
#[allow(clippy::future_not_send)]
pub async fn fetch_xco2(
    client: &reqwest::Client,
    settings: &ProviderSettings,
    lat: f64,
    lon: f64,
) -> Result<Xco2Sample, SourceError> {
    let key = require_key(settings)?;
    let url = format!("{}/v1/ghg/xco2", settings.copernicus_url);

    for date in backoff_dates(Utc::now().date_naive()) {
        let body = retry::send_json(|| {
            client
                .get(&url)
                .bearer_auth(key)
                .query(&[
                    ("lat", lat.to_string()),
                    ("lon", lon.to_string()),
                    ("date", date.to_string()),
                ])
        })
        .await?;

        if let Some(ppm) = body.get("xco2").and_then(serde_json::Value::as_f64) {
            return Ok(Xco2Sample {
                ppm,
                uncertainty: body
                    .get("uncertainty")
                    .and_then(serde_json::Value::as_f64),
                date,
            });
        }
        log::debug!("XCO2 not yet published for {date} at ({lat}, {lon})");
    }

    Err(SourceError::NoData {
        message: format!(
            "no XCO2 observation within {MAX_OFFSET_DAYS} days at ({lat}, {lon})"
        ),
    })
}

/// Fetches the forest fraction from the latest annual land cover
/// product at a point, as a percentage.
///
/// # Errors
///
/// Returns [`SourceError::NotConfigured`] without a configured API key
/// and [`SourceError::NoData`] if the product has no value at the point
/// (open ocean, unclassified pixels).
#[allow(clippy::future_not_send)]
pub async fn fetch_forest_fraction(
    client: &reqwest::Client,
    settings: &ProviderSettings,
    lat: f64,
    lon: f64,
) -> Result<(f64, i32), SourceError> {
    let key = require_key(settings)?;
    let url = format!("{}/v1/land-cover/point", settings.copernicus_url);

    let body = retry::send_json(|| {
        client
            .get(&url)
            .bearer_auth(key)
            .query(&[("lat", lat.to_string()), ("lon", lon.to_string())])
    })
    .await?;

    let fraction = body
        .get("forestFraction")
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| SourceError::NoData {
            message: format!("no land cover value at ({lat}, {lon})"),
        })?;
    let year = body
        .get("year")
        .and_then(serde_json::Value::as_i64)
        .and_then(|y| i32::try_from(y).ok())
        .ok_or_else(|| SourceError::Upstream {
            message: "land cover response missing product year".to_string(),
        })?;

    Ok((fraction * 100.0, year))
}

fn require_key(settings: &ProviderSettings) -> Result<&str, SourceError> {
    settings
        .copernicus_key
        .as_deref()
        .ok_or(SourceError::NotConfigured {
            provider: Provider::Copernicus,
        })
}
