//! World Bank Open Data indicator client.
//!
//! The World Bank API returns a two-element JSON array: metadata first,
//! then the observation entries newest-first. Many series lag by a few
//! years, so the client walks the entries and takes the most recent one
//! with a non-null value.

use indicator_map_source_models::ProviderSettings;

use crate::{SourceError, retry};

/// Number of yearly entries requested per series. World Bank series
/// rarely have gaps longer than a decade, so 60 covers every series in
/// use back to the 1960s.
const PER_PAGE: u32 = 60;

/// One usable observation from a World Bank series.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldBankObservation {
    /// The observed value.
    pub value: f64,
    /// The reference year of the observation.
    pub year: i32,
}

/// Fetches the latest non-null observation of an indicator series for
/// one country.
///
/// # Errors
///
/// Returns [`SourceError::NoData`] if the series exists but has no
/// non-null entries for the country, and [`SourceError::Upstream`] if
/// the response does not have the expected two-element shape.
#[allow(clippy::future_not_send)]
pub async fn fetch_latest(
    client: &reqwest::Client,
    settings: &ProviderSettings,
    iso3: &str,
    series: &str,
) -> Result<WorldBankObservation, SourceError> {
    let url = format!(
        "{}/country/{}/indicator/{series}",
        settings.world_bank_url,
        iso3.to_ascii_lowercase()
    );
    let per_page = PER_PAGE.to_string();
    let body = retry::send_json(|| {
        client
            .get(&url)
            .query(&[("format", "json"), ("per_page", per_page.as_str())])
    })
    .await?;

    extract_latest(&body).ok_or_else(|| SourceError::NoData {
        message: format!("no non-null entries for {series} in {iso3}"),
    })
}

/// Walks a World Bank response body and returns the newest non-null
/// observation, if any.
///
/// Kept separate from the HTTP call so the parsing rules are testable
/// against captured response shapes.
#[must_use]
pub fn extract_latest(body: &serde_json::Value) -> Option<WorldBankObservation> {
    // body[0] is paging metadata; body[1] is the entry list. An error
    // response (bad series, bad country) is a one-element array with a
    // "message" object instead.
    let entries = body.get(1)?.as_array()?;
    for entry in entries {
        let Some(value) = entry.get("value").and_then(serde_json::Value::as_f64) else {
            continue;
        };
        let year = entry
            .get("date")
            .and_then(serde_json::Value::as_str)
            .and_then(|d| d.parse::<i32>().ok())?;
        return Some(WorldBankObservation { value, year });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn takes_the_newest_non_null_entry() {
        let body = json!([
            {"page": 1, "pages": 1, "per_page": 60, "total": 3},
            [
                {"date": "2024", "value": null},
                {"date": "2023", "value": 29.7},
                {"date": "2022", "value": 31.2},
            ]
        ]);
        assert_eq!(
            extract_latest(&body),
            Some(WorldBankObservation {
                value: 29.7,
                year: 2023
            })
        );
    }

    #[test]
    fn all_null_series_yields_none() {
        let body = json!([
            {"page": 1},
            [
                {"date": "2024", "value": null},
                {"date": "2023", "value": null},
            ]
        ]);
        assert_eq!(extract_latest(&body), None);
    }

    #[test]
    fn error_response_shape_yields_none() {
        let body = json!([
            {"message": [{"id": "120", "value": "Invalid indicator"}]}
        ]);
        assert_eq!(extract_latest(&body), None);
    }

    #[test]
    fn integer_values_are_accepted() {
        let body = json!([
            {"page": 1},
            [{"date": "2022", "value": 45}]
        ]);
        assert_eq!(
            extract_latest(&body),
            Some(WorldBankObservation {
                value: 45.0,
                year: 2022
            })
        );
    }
}
