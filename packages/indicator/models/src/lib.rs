#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical indicator taxonomy and record types.
//!
//! This crate defines the fixed set of eleven indicators tracked per
//! country, the normalized [`IndicatorRecord`] every data provider
//! produces, and the per-entity [`EntitySnapshot`] aggregate. All source
//! adapters normalize their provider-specific responses into these shared
//! types.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One of the eleven indicators tracked for every country.
///
/// The set is fixed: completeness is always computed against all eleven,
/// whether or not an adapter is configured for each.
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
pub enum Indicator {
    /// Annual mean 2m air temperature (°C), Copernicus ERA5.
    Temperature,
    /// Annual total precipitation (mm), Copernicus ERA5.
    Precipitation,
    /// Column-average atmospheric CO2 (ppm), satellite XCO2.
    Co2,
    /// Forest cover as a share of land area (%).
    Forest,
    /// Population density (people/km²).
    Population,
    /// Share of population below the international poverty line (%).
    Poverty,
    /// Unemployment rate, share of labor force (%).
    Unemployment,
    /// Annual freshwater withdrawals (% of internal resources).
    WaterWithdrawal,
    /// Net primary school enrollment rate (%).
    SchoolEnrollment,
    /// Wage and salaried workers, share of employment (%).
    ReceivedWages,
    /// Universal health coverage service index (0-100).
    HealthCoverage,
}

impl Indicator {
    /// All eleven indicators, in the fixed aggregation order.
    pub const ALL: [Self; 11] = [
        Self::Temperature,
        Self::Precipitation,
        Self::Co2,
        Self::Forest,
        Self::Population,
        Self::Poverty,
        Self::Unemployment,
        Self::WaterWithdrawal,
        Self::SchoolEnrollment,
        Self::ReceivedWages,
        Self::HealthCoverage,
    ];

    /// Unit descriptor reported in every record for this indicator.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Precipitation => "mm",
            Self::Co2 => "ppm",
            Self::Population => "people/km²",
            Self::HealthCoverage => "index",
            Self::Forest
            | Self::Poverty
            | Self::Unemployment
            | Self::WaterWithdrawal
            | Self::SchoolEnrollment
            | Self::ReceivedWages => "%",
        }
    }

    /// Whether a literal `0.0` from a provider is a valid measurement.
    ///
    /// Providers that default unset fields to zero make a literal `0.0`
    /// ambiguous. For temperature, CO2, and population density a true
    /// zero is physically implausible, so zero is treated as missing.
    /// For the remaining indicators a real zero is meaningful (zero
    /// rainfall in a desert, zero forest in an arid country, a measured
    /// zero rate), so zero passes through.
    #[must_use]
    pub const fn allow_zero(self) -> bool {
        !matches!(self, Self::Temperature | Self::Co2 | Self::Population)
    }

    /// Plausible `(min, max)` bounds for the range quality check.
    #[must_use]
    pub const fn plausible_range(self) -> (f64, f64) {
        match self {
            Self::Temperature => (-10.0, 40.0),
            Self::Precipitation => (0.0, 4000.0),
            Self::Co2 => (380.0, 500.0),
            Self::Population => (0.0, 30_000.0),
            Self::Forest
            | Self::Poverty
            | Self::Unemployment
            | Self::WaterWithdrawal
            | Self::SchoolEnrollment
            | Self::ReceivedWages
            | Self::HealthCoverage => (0.0, 100.0),
        }
    }
}

/// Outcome of one adapter fetch for one indicator.
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
pub enum IndicatorStatus {
    /// The primary provider returned a usable value.
    Success,
    /// The provider was reachable but had no value for this entity/period.
    NoData,
    /// Transport failure talking to the provider.
    Error,
    /// The primary provider had no data but a secondary provider did.
    Fallback,
    /// No credentials/URL configured for the provider.
    NotConfigured,
}

impl IndicatorStatus {
    /// Whether this status carries a measurement (primary or fallback
    /// provider).
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::Fallback)
    }
}

/// Result of validating a value against the indicator's plausible range.
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
pub enum RangeCheck {
    /// Value falls inside the plausible bounds.
    WithinRange,
    /// Value falls outside the plausible bounds (kept, but flagged).
    OutOfRange,
    /// No plausible range is known for this indicator.
    Unknown,
    /// No value to check.
    NoData,
}

/// Quality classification attached to every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityCheck {
    /// Range validation outcome.
    pub range_check: RangeCheck,
}

/// One normalized measurement for one entity.
///
/// Every data provider produces this type after fetching and
/// normalization. `value == None` means "unknown", which is distinct
/// from a measured zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorRecord {
    /// The measurement. `None` when the provider had no usable value.
    pub value: Option<f64>,
    /// Unit descriptor (°C, mm, %, ppm, index, people/km²).
    pub unit: String,
    /// Provenance: originating dataset/provider (e.g. "World Bank (SI.POV.DDAY)").
    pub source: String,
    /// Aggregation method (e.g. "country centroid", "national statistic").
    pub method: String,
    /// Fetch outcome.
    pub status: IndicatorStatus,
    /// Quality classification.
    pub quality: QualityCheck,
    /// Year the value is attributed to, when the provider reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Free-form period descriptor (e.g. "annual mean").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    /// Date actually served, for adapters that stepped backward in time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// How far behind today the served date is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_old: Option<u32>,
    /// Error bound, satellite-derived indicators only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<f64>,
    /// Human-readable caveat.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl IndicatorRecord {
    /// Whether this record counts toward completeness: a success (or
    /// fallback) status carrying an actual value.
    #[must_use]
    pub const fn has_value(&self) -> bool {
        self.status.is_success() && self.value.is_some()
    }
}

/// Aggregated indicator set for one country.
///
/// Produced in memory by the aggregator and persisted wholesale by the
/// snapshot store. `last_updated`/`next_update` are store-managed and
/// deliberately not part of this type, so aggregating the same adapter
/// responses twice yields identical snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySnapshot {
    /// Three-letter ISO country code.
    pub iso3: String,
    /// Human-readable country name.
    pub country_name: String,
    /// Continental sub-region (e.g. "North Africa").
    pub region: String,
    /// All eleven indicators, keyed by name.
    pub indicators: BTreeMap<Indicator, IndicatorRecord>,
    /// Count of indicators with a usable value.
    pub successful_indicators: u32,
    /// Size of the fixed indicator set (always 11).
    pub total_indicators: u32,
    /// `successful / total × 100`.
    pub completeness: f64,
    /// Set by the batch pipeline when the whole entity failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EntitySnapshot {
    /// Assembles a snapshot from an indicator map, computing the
    /// completeness score against the full fixed set.
    #[must_use]
    pub fn new(
        iso3: String,
        country_name: String,
        region: String,
        indicators: BTreeMap<Indicator, IndicatorRecord>,
    ) -> Self {
        let successful =
            u32::try_from(indicators.values().filter(|r| r.has_value()).count()).unwrap_or(0);
        let total = u32::try_from(Indicator::ALL.len()).unwrap_or(0);
        let completeness = f64::from(successful) / f64::from(total) * 100.0;

        Self {
            iso3,
            country_name,
            region,
            indicators,
            successful_indicators: successful,
            total_indicators: total,
            completeness,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: IndicatorStatus, value: Option<f64>) -> IndicatorRecord {
        IndicatorRecord {
            value,
            unit: "%".to_string(),
            source: "test".to_string(),
            method: "test".to_string(),
            status,
            quality: QualityCheck {
                range_check: RangeCheck::Unknown,
            },
            year: None,
            period: None,
            date: None,
            days_old: None,
            uncertainty: None,
            note: None,
        }
    }

    #[test]
    fn zero_policy_matches_indicator_table() {
        assert!(!Indicator::Temperature.allow_zero());
        assert!(!Indicator::Co2.allow_zero());
        assert!(!Indicator::Population.allow_zero());
        assert!(Indicator::Precipitation.allow_zero());
        assert!(Indicator::Forest.allow_zero());
        assert!(Indicator::Poverty.allow_zero());
        assert!(Indicator::Unemployment.allow_zero());
        assert!(Indicator::HealthCoverage.allow_zero());
    }

    #[test]
    fn indicator_names_round_trip() {
        assert_eq!(Indicator::WaterWithdrawal.to_string(), "water_withdrawal");
        assert_eq!(
            "school_enrollment".parse::<Indicator>().unwrap(),
            Indicator::SchoolEnrollment
        );
        assert_eq!(Indicator::Co2.as_ref(), "co2");
    }

    #[test]
    fn completeness_counts_success_and_fallback_values() {
        let mut indicators = BTreeMap::new();
        indicators.insert(
            Indicator::Temperature,
            record(IndicatorStatus::Success, Some(22.3)),
        );
        indicators.insert(
            Indicator::Forest,
            record(IndicatorStatus::Fallback, Some(0.045)),
        );
        indicators.insert(Indicator::Co2, record(IndicatorStatus::NoData, None));
        indicators.insert(Indicator::Poverty, record(IndicatorStatus::Error, None));

        let snapshot = EntitySnapshot::new(
            "EGY".to_string(),
            "Egypt".to_string(),
            "North Africa".to_string(),
            indicators,
        );

        assert_eq!(snapshot.successful_indicators, 2);
        assert_eq!(snapshot.total_indicators, 11);
        assert!((snapshot.completeness - 2.0 / 11.0 * 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn eight_of_eleven_completeness() {
        let mut indicators = BTreeMap::new();
        for (i, indicator) in Indicator::ALL.into_iter().enumerate() {
            let rec = if i < 8 {
                record(IndicatorStatus::Success, Some(1.0))
            } else {
                record(IndicatorStatus::Error, None)
            };
            indicators.insert(indicator, rec);
        }

        let snapshot = EntitySnapshot::new(
            "TCD".to_string(),
            "Chad".to_string(),
            "Central Africa".to_string(),
            indicators,
        );

        assert_eq!(snapshot.successful_indicators, 8);
        assert!((snapshot.completeness - 72.727_272_727_272_73).abs() < 1e-9);
    }

    #[test]
    fn snapshot_serializes_indicator_keys_as_snake_case() {
        let mut indicators = BTreeMap::new();
        indicators.insert(
            Indicator::WaterWithdrawal,
            record(IndicatorStatus::Success, Some(3.5)),
        );
        let snapshot = EntitySnapshot::new(
            "EGY".to_string(),
            "Egypt".to_string(),
            "North Africa".to_string(),
            indicators,
        );

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["indicators"]["water_withdrawal"]["value"].is_number());
        assert_eq!(json["indicators"]["water_withdrawal"]["status"], "success");
    }
}
