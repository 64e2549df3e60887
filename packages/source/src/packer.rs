//! Record packing: the single funnel every observation goes through.
//!
//! Adapters never construct [`IndicatorRecord`]s by hand. They describe
//! what they fetched in a [`PackContext`] and call [`pack`], which
//! applies the zero-coercion policy, attaches the plausibility check,
//! and fills in derived fields. Upstream failures go through
//! [`failure_record`] so that every indicator slot in a snapshot is
//! populated no matter what happened.

use chrono::{NaiveDate, Utc};
use indicator_map_indicator_models::{
    Indicator, IndicatorRecord, IndicatorStatus, QualityCheck, RangeCheck,
};
use indicator_map_source_models::Provider;

use crate::SourceError;

/// Everything an adapter knows about one fetched observation.
#[derive(Debug, Clone)]
pub struct PackContext {
    /// The indicator being packed.
    pub indicator: Indicator,
    /// The raw observed value, before zero coercion.
    pub value: Option<f64>,
    /// Provenance string (e.g. "World Bank SI.POV.DDAY").
    pub source: String,
    /// How the value was obtained (e.g. "country_api", "centroid_sample").
    pub method: String,
    /// `Success` for the primary provider, `Fallback` for a secondary one.
    /// Failure statuses are not valid here; use [`failure_record`].
    pub status: IndicatorStatus,
    /// Reference year of the observation, if the provider reports one.
    pub year: Option<i32>,
    /// Reference period label (e.g. "2023", "2024-06").
    pub period: Option<String>,
    /// Exact observation date for daily-resolution data.
    pub date: Option<NaiveDate>,
    /// Measurement uncertainty, same unit as the value.
    pub uncertainty: Option<f64>,
    /// Free-form provenance note.
    pub note: Option<String>,
}

impl PackContext {
    /// A minimal context for a successful fetch.
    #[must_use]
    pub fn success(indicator: Indicator, value: Option<f64>, source: impl Into<String>) -> Self {
        Self {
            indicator,
            value,
            source: source.into(),
            method: "country_api".to_string(),
            status: IndicatorStatus::Success,
            year: None,
            period: None,
            date: None,
            uncertainty: None,
            note: None,
        }
    }
}

/// Packs an observation into a canonical record.
///
/// Applies [`coerce_zero`], downgrades a success whose value was coerced
/// away to `NoData`, attaches the range check, and derives `days_old`
/// from the observation date. Never fails.
#[must_use]
pub fn pack(ctx: PackContext) -> IndicatorRecord {
    let coerced = coerce_zero(ctx.indicator, ctx.value);
    let was_coerced = ctx.value.is_some() && coerced.is_none();

    let (status, note) = if coerced.is_none() && ctx.status.is_success() {
        let note = if was_coerced {
            Some(match ctx.note {
                Some(n) => format!("{n}; zero value treated as missing"),
                None => "zero value treated as missing".to_string(),
            })
        } else {
            ctx.note
        };
        (IndicatorStatus::NoData, note)
    } else {
        (ctx.status, ctx.note)
    };

    let days_old = ctx.date.map(|d| {
        let age = Utc::now().date_naive().signed_duration_since(d).num_days();
        u32::try_from(age).unwrap_or(0)
    });

    IndicatorRecord {
        value: coerced,
        unit: ctx.indicator.unit().to_string(),
        source: ctx.source,
        method: ctx.method,
        status,
        quality: QualityCheck {
            range_check: range_check(ctx.indicator, coerced),
        },
        year: ctx.year,
        period: ctx.period,
        date: ctx.date,
        days_old,
        uncertainty: ctx.uncertainty,
        note,
    }
}

/// Builds a record for a fetch that failed outright.
///
/// The error is folded into the record's status and note so a single
/// bad provider never sinks the rest of the snapshot.
#[must_use]
pub fn failure_record(indicator: Indicator, source: &str, err: &SourceError) -> IndicatorRecord {
    let status = match err {
        SourceError::NoData { .. } => IndicatorStatus::NoData,
        SourceError::NotConfigured { .. } => IndicatorStatus::NotConfigured,
        SourceError::Http(_) | SourceError::Json(_) | SourceError::Upstream { .. } => {
            IndicatorStatus::Error
        }
    };

    IndicatorRecord {
        value: None,
        unit: indicator.unit().to_string(),
        source: source.to_string(),
        method: "country_api".to_string(),
        status,
        quality: QualityCheck {
            range_check: RangeCheck::NoData,
        },
        year: None,
        period: None,
        date: None,
        days_old: None,
        uncertainty: None,
        note: Some(err.to_string()),
    }
}

/// Shorthand for the record produced when a provider has no credentials.
#[must_use]
pub fn not_configured(indicator: Indicator, provider: Provider) -> IndicatorRecord {
    failure_record(
        indicator,
        provider.as_ref(),
        &SourceError::NotConfigured { provider },
    )
}

/// Applies the zero-coercion policy.
///
/// Providers that lack an observation frequently report `0.0` instead of
/// null. For indicators where a true zero is physically implausible the
/// zero is treated as missing. Indicators where zero is meaningful (a
/// rate can genuinely be zero) keep it.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn coerce_zero(indicator: Indicator, value: Option<f64>) -> Option<f64> {
    match value {
        Some(v) if v == 0.0 && !indicator.allow_zero() => None,
        other => other,
    }
}

fn range_check(indicator: Indicator, value: Option<f64>) -> RangeCheck {
    let Some(v) = value else {
        return RangeCheck::NoData;
    };
    let (lo, hi) = indicator.plausible_range();
    if v >= lo && v <= hi {
        RangeCheck::WithinRange
    } else {
        RangeCheck::OutOfRange
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_temperature_is_coerced_to_missing() {
        let record = pack(PackContext::success(
            Indicator::Temperature,
            Some(0.0),
            "Copernicus ERA5",
        ));
        assert_eq!(record.value, None);
        assert_eq!(record.status, IndicatorStatus::NoData);
        assert!(
            record
                .note
                .as_deref()
                .is_some_and(|n| n.contains("zero value treated as missing"))
        );
        assert_eq!(record.quality.range_check, RangeCheck::NoData);
    }

    #[test]
    fn zero_precipitation_is_kept() {
        let record = pack(PackContext::success(
            Indicator::Precipitation,
            Some(0.0),
            "Copernicus ERA5",
        ));
        assert_eq!(record.value, Some(0.0));
        assert_eq!(record.status, IndicatorStatus::Success);
        assert_eq!(record.quality.range_check, RangeCheck::WithinRange);
    }

    #[test]
    fn tiny_nonzero_forest_value_survives() {
        let record = pack(PackContext::success(
            Indicator::Forest,
            Some(0.045),
            "Copernicus land cover",
        ));
        assert_eq!(record.value, Some(0.045));
        assert!(record.has_value());
    }

    #[test]
    fn out_of_range_value_is_flagged_but_kept() {
        let record = pack(PackContext::success(
            Indicator::Temperature,
            Some(55.0),
            "Copernicus ERA5",
        ));
        assert_eq!(record.value, Some(55.0));
        assert_eq!(record.quality.range_check, RangeCheck::OutOfRange);
        assert_eq!(record.status, IndicatorStatus::Success);
    }

    #[test]
    fn fallback_status_survives_packing() {
        let mut ctx = PackContext::success(Indicator::Forest, Some(12.5), "World Bank");
        ctx.status = IndicatorStatus::Fallback;
        let record = pack(ctx);
        assert_eq!(record.status, IndicatorStatus::Fallback);
        assert!(record.has_value());
    }

    #[test]
    fn missing_success_value_downgrades_to_no_data() {
        let record = pack(PackContext::success(Indicator::Poverty, None, "World Bank"));
        assert_eq!(record.status, IndicatorStatus::NoData);
        assert_eq!(record.value, None);
    }

    #[test]
    fn failure_record_maps_error_kinds_to_statuses() {
        let no_data = failure_record(
            Indicator::Poverty,
            "World Bank",
            &SourceError::NoData {
                message: "no entries".to_string(),
            },
        );
        assert_eq!(no_data.status, IndicatorStatus::NoData);

        let upstream = failure_record(
            Indicator::Poverty,
            "World Bank",
            &SourceError::Upstream {
                message: "HTTP 503".to_string(),
            },
        );
        assert_eq!(upstream.status, IndicatorStatus::Error);
        assert!(upstream.note.as_deref().is_some_and(|n| n.contains("503")));

        let nc = not_configured(Indicator::Co2, Provider::Copernicus);
        assert_eq!(nc.status, IndicatorStatus::NotConfigured);
        assert_eq!(nc.value, None);
    }

    #[test]
    fn days_old_is_derived_from_date() {
        let mut ctx = PackContext::success(Indicator::Temperature, Some(20.0), "Copernicus ERA5");
        ctx.date = Some(Utc::now().date_naive() - chrono::Duration::days(7));
        let record = pack(ctx);
        assert_eq!(record.days_old, Some(7));
    }
}
