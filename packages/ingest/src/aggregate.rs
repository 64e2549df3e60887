//! Per-country aggregation: one record per canonical indicator.

use std::collections::BTreeMap;

use indicator_map_indicator_models::{
    EntitySnapshot, Indicator, IndicatorRecord, IndicatorStatus, QualityCheck, RangeCheck,
};
use indicator_map_source::IndicatorSource;
use indicator_map_source_models::Country;

/// Runs every adapter for one country and assembles the snapshot.
///
/// Adapters run sequentially to keep the upstream request rate gentle.
/// Indicators with no adapter in the set still get a slot, marked
/// not-configured, so completeness is always scored against the full
/// fixed set. Never fails: adapter problems surface as record statuses.
pub async fn aggregate(country: &Country, adapters: &[Box<dyn IndicatorSource>]) -> EntitySnapshot {
    let mut indicators: BTreeMap<Indicator, IndicatorRecord> = BTreeMap::new();

    for adapter in adapters {
        let indicator = adapter.indicator();
        log::debug!("fetching {indicator} for {}", country.iso3);
        let record = adapter.fetch(country).await;
        log::debug!(
            "  {indicator}: status={} value={:?}",
            record.status,
            record.value
        );
        indicators.insert(indicator, record);
    }

    for indicator in Indicator::ALL {
        indicators
            .entry(indicator)
            .or_insert_with(|| unconfigured_record(indicator));
    }

    let mut snapshot = EntitySnapshot::new(
        country.iso3.clone(),
        country.name.clone(),
        country.region.clone(),
        indicators,
    );

    // A snapshot where every fetch died on transport is a whole-entity
    // outage; flag it so consumers can tell it apart from sparse data.
    if snapshot
        .indicators
        .values()
        .all(|r| r.status == IndicatorStatus::Error)
    {
        snapshot.error = Some("all providers failed".to_string());
    }

    snapshot
}

fn unconfigured_record(indicator: Indicator) -> IndicatorRecord {
    IndicatorRecord {
        value: None,
        unit: indicator.unit().to_string(),
        source: "unconfigured".to_string(),
        method: "none".to_string(),
        status: IndicatorStatus::NotConfigured,
        quality: QualityCheck {
            range_check: RangeCheck::NoData,
        },
        year: None,
        period: None,
        date: None,
        days_old: None,
        uncertainty: None,
        note: Some("no adapter configured for this indicator".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use indicator_map_source::packer::{self, PackContext};
    use indicator_map_source::SourceError;

    struct FixedAdapter {
        indicator: Indicator,
        value: Option<f64>,
    }

    #[async_trait]
    impl IndicatorSource for FixedAdapter {
        fn indicator(&self) -> Indicator {
            self.indicator
        }

        async fn fetch(&self, _country: &Country) -> IndicatorRecord {
            packer::pack(PackContext::success(self.indicator, self.value, "mock"))
        }
    }

    struct FailingAdapter {
        indicator: Indicator,
    }

    #[async_trait]
    impl IndicatorSource for FailingAdapter {
        fn indicator(&self) -> Indicator {
            self.indicator
        }

        async fn fetch(&self, _country: &Country) -> IndicatorRecord {
            packer::failure_record(
                self.indicator,
                "mock",
                &SourceError::Upstream {
                    message: "HTTP 503".to_string(),
                },
            )
        }
    }

    fn egypt() -> Country {
        Country {
            iso3: "EGY".to_string(),
            name: "Egypt".to_string(),
            region: "North Africa".to_string(),
            lat: 26.8,
            lon: 30.8,
        }
    }

    #[tokio::test]
    async fn every_indicator_slot_is_populated() {
        let adapters: Vec<Box<dyn IndicatorSource>> = vec![Box::new(FixedAdapter {
            indicator: Indicator::Temperature,
            value: Some(22.3),
        })];

        let snapshot = aggregate(&egypt(), &adapters).await;
        assert_eq!(snapshot.indicators.len(), 11);
        assert_eq!(snapshot.successful_indicators, 1);
        assert_eq!(
            snapshot.indicators[&Indicator::Poverty].status,
            IndicatorStatus::NotConfigured
        );
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn one_failing_adapter_does_not_sink_the_rest() {
        let adapters: Vec<Box<dyn IndicatorSource>> = vec![
            Box::new(FixedAdapter {
                indicator: Indicator::Temperature,
                value: Some(22.3),
            }),
            Box::new(FailingAdapter {
                indicator: Indicator::Poverty,
            }),
            Box::new(FixedAdapter {
                indicator: Indicator::Forest,
                value: Some(0.045),
            }),
        ];

        let snapshot = aggregate(&egypt(), &adapters).await;
        assert_eq!(snapshot.successful_indicators, 2);
        assert_eq!(
            snapshot.indicators[&Indicator::Poverty].status,
            IndicatorStatus::Error
        );
        assert_eq!(snapshot.indicators[&Indicator::Forest].value, Some(0.045));
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn zero_co2_is_scored_as_missing() {
        let adapters: Vec<Box<dyn IndicatorSource>> = vec![Box::new(FixedAdapter {
            indicator: Indicator::Co2,
            value: Some(0.0),
        })];

        let snapshot = aggregate(&egypt(), &adapters).await;
        assert_eq!(snapshot.successful_indicators, 0);
        let co2 = &snapshot.indicators[&Indicator::Co2];
        assert_eq!(co2.value, None);
        assert_eq!(co2.status, IndicatorStatus::NoData);
    }

    #[tokio::test]
    async fn identical_responses_aggregate_identically() {
        let adapters: Vec<Box<dyn IndicatorSource>> = vec![
            Box::new(FixedAdapter {
                indicator: Indicator::Temperature,
                value: Some(22.3),
            }),
            Box::new(FailingAdapter {
                indicator: Indicator::Poverty,
            }),
            Box::new(FixedAdapter {
                indicator: Indicator::Co2,
                value: Some(0.0),
            }),
        ];

        let first = aggregate(&egypt(), &adapters).await;
        let second = aggregate(&egypt(), &adapters).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn total_transport_outage_sets_the_entity_error() {
        let adapters: Vec<Box<dyn IndicatorSource>> = Indicator::ALL
            .into_iter()
            .map(|indicator| {
                Box::new(FailingAdapter { indicator }) as Box<dyn IndicatorSource>
            })
            .collect();

        let snapshot = aggregate(&egypt(), &adapters).await;
        assert_eq!(snapshot.successful_indicators, 0);
        assert_eq!(snapshot.error.as_deref(), Some("all providers failed"));
    }
}
