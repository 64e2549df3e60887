//! One adapter per indicator.
//!
//! [`all_adapters`] assembles the full set in canonical indicator
//! order; the aggregator consumes them without knowing which provider
//! sits behind each one.

pub mod climate;
pub mod co2;
pub mod forest;
pub mod population;
pub mod world_bank;

use indicator_map_indicator_models::Indicator;
use indicator_map_source_models::ProviderSettings;

use crate::IndicatorSource;

/// Builds the adapter set covering every canonical indicator.
///
/// The `client` is shared across adapters; `reqwest::Client` clones
/// share the underlying connection pool.
#[must_use]
pub fn all_adapters(
    client: &reqwest::Client,
    settings: &ProviderSettings,
) -> Vec<Box<dyn IndicatorSource>> {
    vec![
        Box::new(climate::ClimateAdapter::new(
            client.clone(),
            settings.clone(),
            climate::ClimateMetric::Temperature,
        )),
        Box::new(climate::ClimateAdapter::new(
            client.clone(),
            settings.clone(),
            climate::ClimateMetric::Precipitation,
        )),
        Box::new(co2::Co2Adapter::new(client.clone(), settings.clone())),
        Box::new(forest::ForestAdapter::new(client.clone(), settings.clone())),
        Box::new(population::PopulationAdapter::new(
            client.clone(),
            settings.clone(),
        )),
        Box::new(world_bank::WorldBankAdapter::new(
            client.clone(),
            settings.clone(),
            Indicator::Poverty,
            "SI.POV.DDAY",
        )),
        Box::new(world_bank::WorldBankAdapter::new(
            client.clone(),
            settings.clone(),
            Indicator::Unemployment,
            "SL.UEM.TOTL.ZS",
        )),
        Box::new(world_bank::WorldBankAdapter::new(
            client.clone(),
            settings.clone(),
            Indicator::WaterWithdrawal,
            "ER.H2O.FWTL.ZS",
        )),
        Box::new(world_bank::WorldBankAdapter::new(
            client.clone(),
            settings.clone(),
            Indicator::SchoolEnrollment,
            "SE.PRM.NENR",
        )),
        Box::new(world_bank::WorldBankAdapter::new(
            client.clone(),
            settings.clone(),
            Indicator::ReceivedWages,
            "SL.EMP.WORK.ZS",
        )),
        Box::new(world_bank::WorldBankAdapter::new(
            client.clone(),
            settings.clone(),
            Indicator::HealthCoverage,
            "SH.UHC.SRVS.CV.XD",
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn adapter_set_covers_every_indicator_exactly_once() {
        let settings = ProviderSettings {
            copernicus_url: String::new(),
            copernicus_key: None,
            world_bank_url: String::new(),
            worldpop_url: String::new(),
        };
        let client = reqwest::Client::new();
        let adapters = all_adapters(&client, &settings);
        assert_eq!(adapters.len(), Indicator::ALL.len());

        let covered: BTreeSet<Indicator> = adapters.iter().map(|a| a.indicator()).collect();
        assert_eq!(covered, Indicator::ALL.iter().copied().collect());
    }
}
