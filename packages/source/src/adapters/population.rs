//! Population density adapter.
//!
//! Primary source is WorldPop; the World Bank density series stands in
//! when WorldPop has no estimate for the country, marked as a fallback.

use async_trait::async_trait;
use indicator_map_indicator_models::{Indicator, IndicatorRecord, IndicatorStatus};
use indicator_map_source_models::{Country, ProviderSettings};

use crate::{IndicatorSource, packer, world_bank, worldpop};

/// World Bank series: population density, people per sq. km.
const FALLBACK_SERIES: &str = "EN.POP.DNST";

pub struct PopulationAdapter {
    client: reqwest::Client,
    settings: ProviderSettings,
}

impl PopulationAdapter {
    #[must_use]
    pub const fn new(client: reqwest::Client, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }

    async fn fallback(&self, country: &Country, reason: &str) -> IndicatorRecord {
        match world_bank::fetch_latest(
            &self.client,
            &self.settings,
            &country.iso3,
            FALLBACK_SERIES,
        )
        .await
        {
            Ok(obs) => {
                let mut ctx = packer::PackContext::success(
                    Indicator::Population,
                    Some(obs.value),
                    format!("World Bank {FALLBACK_SERIES}"),
                );
                ctx.status = IndicatorStatus::Fallback;
                ctx.year = Some(obs.year);
                ctx.period = Some(obs.year.to_string());
                ctx.note = Some(format!("WorldPop unavailable: {reason}"));
                packer::pack(ctx)
            }
            Err(err) => packer::failure_record(
                Indicator::Population,
                &format!("World Bank {FALLBACK_SERIES}"),
                &err,
            ),
        }
    }
}

#[async_trait]
impl IndicatorSource for PopulationAdapter {
    fn indicator(&self) -> Indicator {
        Indicator::Population
    }

    async fn fetch(&self, country: &Country) -> IndicatorRecord {
        match worldpop::fetch_density(&self.client, &self.settings, &country.iso3).await {
            Ok(obs) => {
                let mut ctx = packer::PackContext::success(
                    Indicator::Population,
                    Some(obs.density),
                    "WorldPop",
                );
                ctx.year = Some(obs.year);
                ctx.period = Some(obs.year.to_string());
                packer::pack(ctx)
            }
            Err(err) => {
                log::info!(
                    "WorldPop density unavailable for {}, falling back to World Bank: {err}",
                    country.iso3
                );
                self.fallback(country, &err.to_string()).await
            }
        }
    }
}
