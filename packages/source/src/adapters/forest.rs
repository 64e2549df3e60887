//! Forest cover adapter.
//!
//! Primary source is the Copernicus land cover product sampled at the
//! country centroid. When that is unavailable (no credentials, no
//! pixel), the adapter falls back to the World Bank forest area series
//! and marks the record as a fallback so consumers can see the
//! provenance difference.

use async_trait::async_trait;
use indicator_map_indicator_models::{Indicator, IndicatorRecord, IndicatorStatus};
use indicator_map_source_models::{Country, ProviderSettings};

use crate::{IndicatorSource, copernicus, packer, world_bank};

/// World Bank series: forest area as a percentage of land area.
const FALLBACK_SERIES: &str = "AG.LND.FRST.ZS";

pub struct ForestAdapter {
    client: reqwest::Client,
    settings: ProviderSettings,
}

impl ForestAdapter {
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
                    Indicator::Forest,
                    Some(obs.value),
                    format!("World Bank {FALLBACK_SERIES}"),
                );
                ctx.status = IndicatorStatus::Fallback;
                ctx.year = Some(obs.year);
                ctx.period = Some(obs.year.to_string());
                ctx.note = Some(format!("land cover unavailable: {reason}"));
                packer::pack(ctx)
            }
            Err(err) => packer::failure_record(
                Indicator::Forest,
                &format!("World Bank {FALLBACK_SERIES}"),
                &err,
            ),
        }
    }
}

#[async_trait]
impl IndicatorSource for ForestAdapter {
    fn indicator(&self) -> Indicator {
        Indicator::Forest
    }

    async fn fetch(&self, country: &Country) -> IndicatorRecord {
        match copernicus::fetch_forest_fraction(
            &self.client,
            &self.settings,
            country.lat,
            country.lon,
        )
        .await
        {
            Ok((percent, year)) => {
                let mut ctx = packer::PackContext::success(
                    Indicator::Forest,
                    Some(percent),
                    "Copernicus land cover",
                );
                ctx.method = "centroid_sample".to_string();
                ctx.year = Some(year);
                ctx.period = Some(year.to_string());
                packer::pack(ctx)
            }
            Err(err) => {
                log::info!(
                    "forest land cover unavailable for {}, falling back to World Bank: {err}",
                    country.iso3
                );
                self.fallback(country, &err.to_string()).await
            }
        }
    }
}
