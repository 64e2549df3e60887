//! Surface weather adapter backed by Copernicus ERA5.
//!
//! Temperature and precipitation come from the same ERA5 point sample,
//! so both are instances of one adapter parameterized on the metric.

use async_trait::async_trait;
use indicator_map_indicator_models::{Indicator, IndicatorRecord};
use indicator_map_source_models::{Country, ProviderSettings};

use crate::{IndicatorSource, copernicus, packer};

/// Which ERA5 surface variable this adapter instance reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClimateMetric {
    Temperature,
    Precipitation,
}

pub struct ClimateAdapter {
    client: reqwest::Client,
    settings: ProviderSettings,
    metric: ClimateMetric,
}

impl ClimateAdapter {
    #[must_use]
    pub const fn new(
        client: reqwest::Client,
        settings: ProviderSettings,
        metric: ClimateMetric,
    ) -> Self {
        Self {
            client,
            settings,
            metric,
        }
    }
}

#[async_trait]
impl IndicatorSource for ClimateAdapter {
    fn indicator(&self) -> Indicator {
        match self.metric {
            ClimateMetric::Temperature => Indicator::Temperature,
            ClimateMetric::Precipitation => Indicator::Precipitation,
        }
    }

    async fn fetch(&self, country: &Country) -> IndicatorRecord {
        match copernicus::fetch_era5(&self.client, &self.settings, country.lat, country.lon).await {
            Ok(sample) => {
                let value = match self.metric {
                    ClimateMetric::Temperature => sample.temperature_c,
                    ClimateMetric::Precipitation => sample.precipitation_mm,
                };
                let mut ctx =
                    packer::PackContext::success(self.indicator(), Some(value), "Copernicus ERA5");
                ctx.method = "centroid_sample".to_string();
                ctx.date = Some(sample.date);
                packer::pack(ctx)
            }
            Err(err) => packer::failure_record(self.indicator(), "Copernicus ERA5", &err),
        }
    }
}
