//! Atmospheric CO2 adapter backed by Copernicus satellite greenhouse
//! gas products (column-averaged XCO2).

use async_trait::async_trait;
use indicator_map_indicator_models::{Indicator, IndicatorRecord};
use indicator_map_source_models::{Country, ProviderSettings};

use crate::{IndicatorSource, copernicus, packer};

pub struct Co2Adapter {
    client: reqwest::Client,
    settings: ProviderSettings,
}

impl Co2Adapter {
    #[must_use]
    pub const fn new(client: reqwest::Client, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl IndicatorSource for Co2Adapter {
    fn indicator(&self) -> Indicator {
        Indicator::Co2
    }

    async fn fetch(&self, country: &Country) -> IndicatorRecord {
        match copernicus::fetch_xco2(&self.client, &self.settings, country.lat, country.lon).await {
            Ok(sample) => {
                let mut ctx = packer::PackContext::success(
                    Indicator::Co2,
                    Some(sample.ppm),
                    "Copernicus satellite XCO2",
                );
                ctx.method = "centroid_sample".to_string();
                ctx.date = Some(sample.date);
                ctx.uncertainty = sample.uncertainty;
                packer::pack(ctx)
            }
            Err(err) => packer::failure_record(Indicator::Co2, "Copernicus satellite XCO2", &err),
        }
    }
}
