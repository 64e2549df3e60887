//! Generic adapter for indicators backed directly by one World Bank
//! series. All six socioeconomic indicators are instances of this.

use async_trait::async_trait;
use indicator_map_indicator_models::{Indicator, IndicatorRecord};
use indicator_map_source_models::{Country, ProviderSettings};

use crate::{IndicatorSource, packer, world_bank};

pub struct WorldBankAdapter {
    client: reqwest::Client,
    settings: ProviderSettings,
    indicator: Indicator,
    series: &'static str,
}

impl WorldBankAdapter {
    #[must_use]
    pub const fn new(
        client: reqwest::Client,
        settings: ProviderSettings,
        indicator: Indicator,
        series: &'static str,
    ) -> Self {
        Self {
            client,
            settings,
            indicator,
            series,
        }
    }
}

#[async_trait]
impl IndicatorSource for WorldBankAdapter {
    fn indicator(&self) -> Indicator {
        self.indicator
    }

    async fn fetch(&self, country: &Country) -> IndicatorRecord {
        let source = format!("World Bank {}", self.series);
        match world_bank::fetch_latest(&self.client, &self.settings, &country.iso3, self.series)
            .await
        {
            Ok(obs) => {
                let mut ctx =
                    packer::PackContext::success(self.indicator, Some(obs.value), source);
                ctx.year = Some(obs.year);
                ctx.period = Some(obs.year.to_string());
                packer::pack(ctx)
            }
            Err(err) => packer::failure_record(self.indicator, &source, &err),
        }
    }
}
