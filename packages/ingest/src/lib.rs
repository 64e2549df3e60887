#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch refresh pipeline.
//!
//! Walks a set of countries, aggregates all indicators for each, and
//! persists the snapshots. One bad country never stops the batch; it is
//! recorded and the run moves on. The default scope is a small test
//! subset so a casual run does not spend an hour talking to providers.

pub mod aggregate;

use std::time::{Duration, Instant};

use indicator_map_database::{DbError, SnapshotStore};
use indicator_map_indicator_models::EntitySnapshot;
use indicator_map_source::{IndicatorSource, registry};
use indicator_map_source_models::Country;
use thiserror::Error;

/// Seconds to wait between countries, spreading load across providers.
pub const INTER_COUNTRY_DELAY_SECS: u64 = 15;

/// How many countries the final report names by completeness.
const REPORT_TOP_N: usize = 5;

/// Errors from the refresh pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Snapshot store failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// An ISO3 code that is not in the registry.
    #[error("Unknown country: {iso3}")]
    UnknownCountry {
        /// The code that failed to resolve.
        iso3: String,
    },
}

/// Scope and pacing knobs for a batch run.
#[derive(Debug, Clone)]
pub struct RefreshOptions {
    /// Process every registered country instead of the test subset.
    pub full: bool,
    /// Cap the number of countries processed.
    pub limit: Option<usize>,
    /// Explicit ISO3 codes, overriding both scopes.
    pub countries: Option<Vec<String>>,
    /// Refresh even countries that are not yet due.
    pub force: bool,
    /// Seconds between countries.
    pub delay_secs: u64,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            full: false,
            limit: None,
            countries: None,
            force: false,
            delay_secs: INTER_COUNTRY_DELAY_SECS,
        }
    }
}

/// Outcome of a batch run.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    /// Countries refreshed and persisted.
    pub refreshed: u32,
    /// Countries skipped because they were not yet due.
    pub skipped: u32,
    /// Countries whose snapshot could not be persisted.
    pub failed: u32,
    /// Mean completeness across refreshed countries.
    pub average_completeness: f64,
    /// Highest-completeness countries, `(iso3, completeness)`.
    pub top: Vec<(String, f64)>,
}

/// Resolves the country scope for a run.
///
/// Explicit `countries` win over everything; otherwise `full` selects
/// the whole registry and the default is the test subset. `limit`
/// truncates whichever scope was chosen.
///
/// # Errors
///
/// Returns [`IngestError::UnknownCountry`] for an ISO3 code not in the
/// registry.
pub fn resolve_scope(options: &RefreshOptions) -> Result<Vec<Country>, IngestError> {
    let mut scope = if let Some(codes) = &options.countries {
        codes
            .iter()
            .map(|code| {
                registry::find_country(code).ok_or_else(|| IngestError::UnknownCountry {
                    iso3: code.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?
    } else if options.full {
        registry::all_countries()
    } else {
        registry::TEST_SCOPE
            .iter()
            .filter_map(|code| registry::find_country(code))
            .collect()
    };

    if let Some(limit) = options.limit {
        scope.truncate(limit);
    }
    Ok(scope)
}

/// Refreshes one country and persists the snapshot.
///
/// # Errors
///
/// Returns [`IngestError`] if the snapshot cannot be persisted.
pub async fn refresh_country(
    store: &SnapshotStore,
    adapters: &[Box<dyn IndicatorSource>],
    country: &Country,
) -> Result<EntitySnapshot, IngestError> {
    let start = Instant::now();
    let snapshot = aggregate::aggregate(country, adapters).await;
    store.put(&snapshot).await?;
    log::info!(
        "{}: {}/{} indicators ({:.1}%) in {:.1}s",
        country.iso3,
        snapshot.successful_indicators,
        snapshot.total_indicators,
        snapshot.completeness,
        start.elapsed().as_secs_f64()
    );
    Ok(snapshot)
}

/// Runs the batch refresh over the resolved scope.
///
/// Countries that are not due are skipped unless `force` is set. A
/// persistence failure for one country is logged and counted, and the
/// batch continues.
///
/// # Errors
///
/// Returns [`IngestError`] if the scope cannot be resolved or the
/// refresh schedule cannot be read.
pub async fn refresh_all(
    store: &SnapshotStore,
    adapters: &[Box<dyn IndicatorSource>],
    options: &RefreshOptions,
) -> Result<RefreshReport, IngestError> {
    let scope = resolve_scope(options)?;
    log::info!(
        "refreshing {} countr{}: {}",
        scope.len(),
        if scope.len() == 1 { "y" } else { "ies" },
        scope
            .iter()
            .map(|c| c.iso3.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut refreshed = 0u32;
    let mut skipped = 0u32;
    let mut failed = 0u32;
    let mut scores: Vec<(String, f64)> = Vec::new();
    let mut first = true;

    for country in &scope {
        if !options.force && !store.needs_refresh(&country.iso3).await? {
            log::info!("{}: fresh, skipping", country.iso3);
            skipped += 1;
            continue;
        }

        if !first && options.delay_secs > 0 {
            log::debug!("waiting {}s before next country", options.delay_secs);
            tokio::time::sleep(Duration::from_secs(options.delay_secs)).await;
        }
        first = false;

        match refresh_country(store, adapters, country).await {
            Ok(snapshot) => {
                refreshed += 1;
                scores.push((country.iso3.clone(), snapshot.completeness));
            }
            Err(e) => {
                failed += 1;
                log::error!("{}: refresh failed: {e}", country.iso3);
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let average_completeness = if scores.is_empty() {
        0.0
    } else {
        scores.iter().map(|(_, c)| c).sum::<f64>() / scores.len() as f64
    };
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scores.truncate(REPORT_TOP_N);

    let report = RefreshReport {
        refreshed,
        skipped,
        failed,
        average_completeness,
        top: scores,
    };

    log::info!(
        "refresh complete: {} refreshed, {} skipped, {} failed",
        report.refreshed,
        report.skipped,
        report.failed
    );
    if report.refreshed > 0 {
        log::info!("average completeness: {:.1}%", report.average_completeness);
        for (iso3, completeness) in &report.top {
            log::info!("  {iso3}: {completeness:.1}%");
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use indicator_map_indicator_models::{Indicator, IndicatorRecord};
    use indicator_map_source::packer::{self, PackContext};
    use switchy_database_connection::init_sqlite_rusqlite;

    struct FixedAdapter {
        indicator: Indicator,
        value: f64,
    }

    #[async_trait]
    impl IndicatorSource for FixedAdapter {
        fn indicator(&self) -> Indicator {
            self.indicator
        }

        async fn fetch(&self, _country: &Country) -> IndicatorRecord {
            packer::pack(PackContext::success(self.indicator, Some(self.value), "mock"))
        }
    }

    async fn memory_store(name: &str) -> SnapshotStore {
        let db = init_sqlite_rusqlite(None).expect("in-memory sqlite");
        indicator_map_database::ensure_schema(db.as_ref())
            .await
            .expect("schema");
        let json_path = std::env::temp_dir().join(format!(
            "indicator-map-ingest-{}-{name}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&json_path);
        SnapshotStore::with_database(Some(Arc::from(db)), json_path)
    }

    #[test]
    fn default_scope_is_the_test_subset() {
        let scope = resolve_scope(&RefreshOptions::default()).expect("scope");
        assert_eq!(scope.len(), 1);
        assert_eq!(scope[0].iso3, "EGY");
    }

    #[test]
    fn full_scope_covers_the_registry_and_limit_truncates() {
        let options = RefreshOptions {
            full: true,
            limit: Some(3),
            ..RefreshOptions::default()
        };
        let scope = resolve_scope(&options).expect("scope");
        assert_eq!(scope.len(), 3);
    }

    #[test]
    fn explicit_unknown_country_is_rejected() {
        let options = RefreshOptions {
            countries: Some(vec!["EGY".to_string(), "XXX".to_string()]),
            ..RefreshOptions::default()
        };
        let err = resolve_scope(&options).expect_err("unknown code");
        assert!(matches!(err, IngestError::UnknownCountry { iso3 } if iso3 == "XXX"));
    }

    #[tokio::test]
    async fn refresh_all_persists_and_reports() {
        let store = memory_store("refresh-all").await;
        let adapters: Vec<Box<dyn IndicatorSource>> = vec![
            Box::new(FixedAdapter {
                indicator: Indicator::Temperature,
                value: 22.3,
            }),
            Box::new(FixedAdapter {
                indicator: Indicator::Poverty,
                value: 3.8,
            }),
        ];
        let options = RefreshOptions {
            countries: Some(vec!["EGY".to_string(), "TUN".to_string()]),
            force: true,
            delay_secs: 0,
            ..RefreshOptions::default()
        };

        let report = refresh_all(&store, &adapters, &options).await.expect("run");
        assert_eq!(report.refreshed, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.failed, 0);
        assert!((report.average_completeness - 2.0 / 11.0 * 100.0).abs() < 1e-9);
        assert_eq!(report.top.len(), 2);

        let stored = store.get("TUN").await.expect("get").expect("present");
        assert_eq!(stored.snapshot.successful_indicators, 2);
    }

    #[tokio::test]
    async fn fresh_countries_are_skipped_without_force() {
        let store = memory_store("skip-fresh").await;
        let adapters: Vec<Box<dyn IndicatorSource>> = vec![Box::new(FixedAdapter {
            indicator: Indicator::Temperature,
            value: 22.3,
        })];
        let options = RefreshOptions {
            countries: Some(vec!["EGY".to_string()]),
            force: true,
            delay_secs: 0,
            ..RefreshOptions::default()
        };
        refresh_all(&store, &adapters, &options).await.expect("first run");

        let rerun = RefreshOptions {
            force: false,
            ..options
        };
        let report = refresh_all(&store, &adapters, &rerun).await.expect("rerun");
        assert_eq!(report.refreshed, 0);
        assert_eq!(report.skipped, 1);
    }
}
