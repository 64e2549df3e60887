#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Indicator data source adapters and record packing.
//!
//! Each indicator is backed by an adapter implementing the
//! [`IndicatorSource`] trait. Adapters fetch one observation per country
//! from their upstream provider and hand it to the packer
//! ([`packer::pack`]), which applies the zero-coercion policy and range
//! checks and always yields a well-formed record. Adapters never fail
//! the batch: every upstream problem is folded into the record's status.

pub mod adapters;
pub mod copernicus;
pub mod packer;
pub mod registry;
pub mod retry;
pub mod world_bank;
pub mod worldpop;

use async_trait::async_trait;
use indicator_map_indicator_models::{Indicator, IndicatorRecord};
use indicator_map_source_models::{Country, Provider};

/// Errors that can occur while fetching from an upstream provider.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider responded, but not with anything usable.
    #[error("Upstream error: {message}")]
    Upstream {
        /// Description of what went wrong.
        message: String,
    },

    /// The provider responded, but has no observation for this query.
    #[error("No data: {message}")]
    NoData {
        /// Description of what was missing.
        message: String,
    },

    /// The provider requires credentials that are not configured.
    #[error("Provider {provider} is not configured")]
    NotConfigured {
        /// The provider that is missing credentials.
        provider: Provider,
    },
}

/// Trait that all indicator adapters implement.
///
/// An adapter knows how to fetch the raw observation for one indicator
/// from its upstream provider and pack it into a canonical record.
/// `fetch` is infallible by contract: failures become records whose
/// status describes the failure.
#[async_trait]
pub trait IndicatorSource: Send + Sync {
    /// The indicator this adapter produces.
    fn indicator(&self) -> Indicator;

    /// Fetches and packs the observation for one country.
    async fn fetch(&self, country: &Country) -> IndicatorRecord;
}
