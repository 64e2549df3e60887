#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for country indicator snapshots.
//!
//! Read-only: the server never talks to data providers. Everything it
//! serves comes from the snapshot store, which degrades to the bulk
//! JSON export when `SQLite` is unavailable, so a data outage shows up
//! as stale data rather than errors.

pub mod handlers;

use actix_web::web;
use indicator_map_database::SnapshotStore;

/// Shared application state.
pub struct AppState {
    /// Snapshot store handle.
    pub store: SnapshotStore,
}

/// Mounts the API routes under `/api`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/country/{iso3}", web::get().to(handlers::country))
            .route("/countries", web::get().to(handlers::countries))
            .route("/indicators", web::get().to(handlers::indicators)),
    );
}
