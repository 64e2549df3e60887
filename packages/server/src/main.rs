#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Server entry point.

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use indicator_map_database::{SnapshotStore, db_path_from_env, json_path_from_env};
use indicator_map_server::{AppState, configure_api};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    log::info!("Opening snapshot store...");
    let store = SnapshotStore::connect(&db_path_from_env(), &json_path_from_env()).await;
    if !store.has_database() {
        log::warn!("serving from the JSON export only");
    }

    let state = web::Data::new(AppState { store });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
