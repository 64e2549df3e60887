//! HTTP handler functions for the indicator API.

use actix_web::{HttpResponse, web};
use indicator_map_server_models::{
    ApiCountryList, ApiCountryResponse, ApiError, ApiHealth, ApiPointResponse, Coordinates,
    PointQueryParams,
};
use indicator_map_source::registry;
use indicator_map_source_models::AFRICA_BOUNDS;

use crate::AppState;

/// Example shown to callers who send a malformed point query.
const POINT_QUERY_EXAMPLE: &str = "/api/indicators?lat=26.8&lon=30.8";

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let countries_stored = state
        .store
        .available_countries()
        .await
        .map_or(0, |c| c.len());

    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        database_connected: state.store.has_database(),
        countries_stored,
    })
}

/// `GET /api/country/{iso3}`
///
/// Returns the stored snapshot for one country. Unknown codes get a
/// 404 listing the codes that are available.
pub async fn country(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let iso3 = path.into_inner();
    if iso3.len() != 3 || !iso3.chars().all(|c| c.is_ascii_alphabetic()) {
        return HttpResponse::BadRequest().json(ApiError {
            error: format!("Invalid country code: {iso3}"),
            available_countries: None,
            example: Some("EGY".to_string()),
        });
    }

    match state.store.get(&iso3).await {
        Ok(Some(stored)) => HttpResponse::Ok().json(ApiCountryResponse {
            data: stored.snapshot,
            source: stored.source,
            cache_info: stored.cache,
        }),
        Ok(None) => {
            let available = state
                .store
                .available_countries()
                .await
                .unwrap_or_default();
            HttpResponse::NotFound().json(ApiError {
                error: format!("No data for country: {}", iso3.to_ascii_uppercase()),
                available_countries: Some(available),
                example: None,
            })
        }
        Err(e) => {
            log::error!("snapshot read failed for {iso3}: {e}");
            HttpResponse::ServiceUnavailable()
                .json(ApiError::new("snapshot store is unavailable"))
        }
    }
}

/// `GET /api/countries`
///
/// Lists all stored snapshots as summaries.
pub async fn countries(state: web::Data<AppState>) -> HttpResponse {
    match state.store.list().await {
        Ok((summaries, source)) => HttpResponse::Ok().json(ApiCountryList {
            total: summaries.len(),
            countries: summaries,
            source,
        }),
        Err(e) => {
            log::error!("snapshot listing failed: {e}");
            HttpResponse::ServiceUnavailable()
                .json(ApiError::new("snapshot store is unavailable"))
        }
    }
}

/// `GET /api/indicators?lat=..&lon=..`
///
/// Resolves a coordinate to the nearest registered country and returns
/// that country's snapshot. `country=ISO3` skips the resolution.
pub async fn indicators(
    state: web::Data<AppState>,
    params: web::Query<PointQueryParams>,
) -> HttpResponse {
    let (Some(lat), Some(lon)) = (params.lat, params.lon) else {
        return HttpResponse::BadRequest().json(ApiError {
            error: "Both lat and lon query parameters are required".to_string(),
            available_countries: None,
            example: Some(POINT_QUERY_EXAMPLE.to_string()),
        });
    };

    if !AFRICA_BOUNDS.contains(lat, lon) {
        return HttpResponse::BadRequest().json(ApiError {
            error: format!(
                "Coordinates ({lat}, {lon}) are outside the supported region \
                 (lat {}..{}, lon {}..{})",
                AFRICA_BOUNDS.min_lat,
                AFRICA_BOUNDS.max_lat,
                AFRICA_BOUNDS.min_lon,
                AFRICA_BOUNDS.max_lon
            ),
            available_countries: None,
            example: Some(POINT_QUERY_EXAMPLE.to_string()),
        });
    }

    let resolved = if let Some(code) = &params.country {
        registry::find_country(code)
    } else {
        registry::nearest_country(lat, lon)
    };
    let Some(country) = resolved else {
        return HttpResponse::NotFound().json(ApiError {
            error: format!(
                "Unknown country: {}",
                params.country.as_deref().unwrap_or_default()
            ),
            available_countries: Some(
                registry::all_countries().into_iter().map(|c| c.iso3).collect(),
            ),
            example: None,
        });
    };

    match state.store.get(&country.iso3).await {
        Ok(Some(stored)) => HttpResponse::Ok().json(ApiPointResponse {
            coordinates: Coordinates { lat, lon },
            location: params.location.clone(),
            country,
            data: stored.snapshot,
            source: stored.source,
            cache_info: stored.cache,
        }),
        Ok(None) => {
            let available = state
                .store
                .available_countries()
                .await
                .unwrap_or_default();
            HttpResponse::NotFound().json(ApiError {
                error: format!("No data for country: {}", country.iso3),
                available_countries: Some(available),
                example: None,
            })
        }
        Err(e) => {
            log::error!("snapshot read failed for {}: {e}", country.iso3);
            HttpResponse::ServiceUnavailable()
                .json(ApiError::new("snapshot store is unavailable"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use actix_web::{App, test};
    use indicator_map_database::{SnapshotStore, ensure_schema};
    use indicator_map_indicator_models::{
        EntitySnapshot, Indicator, IndicatorRecord, IndicatorStatus, QualityCheck, RangeCheck,
    };
    use switchy_database_connection::init_sqlite_rusqlite;

    use super::*;
    use crate::configure_api;

    fn sample_snapshot(iso3: &str, name: &str) -> EntitySnapshot {
        let mut indicators = BTreeMap::new();
        indicators.insert(
            Indicator::Temperature,
            IndicatorRecord {
                value: Some(22.3),
                unit: "°C".to_string(),
                source: "Copernicus ERA5".to_string(),
                method: "centroid_sample".to_string(),
                status: IndicatorStatus::Success,
                quality: QualityCheck {
                    range_check: RangeCheck::WithinRange,
                },
                year: None,
                period: None,
                date: None,
                days_old: Some(6),
                uncertainty: None,
                note: None,
            },
        );
        EntitySnapshot::new(
            iso3.to_string(),
            name.to_string(),
            "North Africa".to_string(),
            indicators,
        )
    }

    async fn seeded_state(name: &str) -> web::Data<AppState> {
        let db = init_sqlite_rusqlite(None).expect("in-memory sqlite");
        ensure_schema(db.as_ref()).await.expect("schema");
        let json_path = std::env::temp_dir().join(format!(
            "indicator-map-server-{}-{name}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&json_path);
        let store = SnapshotStore::with_database(Some(Arc::from(db)), json_path);
        store
            .put(&sample_snapshot("EGY", "Egypt"))
            .await
            .expect("seed");
        web::Data::new(AppState { store })
    }

    #[actix_web::test]
    async fn health_reports_store_status() {
        let state = seeded_state("health").await;
        let app =
            test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["databaseConnected"], true);
        assert_eq!(body["countriesStored"], 1);
    }

    #[actix_web::test]
    async fn country_lookup_returns_snapshot_with_provenance() {
        let state = seeded_state("country").await;
        let app =
            test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let req = test::TestRequest::get().uri("/api/country/egy").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["source"], "sqlite");
        assert_eq!(body["data"]["countryName"], "Egypt");
        assert_eq!(body["data"]["indicators"]["temperature"]["value"], 22.3);
        assert_eq!(body["cacheInfo"]["refreshDue"], false);
    }

    #[actix_web::test]
    async fn unknown_country_is_404_with_available_codes() {
        let state = seeded_state("unknown").await;
        let app =
            test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let req = test::TestRequest::get().uri("/api/country/TUN").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["availableCountries"][0], "EGY");
    }

    #[actix_web::test]
    async fn malformed_country_code_is_400() {
        let state = seeded_state("malformed").await;
        let app =
            test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let req = test::TestRequest::get()
            .uri("/api/country/EGYPT")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["example"], "EGY");
    }

    #[actix_web::test]
    async fn point_query_resolves_to_nearest_country() {
        let state = seeded_state("point").await;
        let app =
            test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let req = test::TestRequest::get()
            .uri("/api/indicators?lat=30.04&lon=31.24&location=Cairo")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["country"]["iso3"], "EGY");
        assert_eq!(body["location"], "Cairo");
        assert_eq!(body["coordinates"]["lat"], 30.04);
    }

    #[actix_web::test]
    async fn point_query_outside_bounds_is_400() {
        let state = seeded_state("bounds").await;
        let app =
            test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let req = test::TestRequest::get()
            .uri("/api/indicators?lat=48.86&lon=2.35")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["example"], POINT_QUERY_EXAMPLE);
    }

    #[actix_web::test]
    async fn point_query_without_coordinates_is_400() {
        let state = seeded_state("missing-params").await;
        let app =
            test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let req = test::TestRequest::get().uri("/api/indicators").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn countries_listing_returns_summaries() {
        let state = seeded_state("listing").await;
        let app =
            test::init_service(App::new().app_data(state).configure(configure_api)).await;

        let req = test::TestRequest::get().uri("/api/countries").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["source"], "sqlite");
        assert_eq!(body["countries"][0]["iso3"], "EGY");
        assert_eq!(body["countries"][0]["successfulIndicators"], 1);
    }
}
