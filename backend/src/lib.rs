pub mod database;
pub mod error;
pub mod forecast;
pub mod geocode;
pub mod handlers;
pub mod hori;
pub mod osrm;
pub mod sampling;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::database::Database;
use crate::forecast::ForecastClient;
use crate::geocode::GeocodeClient;
use crate::osrm::OsrmClient;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub osrm: OsrmClient,
    pub forecast: ForecastClient,
    pub geocode: GeocodeClient,
}

pub fn create_router(state: AppState) -> Router {
    // The API is consumed from browsers on other origins, so CORS stays
    // wide open.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/search", get(handlers::search_places))
        .route("/api/hori", get(handlers::hori_point))
        .route("/api/hori/point", post(handlers::save_hori_point))
        .route("/api/hori/route", post(handlers::hori_route))
        .route("/api/searched", get(handlers::list_searched))
        .route("/api/searched/:id", get(handlers::get_searched))
        .route("/api/trips", get(handlers::list_trips))
        .route("/api/trips/:id", get(handlers::get_trip))
        .layer(cors)
        .with_state(state)
}
