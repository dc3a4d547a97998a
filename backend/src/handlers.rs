// Handlers for the HORI API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use shared::{ApiError, HoriPoint, HoriRouteResponse, PlaceSuggestion, RouteRequest};

use crate::database::{NewSearchedPoint, NewTrip, SearchedPoint, Trip, TripDetail};
use crate::error::HoriError;
use crate::hori::{self, format_utc_secs};
use crate::AppState;

const DEFAULT_SEARCHED_LIMIT: i64 = 50;
const DEFAULT_TRIPS_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct PointQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct SavePointQuery {
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_place_name")]
    pub place_name: String,
}

fn default_place_name() -> String {
    "Unknown location".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SearchedListQuery {
    #[serde(default = "default_searched_limit")]
    pub limit: i64,
}

fn default_searched_limit() -> i64 {
    DEFAULT_SEARCHED_LIMIT
}

#[derive(Debug, Deserialize)]
pub struct TripsListQuery {
    #[serde(default = "default_trips_limit")]
    pub limit: i64,
}

fn default_trips_limit() -> i64 {
    DEFAULT_TRIPS_LIMIT
}

/// GET /api/health - Liveness report
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "msg": "HORI backend running" }))
}

/// GET /api/search?q= - Geocode a free-text place query
pub async fn search_places(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<PlaceSuggestion>>, (StatusCode, Json<ApiError>)> {
    if query.q.chars().count() < 2 {
        return Err(hori_error_to_api_error(HoriError::invalid_input(
            "query must be at least 2 characters",
        )));
    }

    state
        .geocode
        .search(&query.q)
        .await
        .map(Json)
        .map_err(hori_error_to_api_error)
}

/// GET /api/hori?lat=&lon= - Score one location for the current hour
pub async fn hori_point(
    State(state): State<AppState>,
    Query(query): Query<PointQuery>,
) -> Result<Json<HoriPoint>, (StatusCode, Json<ApiError>)> {
    let reading = hori::score_point(&state.forecast, query.lat, query.lon, Utc::now())
        .await
        .map_err(hori_error_to_api_error)?;

    Ok(Json(HoriPoint {
        lat: query.lat,
        lon: query.lon,
        temp_c: reading.temp_c,
        aqi: reading.aqi,
        hori: reading.hori,
        reason: reading.reason,
    }))
}

/// POST /api/hori/point?lat=&lon=&place_name= - Score a location and persist it
pub async fn save_hori_point(
    State(state): State<AppState>,
    Query(query): Query<SavePointQuery>,
) -> Result<Json<SearchedPoint>, (StatusCode, Json<ApiError>)> {
    let reading = hori::score_point(&state.forecast, query.lat, query.lon, Utc::now())
        .await
        .map_err(hori_error_to_api_error)?;

    state
        .db
        .save_searched_point(NewSearchedPoint {
            place_name: query.place_name,
            lat: query.lat,
            lon: query.lon,
            hori: reading.hori,
            aqi: reading.aqi,
            temp_c: reading.temp_c,
            reason: reading.reason.as_str().to_string(),
        })
        .await
        .map(Json)
        .map_err(|e| hori_error_to_api_error(e.into()))
}

/// GET /api/searched?limit= - Recently scored points, newest first
pub async fn list_searched(
    State(state): State<AppState>,
    Query(query): Query<SearchedListQuery>,
) -> Result<Json<Vec<SearchedPoint>>, (StatusCode, Json<ApiError>)> {
    state
        .db
        .list_searched_points(query.limit)
        .await
        .map(Json)
        .map_err(|e| hori_error_to_api_error(e.into()))
}

/// GET /api/searched/:id - One stored point
pub async fn get_searched(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SearchedPoint>, (StatusCode, Json<ApiError>)> {
    state
        .db
        .get_searched_point(id)
        .await
        .map(Json)
        .map_err(|e| hori_error_to_api_error(e.into()))
}

/// POST /api/hori/route - Route between points, score it, persist the trip
pub async fn hori_route(
    State(state): State<AppState>,
    Json(req): Json<RouteRequest>,
) -> Result<Json<HoriRouteResponse>, (StatusCode, Json<ApiError>)> {
    let depart =
        resolve_departure(req.depart_iso.as_deref()).map_err(hori_error_to_api_error)?;

    let mut waypoints = Vec::with_capacity(req.stops.len() + 2);
    waypoints.push(req.src);
    waypoints.extend(req.stops.iter().copied());
    waypoints.push(req.dst);

    let route = state
        .osrm
        .fetch_route(&waypoints)
        .await
        .map_err(hori_error_to_api_error)?;

    let (segments, summary) =
        hori::enrich_route(&state.forecast, &route.points, depart, route.duration_min)
            .await
            .map_err(hori_error_to_api_error)?;

    let arrive = arrival_time(depart, route.duration_min);
    let depart_iso = format_utc_secs(depart);
    let arrive_iso = format_utc_secs(arrive);

    state
        .db
        .save_trip(NewTrip {
            src: req.src,
            dst: req.dst,
            src_name: req.src_name,
            dst_name: req.dst_name,
            stop_names: req.stop_names.unwrap_or_default(),
            distance_km: route.distance_km,
            duration_min: route.duration_min,
            depart_iso: depart_iso.clone(),
            arrive_iso: arrive_iso.clone(),
            summary: summary.clone(),
            segments: segments.clone(),
        })
        .await
        .map_err(|e| hori_error_to_api_error(e.into()))?;

    Ok(Json(HoriRouteResponse {
        segments,
        summary,
        distance_km: route.distance_km,
        duration_min: route.duration_min,
        depart_iso,
        arrive_iso,
    }))
}

/// GET /api/trips?limit= - Trip summaries, newest first
pub async fn list_trips(
    State(state): State<AppState>,
    Query(query): Query<TripsListQuery>,
) -> Result<Json<Vec<Trip>>, (StatusCode, Json<ApiError>)> {
    state
        .db
        .list_trips(query.limit)
        .await
        .map(Json)
        .map_err(|e| hori_error_to_api_error(e.into()))
}

/// GET /api/trips/:id - One trip with its ordered segments
pub async fn get_trip(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TripDetail>, (StatusCode, Json<ApiError>)> {
    state
        .db
        .get_trip(id)
        .await
        .map(Json)
        .map_err(|e| hori_error_to_api_error(e.into()))
}

/// Departure instant for a trip: the caller's RFC3339 timestamp when given,
/// otherwise now. A malformed timestamp is the caller's mistake, not ours.
fn resolve_departure(depart_iso: Option<&str>) -> Result<DateTime<Utc>, HoriError> {
    match depart_iso {
        None => Ok(Utc::now()),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| HoriError::invalid_input(format!("bad depart_iso {raw:?}: {e}"))),
    }
}

fn arrival_time(depart: DateTime<Utc>, duration_min: f64) -> DateTime<Utc> {
    depart + Duration::milliseconds((duration_min * 60_000.0).round() as i64)
}

/// Convert HoriError to API error response
fn hori_error_to_api_error(err: HoriError) -> (StatusCode, Json<ApiError>) {
    use crate::database::DatabaseError;

    let (status, message) = match err {
        HoriError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        HoriError::Upstream { service, message } => (
            StatusCode::BAD_GATEWAY,
            format!("{} unavailable: {}", service, message),
        ),
        HoriError::Database(DatabaseError::NotFound(id)) => (
            StatusCode::NOT_FOUND,
            format!("Record with ID {} not found", id),
        ),
        HoriError::Database(DatabaseError::ConnectionError(e)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Database connection error: {}", e),
        ),
    };

    (status, Json(ApiError { message }))
}
