use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

/// Dominant penalty behind a HORI score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoriCause {
    AirQuality,
    Heat,
    Cold,
    Ok,
}

impl HoriCause {
    pub fn as_str(self) -> &'static str {
        match self {
            HoriCause::AirQuality => "air_quality",
            HoriCause::Heat => "heat",
            HoriCause::Cold => "cold",
            HoriCause::Ok => "ok",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub src: Coordinate,
    pub dst: Coordinate,
    #[serde(default)]
    pub stops: Vec<Coordinate>,
    pub src_name: Option<String>,
    pub dst_name: Option<String>,
    pub stop_names: Option<Vec<String>>,
    /// RFC3339 departure instant; departs "now" when absent.
    pub depart_iso: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoriSegment {
    pub lon: f64,
    pub lat: f64,
    /// Estimated arrival, UTC second precision with `Z` suffix.
    pub ts: String,
    pub temp_c: f64,
    pub aqi: i32,
    pub hori: i32,
    pub reason: HoriCause,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoriSummary {
    pub avg_hori: f64,
    pub worst_hori: i32,
    pub worst_idx: i32,
    pub max_aqi: i32,
    pub avg_temp_c: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoriRouteResponse {
    pub segments: Vec<HoriSegment>,
    pub summary: HoriSummary,
    pub distance_km: f64,
    pub duration_min: f64,
    pub depart_iso: String,
    pub arrive_iso: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoriPoint {
    pub lat: f64,
    pub lon: f64,
    pub temp_c: f64,
    pub aqi: i32,
    pub hori: i32,
    pub reason: HoriCause,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceSuggestion {
    pub place_name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
