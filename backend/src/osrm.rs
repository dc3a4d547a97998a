use geo_types::LineString;
use shared::Coordinate;

use crate::error::HoriError;

/// Driving route resolved by OSRM: the decoded track plus headline figures.
#[derive(Debug, Clone, PartialEq)]
pub struct OsrmRoute {
    pub points: Vec<Coordinate>,
    pub distance_km: f64,
    pub duration_min: f64,
}

/// Client for the OSRM `/route/v1/driving` service.
#[derive(Clone)]
pub struct OsrmClient {
    http: reqwest::Client,
    base_url: String,
}

impl OsrmClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Driving route through `waypoints` in order, full-resolution geometry.
    /// When OSRM offers alternatives the first one wins.
    pub async fn fetch_route(&self, waypoints: &[Coordinate]) -> Result<OsrmRoute, HoriError> {
        if waypoints.len() < 2 {
            return Err(HoriError::invalid_input(
                "a route needs at least two waypoints",
            ));
        }

        let url = format!(
            "{}/route/v1/driving/{}?overview=full&geometries=polyline6&steps=false",
            self.base_url,
            waypoint_path(waypoints)
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| HoriError::upstream("routing", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HoriError::upstream("routing", format!("status {status}")));
        }

        let body: osrm::RouteResponse = response
            .json()
            .await
            .map_err(|e| HoriError::upstream("routing", e))?;
        let route = parse_route(body)?;
        tracing::debug!(
            points = route.points.len(),
            distance_km = route.distance_km,
            duration_min = route.duration_min,
            "resolved driving route"
        );
        Ok(route)
    }
}

/// OSRM wants `lon,lat` pairs joined with semicolons.
fn waypoint_path(waypoints: &[Coordinate]) -> String {
    waypoints
        .iter()
        .map(|c| format!("{},{}", c.lon, c.lat))
        .collect::<Vec<_>>()
        .join(";")
}

fn parse_route(body: osrm::RouteResponse) -> Result<OsrmRoute, HoriError> {
    if body.code != "Ok" {
        return Err(HoriError::upstream(
            "routing",
            format!("response code {}", body.code),
        ));
    }
    let route = body
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| HoriError::upstream("routing", "no route between those points"))?;

    Ok(OsrmRoute {
        points: decode_track(&route.geometry)?,
        distance_km: route.distance / 1000.0,
        duration_min: route.duration / 60.0,
    })
}

/// Decodes a polyline6 geometry into lon/lat coordinates.
fn decode_track(geometry: &str) -> Result<Vec<Coordinate>, HoriError> {
    let line: LineString<f64> = polyline::decode_polyline(geometry, 6)
        .map_err(|e| HoriError::upstream("routing", format!("bad geometry: {e}")))?;
    Ok(line
        .0
        .into_iter()
        .map(|c| Coordinate { lon: c.x, lat: c.y })
        .collect())
}

/// OSRM response envelope, trimmed to the fields the pipeline reads.
mod osrm {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct RouteResponse {
        #[serde(default)]
        pub code: String,
        #[serde(default)]
        pub routes: Vec<Route>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Route {
        pub geometry: String,
        /// Metres.
        pub distance: f64,
        /// Seconds.
        pub duration: f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::coord;

    fn encoded_track() -> (String, Vec<Coordinate>) {
        let coords = vec![
            coord! { x: 2.3522, y: 48.8566 },
            coord! { x: 2.3600, y: 48.8700 },
            coord! { x: 2.3700, y: 48.8900 },
        ];
        let encoded = polyline::encode_coordinates(coords.clone(), 6).unwrap();
        let expected = coords
            .into_iter()
            .map(|c| Coordinate { lon: c.x, lat: c.y })
            .collect();
        (encoded, expected)
    }

    #[test]
    fn test_decode_track_round_trips_lon_lat() {
        let (encoded, expected) = encoded_track();
        let decoded = decode_track(&encoded).unwrap();

        assert_eq!(decoded.len(), expected.len());
        for (got, want) in decoded.iter().zip(&expected) {
            assert!((got.lon - want.lon).abs() < 1e-5);
            assert!((got.lat - want.lat).abs() < 1e-5);
        }
    }

    #[test]
    fn test_waypoint_path_is_lon_lat_semicolon_separated() {
        let path = waypoint_path(&[
            Coordinate { lon: 2.35, lat: 48.85 },
            Coordinate { lon: -0.58, lat: 44.84 },
        ]);
        assert_eq!(path, "2.35,48.85;-0.58,44.84");
    }

    #[test]
    fn test_parse_route_converts_units() {
        let (encoded, expected) = encoded_track();
        let body: osrm::RouteResponse = serde_json::from_value(serde_json::json!({
            "code": "Ok",
            "routes": [
                { "geometry": encoded, "distance": 2500.0, "duration": 600.0 }
            ]
        }))
        .unwrap();

        let route = parse_route(body).unwrap();
        assert_eq!(route.distance_km, 2.5);
        assert_eq!(route.duration_min, 10.0);
        assert_eq!(route.points.len(), expected.len());
    }

    #[test]
    fn test_parse_route_takes_first_alternative() {
        let (encoded, _) = encoded_track();
        let body: osrm::RouteResponse = serde_json::from_value(serde_json::json!({
            "code": "Ok",
            "routes": [
                { "geometry": encoded, "distance": 1000.0, "duration": 60.0 },
                { "geometry": encoded, "distance": 9000.0, "duration": 540.0 }
            ]
        }))
        .unwrap();

        let route = parse_route(body).unwrap();
        assert_eq!(route.distance_km, 1.0);
    }

    #[test]
    fn test_parse_route_rejects_error_code() {
        let body: osrm::RouteResponse = serde_json::from_value(serde_json::json!({
            "code": "NoRoute",
            "routes": []
        }))
        .unwrap();

        let err = parse_route(body).unwrap_err();
        assert!(matches!(err, HoriError::Upstream { service: "routing", .. }));
    }

    #[test]
    fn test_parse_route_rejects_empty_routes() {
        let body: osrm::RouteResponse =
            serde_json::from_value(serde_json::json!({ "code": "Ok", "routes": [] })).unwrap();

        let err = parse_route(body).unwrap_err();
        assert!(matches!(err, HoriError::Upstream { service: "routing", .. }));
    }

    #[tokio::test]
    async fn test_fetch_route_requires_two_waypoints() {
        let client = OsrmClient::new(reqwest::Client::new(), "http://unused.invalid");
        let err = client
            .fetch_route(&[Coordinate { lon: 0.0, lat: 0.0 }])
            .await
            .unwrap_err();

        assert!(matches!(err, HoriError::InvalidInput(_)));
    }
}
