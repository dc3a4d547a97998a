use shared::PlaceSuggestion;

use crate::error::HoriError;

/// Nominatim caps anonymous usage hard; eight suggestions is plenty for a
/// search-as-you-type box.
const RESULT_LIMIT: u32 = 8;

/// Client for Nominatim free-text place search.
#[derive(Clone)]
pub struct GeocodeClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeocodeClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Place suggestions for a free-text query, best matches first.
    pub async fn search(&self, query: &str) -> Result<Vec<PlaceSuggestion>, HoriError> {
        let limit = RESULT_LIMIT.to_string();
        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("addressdetails", "1"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| HoriError::upstream("geocoding", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HoriError::upstream("geocoding", format!("status {status}")));
        }

        let places: Vec<nominatim::Place> = response
            .json()
            .await
            .map_err(|e| HoriError::upstream("geocoding", e))?;

        let suggestions = places
            .into_iter()
            .map(suggestion_from)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(query, matches = suggestions.len(), "geocoded place query");
        Ok(suggestions)
    }
}

fn suggestion_from(place: nominatim::Place) -> Result<PlaceSuggestion, HoriError> {
    Ok(PlaceSuggestion {
        place_name: place.display_name.unwrap_or_default(),
        lat: parse_coord("lat", &place.lat)?,
        lon: parse_coord("lon", &place.lon)?,
    })
}

/// Nominatim serializes coordinates as strings.
fn parse_coord(field: &str, raw: &str) -> Result<f64, HoriError> {
    raw.parse()
        .map_err(|_| HoriError::upstream("geocoding", format!("unparseable {field}: {raw:?}")))
}

mod nominatim {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct Place {
        pub display_name: Option<String>,
        pub lat: String,
        pub lon: String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_parses_string_coordinates() {
        let place: nominatim::Place = serde_json::from_value(serde_json::json!({
            "place_id": 88_422_511,
            "display_name": "Paris, Île-de-France, France",
            "lat": "48.8588897",
            "lon": "2.3200410",
            "boundingbox": ["48.8155755", "48.9021560", "2.2241220", "2.4697602"]
        }))
        .unwrap();

        let suggestion = suggestion_from(place).unwrap();
        assert_eq!(suggestion.place_name, "Paris, Île-de-France, France");
        assert_eq!(suggestion.lat, 48.8588897);
        assert_eq!(suggestion.lon, 2.3200410);
    }

    #[test]
    fn test_suggestion_rejects_malformed_coordinate() {
        let place = nominatim::Place {
            display_name: Some("Nowhere".into()),
            lat: "not-a-number".into(),
            lon: "2.0".into(),
        };

        let err = suggestion_from(place).unwrap_err();
        assert!(matches!(err, HoriError::Upstream { service: "geocoding", .. }));
    }

    #[test]
    fn test_suggestion_tolerates_missing_display_name() {
        let place = nominatim::Place {
            display_name: None,
            lat: "1.5".into(),
            lon: "2.5".into(),
        };

        let suggestion = suggestion_from(place).unwrap();
        assert_eq!(suggestion.place_name, "");
    }

    #[test]
    fn test_result_order_is_preserved() {
        let places: Vec<nominatim::Place> = serde_json::from_value(serde_json::json!([
            { "display_name": "first", "lat": "1.0", "lon": "1.0" },
            { "display_name": "second", "lat": "2.0", "lon": "2.0" }
        ]))
        .unwrap();

        let suggestions = places
            .into_iter()
            .map(suggestion_from)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(suggestions[0].place_name, "first");
        assert_eq!(suggestions[1].place_name, "second");
    }
}
