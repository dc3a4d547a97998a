use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;

use crate::error::HoriError;

/// Defaults substituted when a series is empty or has no usable slot.
/// Availability is deliberately traded for accuracy here: a trip with an
/// approximate score beats a failed request.
pub const DEFAULT_TEMP_C: f64 = 20.0;
pub const DEFAULT_AQI: i32 = 60;

/// Client for the two Open-Meteo services, resolving hourly temperature and
/// US AQI for the slot closest to a target instant. Transport failures
/// propagate; missing data resolves to the defaults above.
#[derive(Clone)]
pub struct ForecastClient {
    http: reqwest::Client,
    weather_base: String,
    air_quality_base: String,
}

impl ForecastClient {
    pub fn new(
        http: reqwest::Client,
        weather_base: impl Into<String>,
        air_quality_base: impl Into<String>,
    ) -> Self {
        Self {
            http,
            weather_base: weather_base.into(),
            air_quality_base: air_quality_base.into(),
        }
    }

    /// Temperature in °C at the hourly slot closest to `at`.
    pub async fn fetch_temperature(
        &self,
        lat: f64,
        lon: f64,
        at: DateTime<Utc>,
    ) -> Result<f64, HoriError> {
        let url = format!(
            "{}/v1/forecast?latitude={lat}&longitude={lon}&hourly=temperature_2m&timezone=UTC",
            self.weather_base
        );
        let body: openmeteo::ForecastResponse = self.get_json("forecast", &url).await?;
        let temp = temperature_from(&body, at);
        tracing::debug!(lat, lon, temp_c = temp, "resolved temperature");
        Ok(temp)
    }

    /// US AQI at the hourly slot closest to `at`.
    pub async fn fetch_air_quality(
        &self,
        lat: f64,
        lon: f64,
        at: DateTime<Utc>,
    ) -> Result<i32, HoriError> {
        let url = format!(
            "{}/v1/air-quality?latitude={lat}&longitude={lon}&hourly=us_aqi,pm2_5&timezone=UTC",
            self.air_quality_base
        );
        let body: openmeteo::ForecastResponse = self.get_json("air quality", &url).await?;
        let aqi = aqi_from(&body, at);
        tracing::debug!(lat, lon, aqi, "resolved air quality");
        Ok(aqi)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: &str,
    ) -> Result<T, HoriError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| HoriError::upstream(service, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HoriError::upstream(service, format!("status {status}")));
        }

        response.json().await.map_err(|e| HoriError::upstream(service, e))
    }
}

fn temperature_from(body: &openmeteo::ForecastResponse, at: DateTime<Utc>) -> f64 {
    let Some(hourly) = &body.hourly else {
        return DEFAULT_TEMP_C;
    };
    nearest_value(&hourly.time, &hourly.temperature_2m, at).unwrap_or(DEFAULT_TEMP_C)
}

fn aqi_from(body: &openmeteo::ForecastResponse, at: DateTime<Utc>) -> i32 {
    let Some(hourly) = &body.hourly else {
        return DEFAULT_AQI;
    };
    nearest_value(&hourly.time, &hourly.us_aqi, at)
        .map(|v| v.round() as i32)
        .unwrap_or(DEFAULT_AQI)
}

/// Value at the series index whose timestamp is closest to `at`. `None`
/// when the series is empty, nothing parses, or the slot itself is null.
fn nearest_value(times: &[String], values: &[Option<f64>], at: DateTime<Utc>) -> Option<f64> {
    let idx = closest_hour_idx(times, at)?;
    values.get(idx).copied().flatten()
}

/// Index of the timestamp with the smallest absolute distance to `target`.
/// Unparseable entries are skipped without shifting the indices of the rest.
fn closest_hour_idx(times: &[String], target: DateTime<Utc>) -> Option<usize> {
    times
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| parse_hour(raw).map(|t| (i, (t - target).num_seconds().abs())))
        .min_by_key(|&(_, distance)| distance)
        .map(|(i, _)| i)
}

/// Open-Meteo hourly timestamps are minute-precision naive UTC
/// (`2024-01-01T13:00`); full RFC3339 is accepted as well.
fn parse_hour(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .ok()
        .map(|t| t.and_utc())
}

/// Open-Meteo response shapes. Both services share the envelope; each
/// hourly block carries `time` plus the series that was requested.
mod openmeteo {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub hourly: Option<HourlySeries>,
    }

    #[derive(Debug, Deserialize)]
    pub struct HourlySeries {
        #[serde(default)]
        pub time: Vec<String>,
        #[serde(default)]
        pub temperature_2m: Vec<Option<f64>>,
        #[serde(default)]
        pub us_aqi: Vec<Option<f64>>,
    }
}
