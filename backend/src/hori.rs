use chrono::{DateTime, Duration, SecondsFormat, Utc};
use shared::{Coordinate, HoriCause, HoriSegment, HoriSummary};

use crate::error::HoriError;
use crate::forecast::ForecastClient;
use crate::sampling::{self, SampledPoint};

/// Weather and air-quality conditions resolved for one location and hour,
/// together with the comfort score they produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoriReading {
    pub temp_c: f64,
    pub aqi: i32,
    pub hori: i32,
    pub reason: HoriCause,
}

/// HORI comfort score on a 0..=100 scale. Three penalties pull the score
/// down from 100: air quality at 0.12 per AQI point (capped at 500), heat
/// at 1.2 per °C above 25, cold at 2.0 per °C below 5. The reason is the
/// largest penalty, with earlier entries winning exact ties; a score within
/// one point of perfect reports `Ok`.
pub fn compute_hori(temp_c: f64, aqi: i32) -> (i32, HoriCause) {
    let aqi_penalty = 0.12 * f64::from(aqi.min(500));
    let heat_penalty = (temp_c - 25.0).max(0.0) * 1.2;
    let cold_penalty = (5.0 - temp_c).max(0.0) * 2.0;

    let total = aqi_penalty + heat_penalty + cold_penalty;
    let score = (100.0 - total).clamp(0.0, 100.0).round() as i32;

    let penalties = [
        (HoriCause::AirQuality, aqi_penalty),
        (HoriCause::Heat, heat_penalty),
        (HoriCause::Cold, cold_penalty),
    ];
    let (mut reason, mut worst) = penalties[0];
    for &(cause, penalty) in &penalties[1..] {
        if penalty > worst {
            reason = cause;
            worst = penalty;
        }
    }
    if worst < 1.0 {
        reason = HoriCause::Ok;
    }

    (score, reason)
}

/// Conditions at one location for the hour closest to `at`. Temperature and
/// air quality are fetched concurrently.
pub async fn score_point(
    forecast: &ForecastClient,
    lat: f64,
    lon: f64,
    at: DateTime<Utc>,
) -> Result<HoriReading, HoriError> {
    let (temp_c, aqi) = tokio::try_join!(
        forecast.fetch_temperature(lat, lon, at),
        forecast.fetch_air_quality(lat, lon, at),
    )?;
    let (hori, reason) = compute_hori(temp_c, aqi);
    Ok(HoriReading {
        temp_c,
        aqi,
        hori,
        reason,
    })
}

/// Samples the route, scores its midpoint for the departure hour and stamps
/// every sampled point with that reading plus its own arrival estimate.
///
/// One reading for the whole route keeps this at two upstream calls per
/// request; `stamp_segments` and `summarize` already cope with per-segment
/// readings if that ever changes.
pub async fn enrich_route(
    forecast: &ForecastClient,
    points: &[Coordinate],
    depart: DateTime<Utc>,
    duration_min: f64,
) -> Result<(Vec<HoriSegment>, HoriSummary), HoriError> {
    let sampled = sampling::sample(points)?;
    let mid = sampled[sampled.len() / 2];
    let reading = score_point(forecast, mid.lat, mid.lon, depart).await?;

    let segments = stamp_segments(&sampled, &reading, depart, duration_min);
    let summary = summarize(&segments);
    Ok((segments, summary))
}

/// Builds one segment per sampled point, each stamped with its estimated
/// arrival: departure plus the point's fraction of the total duration.
pub fn stamp_segments(
    sampled: &[SampledPoint],
    reading: &HoriReading,
    depart: DateTime<Utc>,
    duration_min: f64,
) -> Vec<HoriSegment> {
    sampled
        .iter()
        .map(|point| {
            let offset_ms = (point.frac * duration_min * 60_000.0).round() as i64;
            let eta = depart + Duration::milliseconds(offset_ms);
            HoriSegment {
                lon: point.lon,
                lat: point.lat,
                ts: format_utc_secs(eta),
                temp_c: reading.temp_c,
                aqi: reading.aqi,
                hori: reading.hori,
                reason: reading.reason,
            }
        })
        .collect()
}

/// Aggregates per-segment scores into the trip summary. `worst_idx` is the
/// first segment holding the minimum score.
pub fn summarize(segments: &[HoriSegment]) -> HoriSummary {
    if segments.is_empty() {
        return HoriSummary {
            avg_hori: 0.0,
            worst_hori: 0,
            worst_idx: 0,
            max_aqi: 0,
            avg_temp_c: 0.0,
        };
    }

    let count = segments.len() as f64;
    let mut worst_hori = segments[0].hori;
    let mut worst_idx = 0;
    let mut max_aqi = segments[0].aqi;
    let mut hori_sum = 0.0;
    let mut temp_sum = 0.0;

    for (i, segment) in segments.iter().enumerate() {
        if segment.hori < worst_hori {
            worst_hori = segment.hori;
            worst_idx = i;
        }
        max_aqi = max_aqi.max(segment.aqi);
        hori_sum += f64::from(segment.hori);
        temp_sum += segment.temp_c;
    }

    HoriSummary {
        avg_hori: hori_sum / count,
        worst_hori,
        worst_idx: worst_idx as i32,
        max_aqi,
        avg_temp_c: temp_sum / count,
    }
}

/// UTC instant as RFC3339 with a `Z` suffix, sub-second part dropped.
pub fn format_utc_secs(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
