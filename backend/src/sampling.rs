use shared::Coordinate;

use crate::error::HoriError;

/// Upper bound used to derive the sampling stride. Routes shorter than
/// twice this keep every point.
pub const MAX_SAMPLES: usize = 200;

/// One retained route point, tagged with its relative position along the
/// route: 0 at the origin, 1 at the destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledPoint {
    pub lon: f64,
    pub lat: f64,
    pub frac: f64,
}

/// Reduce a decoded route geometry to a bounded, ordered subsequence.
///
/// Takes every `max(1, n / MAX_SAMPLES)`-th point and re-appends the final
/// input point when the stride dropped it, so the sampled route always ends
/// where the real one does. Fractions are normalized over the sampled count,
/// with a divide-by-zero guard for single-point geometries.
pub fn sample(points: &[Coordinate]) -> Result<Vec<SampledPoint>, HoriError> {
    if points.is_empty() {
        return Err(HoriError::invalid_input("route geometry is empty"));
    }

    let step = (points.len() / MAX_SAMPLES).max(1);
    let mut kept: Vec<Coordinate> = points.iter().copied().step_by(step).collect();

    let last = points[points.len() - 1];
    if kept.last() != Some(&last) {
        kept.push(last);
    }

    let denom = (kept.len() - 1).max(1) as f64;
    Ok(kept
        .into_iter()
        .enumerate()
        .map(|(i, c)| SampledPoint {
            lon: c.lon,
            lat: c.lat,
            frac: i as f64 / denom,
        })
        .collect())
}
