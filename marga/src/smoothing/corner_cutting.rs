//! Chaikin corner-cutting smoother with a deviation bound.

use crate::config::SmoothingConfig;
use crate::core::{Point2D, ReferenceLine};
use crate::error::{Error, Result};

/// Chaikin corner cutting. Endpoints are kept; every output point must stay
/// within `max_deviation` of the raw line.
#[derive(Clone, Debug)]
pub struct CornerCuttingSmoother {
    /// Number of refinement rounds
    pub rounds: usize,
    /// Maximum lateral distance from the raw line (meters)
    pub max_deviation: f64,
}

impl Default for CornerCuttingSmoother {
    fn default() -> Self {
        Self {
            rounds: 3,
            max_deviation: 0.1,
        }
    }
}

impl CornerCuttingSmoother {
    /// Build from smoothing configuration.
    pub fn from_config(config: &SmoothingConfig) -> Self {
        Self {
            rounds: config.corner_cutting_rounds,
            max_deviation: config.max_deviation,
        }
    }

    /// Smooth a raw reference line.
    pub fn smooth(&self, raw: &ReferenceLine) -> Result<ReferenceLine> {
        let raw_points = raw.points();
        if raw_points.len() < 2 {
            return Err(Error::Smoothing(format!(
                "need at least 2 points, got {}",
                raw_points.len()
            )));
        }

        let mut points = raw_points.to_vec();
        for _ in 0..self.rounds {
            points = Self::cut_corners(&points);
        }

        for point in &points {
            let deviation = raw
                .path()
                .project(point)
                .map(|p| p.l.abs())
                .ok_or_else(|| Error::Smoothing("cannot project smoothed point".to_string()))?;
            if deviation > self.max_deviation {
                return Err(Error::Smoothing(format!(
                    "deviation {:.3}m exceeds bound {:.3}m",
                    deviation, self.max_deviation
                )));
            }
        }

        Ok(ReferenceLine::from_points(points))
    }

    fn cut_corners(points: &[Point2D]) -> Vec<Point2D> {
        let mut refined = Vec::with_capacity(points.len() * 2);
        refined.push(points[0]);
        for pair in points.windows(2) {
            refined.push(pair[0].lerp(&pair[1], 0.25));
            refined.push(pair[0].lerp(&pair[1], 0.75));
        }
        refined.extend(points.last().copied());
        refined
    }
}
