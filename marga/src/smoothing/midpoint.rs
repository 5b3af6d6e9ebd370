//! Weighted midpoint relaxation smoother.
//!
//! Each interior waypoint is pulled towards its raw position (data term) and
//! towards the midpoint of its neighbours (smoothness term) until the total
//! squared update falls below tolerance. Endpoints stay fixed.

use crate::config::SmoothingConfig;
use crate::core::{Point2D, ReferenceLine};
use crate::error::{Error, Result};

/// Weighted midpoint relaxation.
#[derive(Clone, Debug)]
pub struct MidpointSmoother {
    /// Pull towards the raw waypoint
    pub weight_data: f64,
    /// Pull towards the neighbour midpoint
    pub weight_smooth: f64,
    /// Convergence threshold on total squared change per iteration
    pub tolerance: f64,
    /// Iteration cap
    pub max_iterations: usize,
}

impl Default for MidpointSmoother {
    fn default() -> Self {
        Self {
            weight_data: 0.5,
            weight_smooth: 0.1,
            tolerance: 1e-6,
            max_iterations: 200,
        }
    }
}

impl MidpointSmoother {
    /// Build from smoothing configuration.
    pub fn from_config(config: &SmoothingConfig) -> Self {
        Self {
            weight_data: config.weight_data,
            weight_smooth: config.weight_smooth,
            tolerance: config.tolerance,
            max_iterations: config.max_iterations,
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
        if raw_points.iter().any(|p| !p.is_finite()) {
            return Err(Error::Smoothing("non-finite waypoint".to_string()));
        }

        let mut smoothed: Vec<Point2D> = raw_points.to_vec();
        let last = smoothed.len() - 1;

        for iteration in 0..self.max_iterations {
            let mut change = 0.0;

            for i in 1..last {
                let current = smoothed[i];
                let neighbours = smoothed[i - 1] + smoothed[i + 1];
                let data_pull = (raw_points[i] - current) * self.weight_data;
                let smooth_pull = (neighbours - current * 2.0) * self.weight_smooth;
                let updated = current + data_pull + smooth_pull;

                change += updated.distance_squared(&current);
                smoothed[i] = updated;
            }

            if change < self.tolerance {
                log::trace!("Midpoint smoother converged after {} iterations", iteration + 1);
                return Ok(ReferenceLine::from_points(smoothed));
            }
        }

        Err(Error::Smoothing(format!(
            "midpoint smoother did not converge within {} iterations",
            self.max_iterations
        )))
    }
}
