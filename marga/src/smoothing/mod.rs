//! Reference line smoothing.
//!
//! This module provides:
//! - `Smoother`: closed set of smoothing strategies chosen at init
//! - `SmoothingPipeline`: build raw path, smooth, validate against the raw path

mod corner_cutting;
mod midpoint;
mod pipeline;

pub use corner_cutting::CornerCuttingSmoother;
pub use midpoint::MidpointSmoother;
pub use pipeline::{DIFF_CHECK_RESOLUTION, SmoothingPipeline, validate_smoothed};

use crate::config::{SmootherKind, SmoothingConfig};
use crate::core::ReferenceLine;
use crate::error::Result;

/// Smoothing strategy.
#[derive(Clone, Debug)]
pub enum Smoother {
    /// Weighted midpoint relaxation
    Midpoint(MidpointSmoother),
    /// Chaikin corner cutting with a deviation bound
    CornerCutting(CornerCuttingSmoother),
}

impl Smoother {
    /// Build the configured strategy.
    pub fn from_config(config: &SmoothingConfig) -> Self {
        match config.strategy {
            SmootherKind::Midpoint => Smoother::Midpoint(MidpointSmoother::from_config(config)),
            SmootherKind::CornerCutting => {
                Smoother::CornerCutting(CornerCuttingSmoother::from_config(config))
            }
        }
    }

    /// Smooth a raw reference line.
    pub fn smooth(&self, raw: &ReferenceLine) -> Result<ReferenceLine> {
        match self {
            Smoother::Midpoint(smoother) => smoother.smooth(raw),
            Smoother::CornerCutting(smoother) => smoother.smooth(raw),
        }
    }

    /// Strategy name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Smoother::Midpoint(_) => "midpoint",
            Smoother::CornerCutting(_) => "corner_cutting",
        }
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Smoother::Midpoint(MidpointSmoother::default())
    }
}
