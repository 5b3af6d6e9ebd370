//! Segment smoothing pipeline: raw path → smoothed line → validation.

use crate::config::SmoothingConfig;
use crate::core::ReferenceLine;
use crate::error::{Error, Result};
use crate::map::{RouteMap, RouteSegment};

use super::Smoother;

/// Sampling step and maximum allowed raw/smoothed distance (meters).
pub const DIFF_CHECK_RESOLUTION: f64 = 5.0;

/// Turns route segments into reference lines.
///
/// Holds no shared state; everything it needs is passed in.
#[derive(Clone, Debug)]
pub struct SmoothingPipeline {
    enabled: bool,
    smoother: Smoother,
}

impl SmoothingPipeline {
    /// Create a pipeline. With `enabled == false` the raw path is returned as is.
    pub fn new(enabled: bool, smoother: Smoother) -> Self {
        Self { enabled, smoother }
    }

    /// Build from smoothing configuration.
    pub fn from_config(config: &SmoothingConfig) -> Self {
        Self::new(config.enabled, Smoother::from_config(config))
    }

    /// Whether smoothing is applied.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Configured strategy.
    pub fn smoother(&self) -> &Smoother {
        &self.smoother
    }

    /// Smooth one route segment using the map's path construction.
    pub fn smooth_segment<M: RouteMap>(&self, segment: &RouteSegment) -> Result<ReferenceLine> {
        let raw = ReferenceLine::new(M::build_path(segment));
        self.smooth_line(raw)
    }

    /// Smooth and validate a raw reference line.
    pub fn smooth_line(&self, raw: ReferenceLine) -> Result<ReferenceLine> {
        if !self.enabled {
            return Ok(raw);
        }

        let smoothed = self.smoother.smooth(&raw)?;
        validate_smoothed(&raw, &smoothed)?;
        Ok(smoothed)
    }
}

/// Check that a smoothed line stays close to its raw line.
///
/// Samples both lines every [`DIFF_CHECK_RESOLUTION`] meters from 0 up to
/// (excluding) the raw length and fails on the first sample whose distance
/// exceeds the same resolution.
pub fn validate_smoothed(raw: &ReferenceLine, smoothed: &ReferenceLine) -> Result<()> {
    let mut s = 0.0;
    while s < raw.length() {
        let diff = match (raw.reference_point(s), smoothed.reference_point(s)) {
            (Some(old), Some(new)) => old.distance(&new),
            _ => f64::INFINITY,
        };
        if diff > DIFF_CHECK_RESOLUTION {
            log::error!(
                "Too large diff between smoothed and raw reference lines: {:.3}m at s={:.1}m",
                diff,
                s
            );
            return Err(Error::Validation { s, diff });
        }
        s += DIFF_CHECK_RESOLUTION;
    }
    Ok(())
}
