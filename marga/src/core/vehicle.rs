//! Vehicle state snapshot.

use serde::{Deserialize, Serialize};

use super::point::Point2D;

/// Most recent localization/chassis snapshot supplied by the vehicle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    /// X position in meters
    pub x: f64,
    /// Y position in meters
    pub y: f64,
    /// Heading in radians (CCW from +X)
    pub heading: f64,
    /// Forward velocity in m/s
    pub linear_velocity: f64,
    /// Measurement time in microseconds
    pub timestamp_us: u64,
}

impl VehicleState {
    /// Create a state at the given position, heading and speed.
    pub fn new(x: f64, y: f64, heading: f64, linear_velocity: f64) -> Self {
        Self {
            x,
            y,
            heading,
            linear_velocity,
            timestamp_us: 0,
        }
    }

    /// Set the measurement timestamp.
    pub fn with_timestamp(mut self, timestamp_us: u64) -> Self {
        self.timestamp_us = timestamp_us;
        self
    }

    /// Planar position.
    #[inline]
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}
