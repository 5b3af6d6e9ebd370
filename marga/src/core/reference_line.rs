//! Reference line handed to the motion planner.

use super::path::Path;
use super::point::Point2D;

/// Smoothed, centerline-following path derived from a route segment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceLine {
    path: Path,
}

impl ReferenceLine {
    /// Wrap a path.
    pub fn new(path: Path) -> Self {
        Self { path }
    }

    /// Build directly from waypoints.
    pub fn from_points(points: Vec<Point2D>) -> Self {
        Self::new(Path::new(points))
    }

    /// Underlying path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Waypoints.
    pub fn points(&self) -> &[Point2D] {
        self.path.points()
    }

    /// Length in meters.
    pub fn length(&self) -> f64 {
        self.path.length()
    }

    /// Reference point at arc length `s`.
    pub fn reference_point(&self, s: f64) -> Option<Point2D> {
        self.path.point_at(s)
    }
}

impl From<Path> for ReferenceLine {
    fn from(path: Path) -> Self {
        Self::new(path)
    }
}
