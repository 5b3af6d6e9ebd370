//! Route segments: candidate slices of lane geometry.

use std::fmt;

use crate::core::{Path, Point2D};
use crate::error::{Error, Result};

/// Stable identity of a route segment across cycles.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(String);

impl SegmentId {
    /// Create an identity from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// String form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Location on a specific lane.
#[derive(Clone, Debug, PartialEq)]
pub struct LaneWaypoint {
    /// Lane identifier
    pub lane_id: String,
    /// Arc length along the lane centerline (meters)
    pub s: f64,
}

/// Projection of a point onto a route segment.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentProjection {
    /// Arc length along the segment (meters)
    pub s: f64,
    /// Signed lateral offset (meters, positive = left)
    pub l: f64,
    /// Matched waypoint on the underlying lane
    pub waypoint: LaneWaypoint,
}

/// Ordered sub-path of the route forming one candidate reference line.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteSegment {
    id: SegmentId,
    lane_id: String,
    /// Arc length on the lane where this segment begins
    start_s: f64,
    waypoints: Vec<Point2D>,
    is_on_segment: bool,
}

impl RouteSegment {
    /// Create a segment.
    ///
    /// `start_s` is the lane arc length of the first waypoint.
    pub fn new(
        id: SegmentId,
        lane_id: impl Into<String>,
        start_s: f64,
        waypoints: Vec<Point2D>,
        is_on_segment: bool,
    ) -> Self {
        Self {
            id,
            lane_id: lane_id.into(),
            start_s,
            waypoints,
            is_on_segment,
        }
    }

    /// Segment identity.
    pub fn id(&self) -> &SegmentId {
        &self.id
    }

    /// Lane this segment was cut from.
    pub fn lane_id(&self) -> &str {
        &self.lane_id
    }

    /// Lane arc length of the first waypoint.
    pub fn start_s(&self) -> f64 {
        self.start_s
    }

    /// Segment geometry.
    pub fn waypoints(&self) -> &[Point2D] {
        &self.waypoints
    }

    /// Whether the vehicle is currently following this segment.
    pub fn is_on_segment(&self) -> bool {
        self.is_on_segment
    }

    /// Project a point onto the segment.
    pub fn project(&self, point: &Point2D) -> Result<SegmentProjection> {
        let path = Path::new(self.waypoints.clone());
        let projection = path.project(point).ok_or_else(|| {
            Error::Projection(format!(
                "segment {} has {} usable waypoints, point ({:.2}, {:.2})",
                self.id,
                path.num_points(),
                point.x,
                point.y
            ))
        })?;

        Ok(SegmentProjection {
            s: projection.s,
            l: projection.l,
            waypoint: LaneWaypoint {
                lane_id: self.lane_id.clone(),
                s: self.start_s + projection.s,
            },
        })
    }
}
