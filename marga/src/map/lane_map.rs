//! In-memory route map over parallel lane centerlines.
//!
//! Every lane of the routing result becomes one candidate segment per cycle,
//! cut to the look-back/look-forward window around the vehicle's projection.
//! The lane closest to the vehicle (within half a lane width) is the one the
//! vehicle is currently following.

use crate::config::MapConfig;
use crate::core::{Path, VehicleState};
use crate::error::{Error, Result};

use super::segment::{RouteSegment, SegmentId};
use super::{RouteMap, RoutingResult};

/// Default half lane width (meters).
pub const DEFAULT_LANE_HALF_WIDTH: f64 = 1.75;

#[derive(Clone, Debug)]
struct MapLane {
    id: String,
    centerline: Path,
}

/// Lane-based [`RouteMap`] implementation.
#[derive(Clone, Debug)]
pub struct LaneMap {
    lane_half_width: f64,
    lanes: Vec<MapLane>,
    same_route: bool,
}

impl LaneMap {
    /// Create an empty map with the given half lane width.
    pub fn new(lane_half_width: f64) -> Self {
        Self {
            lane_half_width,
            lanes: Vec::new(),
            same_route: false,
        }
    }

    /// Create an empty map from configuration.
    pub fn from_config(config: &MapConfig) -> Self {
        Self::new(config.lane_half_width)
    }

    /// Number of lanes in the current routing.
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Whether a routing result has been accepted.
    pub fn has_routing(&self) -> bool {
        !self.lanes.is_empty()
    }
}

impl Default for LaneMap {
    fn default() -> Self {
        Self::new(DEFAULT_LANE_HALF_WIDTH)
    }
}

impl RouteMap for LaneMap {
    fn update_routing(&mut self, routing: &RoutingResult) -> Result<()> {
        if routing.lanes.is_empty() {
            return Err(Error::Adapter("routing has no lanes".to_string()));
        }

        let mut lanes = Vec::with_capacity(routing.lanes.len());
        for lane in &routing.lanes {
            if let Some(point) = lane.centerline.iter().find(|p| !p.is_finite()) {
                return Err(Error::Adapter(format!(
                    "lane {} has a non-finite point ({}, {})",
                    lane.id, point.x, point.y
                )));
            }
            let centerline = Path::new(lane.centerline.clone());
            if centerline.num_points() < 2 {
                return Err(Error::Adapter(format!(
                    "lane {} has fewer than two distinct points",
                    lane.id
                )));
            }
            lanes.push(MapLane {
                id: lane.id.clone(),
                centerline,
            });
        }

        self.same_route = !self.lanes.is_empty()
            && self
                .lanes
                .iter()
                .map(|lane| lane.id.as_str())
                .eq(routing.lanes.iter().map(|lane| lane.id.as_str()));
        self.lanes = lanes;

        log::debug!(
            "LaneMap: routing #{} accepted with {} lanes (same route: {})",
            routing.sequence,
            self.lanes.len(),
            self.same_route
        );
        Ok(())
    }

    fn is_same_route(&self) -> bool {
        self.same_route
    }

    fn route_segments(
        &self,
        state: &VehicleState,
        look_backward: f64,
        look_forward: f64,
    ) -> Result<Vec<RouteSegment>> {
        if self.lanes.is_empty() {
            return Err(Error::Adapter("no routing loaded".to_string()));
        }

        let position = state.position();
        let projected: Vec<_> = self
            .lanes
            .iter()
            .filter_map(|lane| lane.centerline.project(&position).map(|p| (lane, p)))
            .collect();

        let on_segment = projected
            .iter()
            .enumerate()
            .filter(|(_, (_, p))| p.l.abs() <= self.lane_half_width)
            .min_by(|(_, (_, a)), (_, (_, b))| a.l.abs().total_cmp(&b.l.abs()))
            .map(|(i, _)| i);

        let mut segments = Vec::with_capacity(projected.len());
        for (i, (lane, projection)) in projected.iter().enumerate() {
            let start_s = (projection.s - look_backward).max(0.0);
            let end_s = (projection.s + look_forward).min(lane.centerline.length());
            let window = lane.centerline.slice(start_s, end_s);
            if window.num_points() < 2 {
                continue;
            }

            segments.push(RouteSegment::new(
                SegmentId::new(lane.id.clone()),
                lane.id.clone(),
                start_s,
                window.points().to_vec(),
                on_segment == Some(i),
            ));
        }

        if segments.is_empty() {
            return Err(Error::Adapter(format!(
                "no lane segment around ({:.2}, {:.2})",
                position.x, position.y
            )));
        }

        Ok(segments)
    }

    fn build_path(segment: &RouteSegment) -> Path {
        Path::new(segment.waypoints().to_vec())
    }
}
