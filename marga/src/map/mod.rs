//! Route map interface and routing messages.
//!
//! The provider never touches lane geometry directly. It goes through the
//! [`RouteMap`] trait:
//! - accept a routing result and report whether it is the same route as before
//! - cut candidate route segments around the vehicle
//! - build a raw path from a segment
//!
//! [`LaneMap`] is an in-memory implementation over parallel lane centerlines.

mod lane_map;
mod segment;

pub use lane_map::LaneMap;
pub use segment::{LaneWaypoint, RouteSegment, SegmentId, SegmentProjection};

use serde::{Deserialize, Serialize};

use crate::core::{Path, Point2D, VehicleState};
use crate::error::Result;

/// One lane of a routing result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutingLane {
    /// Lane identifier
    pub id: String,
    /// Lane centerline in travel order
    pub centerline: Vec<Point2D>,
}

impl RoutingLane {
    /// Create a lane.
    pub fn new(id: impl Into<String>, centerline: Vec<Point2D>) -> Self {
        Self {
            id: id.into(),
            centerline,
        }
    }
}

/// Planned route as produced by the routing module.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingResult {
    /// Message sequence number; a refresh of the same route bumps only this
    pub sequence: u64,
    /// Lanes making up the route
    pub lanes: Vec<RoutingLane>,
}

impl RoutingResult {
    /// Create a routing result.
    pub fn new(sequence: u64, lanes: Vec<RoutingLane>) -> Self {
        Self { sequence, lanes }
    }

    /// Ordered lane ids.
    pub fn lane_ids(&self) -> Vec<&str> {
        self.lanes.iter().map(|lane| lane.id.as_str()).collect()
    }
}

/// Route map service consumed by the reference line provider.
///
/// Implementations need not be `Sync`: the provider serializes every call.
pub trait RouteMap: Send {
    /// Replace the current routing result.
    fn update_routing(&mut self, routing: &RoutingResult) -> Result<()>;

    /// Whether the last accepted routing is the same route as the one before it.
    fn is_same_route(&self) -> bool;

    /// Candidate segments around the vehicle, in route order.
    fn route_segments(
        &self,
        state: &VehicleState,
        look_backward: f64,
        look_forward: f64,
    ) -> Result<Vec<RouteSegment>>;

    /// Raw path for a segment. Needs no map state, so it runs outside the map lock.
    fn build_path(segment: &RouteSegment) -> Path
    where
        Self: Sized;
}
