//! One reference line generation cycle.
//!
//! ```text
//!  RouteContext (locked)            outside the lock
//! ┌──────────────────────────┐    ┌─────────────────────────────┐
//! │ vehicle state            │    │ for each accepted segment:  │
//! │ route map → segments     │ ─► │   build raw path            │
//! │ prioritize lane change   │    │   smooth + validate         │
//! │ lane-change eligibility  │    │   keep or skip              │
//! └──────────────────────────┘    └─────────────────────────────┘
//! ```

use parking_lot::Mutex;

use crate::config::{LaneChangeConfig, LookAheadConfig, MargaConfig};
use crate::core::VehicleState;
use crate::error::{Error, Result};
use crate::map::{RouteMap, RouteSegment, RoutingResult};
use crate::smoothing::SmoothingPipeline;

use super::lane_change::LaneChangeTracker;
use super::snapshot::ReferenceLineEntry;

/// State shared between update handlers and the generation cycle.
///
/// Everything here sits behind one mutex: the route map, the latest vehicle
/// state, the routing-ready flag, and lane-change evidence.
pub struct RouteContext<M> {
    route_map: Option<M>,
    tracker: LaneChangeTracker,
    vehicle_state: VehicleState,
    has_routing: bool,
}

impl<M: RouteMap> RouteContext<M> {
    /// Empty context without a route map.
    pub fn new(config: LaneChangeConfig) -> Self {
        Self {
            route_map: None,
            tracker: LaneChangeTracker::new(config),
            vehicle_state: VehicleState::default(),
            has_routing: false,
        }
    }

    /// Install a fresh route map and forget all lane-change evidence.
    pub fn install(&mut self, route_map: M) {
        self.route_map = Some(route_map);
        self.tracker.clear();
        self.has_routing = false;
    }

    /// Forward a routing result to the route map.
    ///
    /// A different route clears lane-change evidence; a refresh of the same
    /// route keeps it.
    pub fn update_routing(&mut self, routing: &RoutingResult) -> Result<()> {
        let route_map = self.route_map.as_mut().ok_or(Error::NotInitialized)?;
        if let Err(e) = route_map.update_routing(routing) {
            log::error!("Failed to update routing in route map: {}", e);
            return Err(e);
        }

        if !route_map.is_same_route() {
            if !self.tracker.is_empty() {
                log::info!(
                    "Route changed, dropping lane-change history for {} segments",
                    self.tracker.len()
                );
            }
            self.tracker.clear();
        }
        self.has_routing = true;
        Ok(())
    }

    /// Replace the stored vehicle state.
    pub fn update_vehicle_state(&mut self, state: VehicleState) {
        self.vehicle_state = state;
    }

    /// Latest vehicle state.
    pub fn vehicle_state(&self) -> &VehicleState {
        &self.vehicle_state
    }

    /// Whether a routing result has been accepted.
    pub fn has_routing(&self) -> bool {
        self.has_routing
    }

    /// Lane-change tracker.
    pub fn tracker(&self) -> &LaneChangeTracker {
        &self.tracker
    }
}

/// Move the first segment the vehicle is not on to the front.
///
/// Only the first alternative moves; the rest keep their order.
pub fn prioritize_lane_change(segments: &mut [RouteSegment]) {
    if let Some(index) = segments.iter().position(|s| !s.is_on_segment()) {
        segments[..=index].rotate_right(1);
    }
}

/// Produces the reference lines for one cycle.
#[derive(Clone, Debug)]
pub struct ReferenceLineGenerator {
    look_ahead: LookAheadConfig,
    prioritize_lane_change: bool,
    pipeline: SmoothingPipeline,
}

impl ReferenceLineGenerator {
    /// Create a generator.
    pub fn new(
        look_ahead: LookAheadConfig,
        prioritize_lane_change: bool,
        pipeline: SmoothingPipeline,
    ) -> Self {
        Self {
            look_ahead,
            prioritize_lane_change,
            pipeline,
        }
    }

    /// Build from configuration.
    pub fn from_config(config: &MargaConfig) -> Self {
        Self::new(
            config.look_ahead.clone(),
            config.lane_change.prioritize,
            SmoothingPipeline::from_config(&config.smoothing),
        )
    }

    /// Smoothing pipeline.
    pub fn pipeline(&self) -> &SmoothingPipeline {
        &self.pipeline
    }

    /// Run one cycle.
    ///
    /// The context lock is held only while segments are extracted and
    /// eligibility is decided; smoothing runs after it is released.
    pub fn generate<M: RouteMap>(
        &self,
        context: &Mutex<RouteContext<M>>,
    ) -> Result<Vec<ReferenceLineEntry>> {
        let (segments, lane_change_allowed) = {
            let mut guard = context.lock();
            let ctx = &mut *guard;

            let state = ctx.vehicle_state;
            let look_forward = self.look_ahead.look_forward(state.linear_velocity);
            let route_map = ctx.route_map.as_ref().ok_or(Error::NotInitialized)?;

            let mut segments = match route_map.route_segments(
                &state,
                self.look_ahead.look_backward_distance,
                look_forward,
            ) {
                Ok(segments) => segments,
                Err(e) => {
                    log::error!("Failed to extract segments from routing: {}", e);
                    return Err(e);
                }
            };

            if self.prioritize_lane_change {
                prioritize_lane_change(&mut segments);
            }
            let allowed = ctx
                .tracker
                .is_lane_change_allowed(&state.position(), &segments);
            (segments, allowed)
        };

        let candidates = segments.len();
        let mut entries = Vec::with_capacity(candidates);
        for segment in segments {
            if !lane_change_allowed && !segment.is_on_segment() {
                continue;
            }
            match self.pipeline.smooth_segment::<M>(&segment) {
                Ok(line) => entries.push(ReferenceLineEntry { line, segment }),
                Err(e) => log::error!(
                    "Failed to smooth reference line for segment {}: {}",
                    segment.id(),
                    e
                ),
            }
        }

        if entries.is_empty() {
            log::error!("No smooth reference lines available");
            return Err(Error::EmptyResult);
        }

        log::debug!(
            "Generated {}/{} reference lines (lane change allowed: {})",
            entries.len(),
            candidates,
            lane_change_allowed
        );
        Ok(entries)
    }
}
