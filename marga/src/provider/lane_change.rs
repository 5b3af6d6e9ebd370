//! Lane-change eligibility with positional hysteresis.
//!
//! Lane-change segments are only offered once the vehicle has settled on its
//! current lane: it must have come close to the lane center at some point and
//! traveled a minimum distance while tracking that lane. Evidence is kept per
//! segment identity and survives across cycles until the route changes.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::config::LaneChangeConfig;
use crate::core::Point2D;
use crate::map::{RouteSegment, SegmentId};

/// Accumulated evidence for one forward segment.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentHistory {
    /// Smallest absolute lateral offset observed (running minimum)
    pub min_l: f64,
    /// Vehicle position at the previous observation
    pub last_point: Point2D,
    /// Distance traveled since the segment was first seen
    pub accumulate_s: f64,
}

/// Per-segment lane-change eligibility tracker.
#[derive(Clone, Debug)]
pub struct LaneChangeTracker {
    config: LaneChangeConfig,
    history: HashMap<SegmentId, SegmentHistory>,
}

impl LaneChangeTracker {
    /// Create an empty tracker.
    pub fn new(config: LaneChangeConfig) -> Self {
        Self {
            config,
            history: HashMap::new(),
        }
    }

    /// Decide whether lane-change segments are allowed this cycle.
    ///
    /// Records for the forward segment (first segment the vehicle is on) are
    /// inserted on first lookup; the first observation never allows a lane
    /// change. Projection failure degrades to "not allowed".
    pub fn is_lane_change_allowed(&mut self, point: &Point2D, segments: &[RouteSegment]) -> bool {
        if self.config.reckless {
            log::debug!("Reckless lane change enabled");
            return true;
        }
        if segments.len() <= 1 {
            return false;
        }

        let Some(forward) = segments.iter().find(|s| s.is_on_segment()) else {
            return true;
        };

        let abs_l = match forward.project(point) {
            Ok(projection) => projection.l.abs(),
            Err(e) => {
                log::error!(
                    "Failed to project ({:.2}, {:.2}) to forward segment: {}",
                    point.x,
                    point.y,
                    e
                );
                return false;
            }
        };

        match self.history.entry(forward.id().clone()) {
            Entry::Vacant(entry) => {
                entry.insert(SegmentHistory {
                    min_l: abs_l,
                    last_point: *point,
                    accumulate_s: 0.0,
                });
                false
            }
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                record.min_l = record.min_l.min(abs_l);
                record.accumulate_s += record.last_point.distance(point);
                record.last_point = *point;

                record.min_l < self.config.near_centerline_l
                    && record.accumulate_s
                        >= self.config.min_length_factor * self.config.min_length_for_lane_change
            }
        }
    }

    /// Drop all accumulated evidence.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Evidence for a segment, if tracked.
    pub fn history(&self, id: &SegmentId) -> Option<&SegmentHistory> {
        self.history.get(id)
    }

    /// Number of tracked segments.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// True when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Tracker configuration.
    pub fn config(&self) -> &LaneChangeConfig {
        &self.config
    }
}
