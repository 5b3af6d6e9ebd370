//! Reference line provider.
//!
//! This module provides:
//! - `LaneChangeTracker`: per-segment evidence deciding when lane change is offered
//! - `ReferenceLineGenerator`: one cycle from route segments to smoothed lines
//! - `SnapshotCell`: atomic publication of the latest lines
//! - `ReferenceLineProvider`: lifecycle, update handlers and the background worker

mod generator;
mod lane_change;
mod lifecycle;
mod snapshot;

pub use generator::{ReferenceLineGenerator, RouteContext, prioritize_lane_change};
pub use lane_change::{LaneChangeTracker, SegmentHistory};
pub use lifecycle::{ProviderState, ReferenceLineProvider, WORKER_THREAD_NAME};
pub use snapshot::{ReferenceLineEntry, ReferenceLines, SnapshotCell};
