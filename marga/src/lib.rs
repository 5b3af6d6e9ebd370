//! Marga - Reference line provider for route following
//!
//! Turns a planned route and the vehicle's latest state into a set of smoothed
//! reference lines that downstream planners follow. Lane-change alternatives
//! are only offered once the vehicle has settled on its current lane.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                      bin/                           │  ← Demo executable
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   provider/                         │  ← Orchestration
//! │   (lifecycle, worker, lane change, publication)     │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   smoothing/                        │  ← Algorithms
//! │     (midpoint, corner cutting, validation)          │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                      map/                           │  ← Route map interface
//! │          (RouteMap trait, LaneMap, segments)        │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │      (Point2D, Path, VehicleState, ReferenceLine)   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use marga::{LaneMap, MargaConfig, Point2D, ReferenceLineProvider, RoutingLane, RoutingResult};
//!
//! let provider = ReferenceLineProvider::new(MargaConfig::default());
//! provider.init(LaneMap::default())?;
//! provider.start()?;
//!
//! let lane = RoutingLane::new("lane_0", vec![Point2D::new(0.0, 0.0), Point2D::new(100.0, 0.0)]);
//! provider.update_routing(&RoutingResult::new(1, vec![lane]))?;
//!
//! let lines = provider.get_reference_lines()?;
//! println!("{} reference lines", lines.len());
//! provider.stop();
//! # Ok::<(), marga::Error>(())
//! ```

// ============================================================================
// Layer 1: Core foundation (no internal deps)
// ============================================================================
pub mod config;
pub mod core;
pub mod error;

// ============================================================================
// Layer 2: Route map interface (depends on core)
// ============================================================================
pub mod map;

// ============================================================================
// Layer 3: Smoothing (depends on core, map)
// ============================================================================
pub mod smoothing;

// ============================================================================
// Layer 4: Provider (depends on all layers)
// ============================================================================
pub mod provider;

// ============================================================================
// Convenience re-exports
// ============================================================================

pub use config::{
    LaneChangeConfig, LookAheadConfig, MapConfig, MargaConfig, ProviderConfig, SmootherKind,
    SmoothingConfig,
};
pub use crate::core::{Path, PathProjection, Point2D, ReferenceLine, VehicleState};
pub use error::{Error, Result};
pub use map::{
    LaneMap, LaneWaypoint, RouteMap, RouteSegment, RoutingLane, RoutingResult, SegmentId,
    SegmentProjection,
};
pub use provider::{
    LaneChangeTracker, ProviderState, ReferenceLineEntry, ReferenceLineGenerator,
    ReferenceLineProvider, ReferenceLines,
};
pub use smoothing::{CornerCuttingSmoother, MidpointSmoother, Smoother, SmoothingPipeline};
