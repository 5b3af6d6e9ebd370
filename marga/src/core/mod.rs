//! Core types: planar geometry, vehicle state, reference lines.

mod path;
mod point;
mod reference_line;
mod vehicle;

pub use path::{Path, PathProjection};
pub use point::Point2D;
pub use reference_line::ReferenceLine;
pub use vehicle::VehicleState;
