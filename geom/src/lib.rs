//! The geometry kernel: units, points and vectors, simple 2D shapes, the per-segment Hermite
//! cubic used by road and corridor centerlines, and a spatial index.

#[macro_use]
extern crate log;

mod angle;
mod bounds;
mod distance;
mod find_closest;
mod hermite;
mod line;
mod matrix;
mod pt;
mod ring;
mod vector;

pub use crate::angle::Angle;
pub use crate::bounds::Bounds;
pub use crate::distance::Distance;
pub use crate::find_closest::FindClosest;
pub use crate::hermite::{fit_radius, HermiteCubic};
pub use crate::line::Line;
pub use crate::matrix::Mat3;
pub use crate::pt::{Pt2D, Pt3D};
pub use crate::ring::Ring;
pub use crate::vector::Vector3D;

/// Distances shorter than this are treated as zero.
pub const EPSILON_DIST: Distance = Distance::const_meters(0.0001);

/// Reduce the precision of an f64. This helps ensure serialization is idempotent (everything is
/// exactly the same before and after saving/loading). Ideally we'd use some kind of proper
/// fixed-precision type instead of f64.
pub fn trim_f64(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
