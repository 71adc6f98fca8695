//! Planar geometry for stream networks and drainage areas. Coordinates are in a projected,
//! foot-based coordinate system; nothing here knows about GPS.

#[macro_use]
extern crate anyhow;

pub use crate::angle::Angle;
pub use crate::bounds::Bounds;
pub use crate::distance::Distance;
pub use crate::line::Line;
pub use crate::polygon::Polygon;
pub use crate::polyline::PolyLine;
pub use crate::pt::{Pt2D, RoundedPt2D};
pub use crate::station::{float_to_station, round_down, stationing_to_float};

mod angle;
mod bounds;
mod distance;
mod line;
mod polygon;
mod polyline;
mod pt;
mod station;

// About 0.001 inches.
pub const EPSILON_DIST: Distance = Distance::const_feet(0.0001);

/// Reduce the precision of an f64. This helps ensure serialization is idempotent (everything is
/// exactly the same before and after saving/loading). Ideally we'd use some kind of proper
/// fixed-precision type instead of f64.
pub fn trim_f64(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Rounds to a number of decimal places, the way coordinates are compared when matching
/// endpoints and confluences.
pub fn round_to(x: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (x * factor).round() / factor
}

/// The length of the hypotenuse of a right triangle with legs `a` and `b`.
pub fn hypot(a: f64, b: f64) -> f64 {
    a.hypot(b)
}

/// The legs `(dx, dy)` from one point to another.
pub fn legs(from: Pt2D, to: Pt2D) -> (f64, f64) {
    (to.x() - from.x(), to.y() - from.y())
}
