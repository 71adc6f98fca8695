use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{trim_f64, Angle, Distance};

/// A point in the projected coordinate system, in feet.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pt2D {
    x: f64,
    y: f64,
}

impl Pt2D {
    pub fn new(x: f64, y: f64) -> Pt2D {
        if !x.is_finite() || !y.is_finite() {
            panic!("Bad Pt2D {}, {}", x, y);
        }

        Pt2D { x, y }
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    pub fn dist_to(self, to: Pt2D) -> Distance {
        Distance::feet(crate::hypot(to.x - self.x, to.y - self.y))
    }

    /// Moves `dist` along the bearing `theta`. The four cardinal bearings move along exactly one
    /// axis, so no trig round-off leaks into the other coordinate.
    pub fn project_away(self, dist: Distance, theta: Angle) -> Pt2D {
        let (cos, sin) = theta.unit_vector();
        let d = dist.inner_feet();
        Pt2D::new(self.x + d * cos, self.y + d * sin)
    }

    /// The bearing from this point to another. Zero-length means an angle of 0.
    pub fn angle_to(self, to: Pt2D) -> Angle {
        Angle::from_legs(to.x - self.x, to.y - self.y)
    }

    pub fn offset(self, dx: f64, dy: f64) -> Pt2D {
        Pt2D::new(self.x + dx, self.y + dy)
    }

    /// Are the two points within `threshold` of each other?
    pub fn approx_eq(self, other: Pt2D, threshold: Distance) -> bool {
        self.dist_to(other) <= threshold
    }

    /// Snaps the coordinates to a fixed number of decimals, producing something usable as a
    /// map key. Two points with the same key are considered coincident.
    pub fn to_rounded(self, decimals: u32) -> RoundedPt2D {
        let factor = 10_f64.powi(decimals as i32);
        RoundedPt2D {
            x: (self.x * factor).round() as i64,
            y: (self.y * factor).round() as i64,
            decimals,
        }
    }

    pub fn center(pts: &[Pt2D]) -> Pt2D {
        if pts.is_empty() {
            panic!("Can't find center of 0 points");
        }
        let mut x = 0.0;
        let mut y = 0.0;
        for pt in pts {
            x += pt.x;
            y += pt.y;
        }
        let len = pts.len() as f64;
        Pt2D::new(x / len, y / len)
    }

    /// Trims precision, for output.
    pub fn trimmed(self) -> Pt2D {
        Pt2D::new(trim_f64(self.x), trim_f64(self.y))
    }
}

impl fmt::Display for Pt2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pt2D({0}, {1})", self.x, self.y)
    }
}

impl From<Pt2D> for geo::Coordinate {
    fn from(pt: Pt2D) -> Self {
        geo::Coordinate { x: pt.x, y: pt.y }
    }
}

impl From<Pt2D> for geo::Point {
    fn from(pt: Pt2D) -> Self {
        geo::Point::new(pt.x, pt.y)
    }
}

impl From<geo::Coordinate> for Pt2D {
    fn from(coord: geo::Coordinate) -> Self {
        Pt2D::new(coord.x, coord.y)
    }
}

/// A point whose (x, y) pair has been rounded to some number of decimals. Both coordinates are
/// compared together, never independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoundedPt2D {
    x: i64,
    y: i64,
    decimals: u32,
}

impl RoundedPt2D {
    pub fn to_pt2d(self) -> Pt2D {
        let factor = 10_f64.powi(self.decimals as i32);
        Pt2D::new((self.x as f64) / factor, (self.y as f64) / factor)
    }
}
