use serde::{Deserialize, Serialize};

use crate::{Angle, Distance, Pt2D};

/// A line segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line(Pt2D, Pt2D);

impl Line {
    /// Zero-length lines are allowed; their angle is 0.
    pub fn new(pt1: Pt2D, pt2: Pt2D) -> Line {
        Line(pt1, pt2)
    }

    pub fn pt1(&self) -> Pt2D {
        self.0
    }

    pub fn pt2(&self) -> Pt2D {
        self.1
    }

    pub fn length(&self) -> Distance {
        self.pt1().dist_to(self.pt2())
    }

    pub fn angle(&self) -> Angle {
        self.pt1().angle_to(self.pt2())
    }

    pub fn reversed(&self) -> Line {
        Line(self.pt2(), self.pt1())
    }

    /// Walks `dist` from `pt1` along the line's bearing. Doesn't clamp to the length.
    pub fn unbounded_dist_along(&self, dist: Distance) -> Pt2D {
        self.pt1().project_away(dist, self.angle())
    }

    /// The point `dist` from `pt1`, clamped to the segment.
    pub fn dist_along(&self, dist: Distance) -> Pt2D {
        if dist <= Distance::ZERO {
            return self.pt1();
        }
        if dist >= self.length() {
            return self.pt2();
        }
        self.unbounded_dist_along(dist)
    }

    /// The distance from `pt1` to the point on this segment closest to `pt`.
    pub fn dist_along_of_point(&self, pt: Pt2D) -> Distance {
        let dx = self.pt2().x() - self.pt1().x();
        let dy = self.pt2().y() - self.pt1().y();
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0.0 {
            return Distance::ZERO;
        }
        let t = ((pt.x() - self.pt1().x()) * dx + (pt.y() - self.pt1().y()) * dy) / len_sq;
        self.length() * t.clamp(0.0, 1.0)
    }

    /// The point on this segment closest to `pt`.
    pub fn closest_pt(&self, pt: Pt2D) -> Pt2D {
        self.dist_along(self.dist_along_of_point(pt))
    }

    pub fn dist_to_pt(&self, pt: Pt2D) -> Distance {
        self.closest_pt(pt).dist_to(pt)
    }

    /// The line through the middle of this one, perpendicular to it, with the given total length.
    pub fn perpendicular_at(&self, center: Pt2D, length: Distance) -> Line {
        let theta = self.angle().rotate_degs(90.0);
        let half = length / 2.0;
        Line::new(
            center.project_away(half, theta),
            center.project_away(half, theta.opposite()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_onto_segment() {
        let l = Line::new(Pt2D::new(0.0, 0.0), Pt2D::new(100.0, 0.0));
        for (pt, expected) in [
            (Pt2D::new(30.0, 10.0), 30.0),
            (Pt2D::new(-30.0, 10.0), 0.0),
            (Pt2D::new(130.0, -5.0), 100.0),
            (Pt2D::new(100.0, 0.0), 100.0),
        ] {
            assert_eq!(l.dist_along_of_point(pt), Distance::feet(expected));
        }
        assert_eq!(l.dist_to_pt(Pt2D::new(30.0, 10.0)), Distance::feet(10.0));
    }

    #[test]
    fn zero_length() {
        let pt = Pt2D::new(5.0, 5.0);
        let l = Line::new(pt, pt);
        assert_eq!(l.length(), Distance::ZERO);
        assert_eq!(l.angle(), Angle::ZERO);
        assert_eq!(l.dist_along_of_point(Pt2D::new(9.0, 9.0)), Distance::ZERO);
    }

    #[test]
    fn perpendicular() {
        let l = Line::new(Pt2D::new(0.0, 0.0), Pt2D::new(0.0, 100.0));
        let perp = l.perpendicular_at(Pt2D::new(0.0, 50.0), Distance::feet(20.0));
        assert!(perp
            .pt1()
            .approx_eq(Pt2D::new(-10.0, 50.0), crate::EPSILON_DIST));
        assert!(perp
            .pt2()
            .approx_eq(Pt2D::new(10.0, 50.0), crate::EPSILON_DIST));
    }
}
