use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A bearing in radians, as returned by `atan2`, in `[-PI, PI]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub fn new_rads(rads: f64) -> Angle {
        Angle(rads)
    }

    pub fn degrees(degs: f64) -> Angle {
        Angle(degs.to_radians())
    }

    /// The bearing of the vector `(dx, dy)`. A zero-length vector has no direction; call it 0
    /// rather than dividing by zero.
    pub fn from_legs(dx: f64, dy: f64) -> Angle {
        if dx == 0.0 && dy == 0.0 {
            return Angle::ZERO;
        }
        Angle(dy.atan2(dx))
    }

    pub fn rotate_degs(self, degrees: f64) -> Angle {
        let mut rads = self.0 + degrees.to_radians();
        if rads > PI {
            rads -= 2.0 * PI;
        } else if rads < -PI {
            rads += 2.0 * PI;
        }
        Angle(rads)
    }

    pub fn opposite(self) -> Angle {
        self.rotate_degs(180.0)
    }

    /// `(cos, sin)` of the bearing. The cardinal directions are exact.
    pub fn unit_vector(self) -> (f64, f64) {
        if self.0 == 0.0 {
            (1.0, 0.0)
        } else if self.0 == FRAC_PI_2 {
            (0.0, 1.0)
        } else if self.0 == PI || self.0 == -PI {
            (-1.0, 0.0)
        } else if self.0 == -FRAC_PI_2 {
            (0.0, -1.0)
        } else {
            (self.0.cos(), self.0.sin())
        }
    }

    pub fn normalized_radians(self) -> f64 {
        if self.0 < 0.0 {
            self.0 + (2.0 * PI)
        } else {
            self.0
        }
    }

    pub fn normalized_degrees(self) -> f64 {
        self.normalized_radians().to_degrees()
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Angle({} degrees)", self.normalized_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_legs() {
        for (dx, dy, expected_degs) in [
            (0.0, 0.0, 0.0),
            (5.0, 0.0, 0.0),
            (0.0, 5.0, 90.0),
            (-5.0, 0.0, 180.0),
            (0.0, -5.0, 270.0),
            (1.0, 1.0, 45.0),
        ] {
            let angle = Angle::from_legs(dx, dy);
            assert!((angle.normalized_degrees() - expected_degs).abs() < 1e-9);
        }
    }

    #[test]
    fn rotation_wraps() {
        let angle = Angle::degrees(170.0).rotate_degs(20.0);
        assert!((angle.normalized_degrees() - 190.0).abs() < 1e-9);
        let (cos, sin) = Angle::ZERO.opposite().unit_vector();
        assert!((cos + 1.0).abs() < 1e-9);
        assert!(sin.abs() < 1e-9);
    }
}
