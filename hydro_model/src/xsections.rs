use serde::Serialize;

use geom::{Distance, Line};

use crate::stationing::Station;

pub const DEFAULT_XS_SPACING: f64 = 300.0;

/// A transverse line across a reach, for sampling terrain.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CrossSection {
    pub reach: String,
    pub station: Distance,
    pub line: Line,
}

/// At every station after the first, a line of `width` centered on the station, perpendicular
/// to the chord from the previous station.
pub fn cross_sections(reach: &str, stations: &[Station], width: Distance) -> Vec<CrossSection> {
    stations
        .windows(2)
        .map(|pair| CrossSection {
            reach: reach.to_string(),
            station: pair[1].dist,
            line: Line::new(pair[0].pt, pair[1].pt).perpendicular_at(pair[1].pt, width),
        })
        .collect()
}

/// Samuels' cross-section spacing, in feet, for a bankfull depth in feet and a bed slope. Never
/// less than `default`.
pub fn samuels_spacing(bankfull_depth: f64, bed_slope: f64, default: f64) -> f64 {
    if bed_slope <= 0.0 || !bed_slope.is_finite() {
        return default;
    }
    (0.07 * bankfull_depth / bed_slope).round().max(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stationing::StationIter;
    use geom::{PolyLine, Pt2D, EPSILON_DIST};

    #[test]
    fn perpendicular_lines() {
        let pl = PolyLine::must_new(vec![Pt2D::new(0.0, 0.0), Pt2D::new(200.0, 0.0)]);
        let stations: Vec<Station> = StationIter::new(&pl, 100.0, 0.0).unwrap().collect();
        let xs = cross_sections("W100-00-00", &stations, Distance::feet(50.0));
        assert_eq!(xs.len(), 2);
        assert_eq!(xs[0].station, Distance::feet(100.0));
        assert!(xs[0].line.pt1().approx_eq(Pt2D::new(100.0, 25.0), EPSILON_DIST));
        assert!(xs[0].line.pt2().approx_eq(Pt2D::new(100.0, -25.0), EPSILON_DIST));
        assert_eq!(xs[1].station, Distance::ZERO);
    }

    #[test]
    fn spacing() {
        for (depth, slope, expected) in [
            (10.0, 0.001, 700.0),
            (2.0, 0.001, DEFAULT_XS_SPACING),
            (10.0, 0.0, DEFAULT_XS_SPACING),
        ] {
            assert_eq!(samuels_spacing(depth, slope, DEFAULT_XS_SPACING), expected);
        }
    }
}
