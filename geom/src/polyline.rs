use std::fmt;
use std::ops::Range;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{Bounds, Distance, Line, Pt2D, EPSILON_DIST};

/// An ordered sequence of at least 2 points with non-zero total length. Individual segments may
/// have zero length; they have an angle of 0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolyLine {
    pts: Vec<Pt2D>,
    /// The distance along the line to each point. Same length as `pts`; the first entry is 0 and
    /// the last is the total length.
    dists: Vec<Distance>,
}

impl PolyLine {
    pub fn new(pts: Vec<Pt2D>) -> Result<PolyLine> {
        if pts.len() < 2 {
            bail!("Need at least two points for a PolyLine, got {}", pts.len());
        }
        let mut dists = Vec::with_capacity(pts.len());
        let mut so_far = Distance::ZERO;
        dists.push(so_far);
        for pair in pts.windows(2) {
            so_far += pair[0].dist_to(pair[1]);
            dists.push(so_far);
        }
        if so_far <= EPSILON_DIST {
            bail!("PolyLine from {} to {} has no length", pts[0], pts[pts.len() - 1]);
        }
        Ok(PolyLine { pts, dists })
    }

    pub fn must_new(pts: Vec<Pt2D>) -> PolyLine {
        PolyLine::new(pts).unwrap()
    }

    pub fn points(&self) -> &Vec<Pt2D> {
        &self.pts
    }

    pub fn first_pt(&self) -> Pt2D {
        self.pts[0]
    }

    pub fn last_pt(&self) -> Pt2D {
        self.pts[self.pts.len() - 1]
    }

    pub fn length(&self) -> Distance {
        self.dists[self.dists.len() - 1]
    }

    /// The distance along the line to every vertex, parallel to `points()`.
    pub fn vertex_dists(&self) -> &Vec<Distance> {
        &self.dists
    }

    pub fn lines(&self) -> impl Iterator<Item = Line> + '_ {
        self.pts.windows(2).map(|pair| Line::new(pair[0], pair[1]))
    }

    pub fn reversed(&self) -> PolyLine {
        let mut pts = self.pts.clone();
        pts.reverse();
        let total = self.length();
        let mut dists: Vec<Distance> = self.dists.iter().map(|d| total - *d).collect();
        dists.reverse();
        PolyLine { pts, dists }
    }

    /// The point `dist` along the line, clamped to the ends.
    pub fn dist_along(&self, dist: Distance) -> Pt2D {
        if dist <= Distance::ZERO {
            return self.first_pt();
        }
        if dist >= self.length() {
            return self.last_pt();
        }
        // The first vertex strictly past dist ends the segment containing it.
        let idx = self.dists.partition_point(|d| *d <= dist);
        let line = Line::new(self.pts[idx - 1], self.pts[idx]);
        line.dist_along(dist - self.dists[idx - 1])
    }

    /// Projects a point onto the closest position of the line, returning the distance along the
    /// line to that position and how far away the point was.
    pub fn dist_along_of_point(&self, pt: Pt2D) -> (Distance, Distance) {
        let mut best: Option<(Distance, Distance)> = None;
        for (idx, line) in self.lines().enumerate() {
            let along = line.dist_along_of_point(pt);
            let off = line.dist_along(along).dist_to(pt);
            if best.map(|(_, b)| off < b).unwrap_or(true) {
                best = Some((self.dists[idx] + along, off));
            }
        }
        // A PolyLine always has at least one line
        best.unwrap_or((Distance::ZERO, self.first_pt().dist_to(pt)))
    }

    pub fn dist_to_pt(&self, pt: Pt2D) -> Distance {
        self.dist_along_of_point(pt).1
    }

    /// Indices of the vertices whose distance along the line is within `[start, end]`, with
    /// `EPSILON_DIST` of slack on both ends.
    pub fn vertex_range(&self, start: Distance, end: Distance) -> Range<usize> {
        let lo = self
            .dists
            .partition_point(|d| *d + EPSILON_DIST < start);
        let hi = self.dists.partition_point(|d| *d <= end + EPSILON_DIST);
        lo..hi.max(lo)
    }

    /// The piece of the line between two distances, with exact points interpolated at both ends.
    pub fn slice(&self, start: Distance, end: Distance) -> Result<PolyLine> {
        if start >= end || start < Distance::ZERO || end > self.length() + EPSILON_DIST {
            bail!(
                "Can't get a polyline slice [{}, {}] from a line of length {}",
                start,
                end,
                self.length()
            );
        }
        let mut pts = vec![self.dist_along(start)];
        for idx in self.vertex_range(start, end) {
            if !self.pts[idx].approx_eq(*pts.last().unwrap(), EPSILON_DIST) {
                pts.push(self.pts[idx]);
            }
        }
        let last = self.dist_along(end);
        if !last.approx_eq(*pts.last().unwrap(), EPSILON_DIST) {
            pts.push(last);
        }
        PolyLine::new(pts)
    }

    pub fn get_bounds(&self) -> Bounds {
        Bounds::from(&self.pts)
    }

    pub fn to_geo(&self) -> geo::LineString {
        geo::LineString(self.pts.iter().map(|pt| geo::Coordinate::from(*pt)).collect())
    }

    pub fn to_geojson(&self) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::LineString(
            self.pts
                .iter()
                .map(|pt| {
                    let pt = pt.trimmed();
                    vec![pt.x(), pt.y()]
                })
                .collect(),
        ))
    }
}

impl fmt::Display for PolyLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "PolyLine::new(vec![")?;
        for pt in &self.pts {
            writeln!(f, "  Pt2D::new({}, {}),", pt.x(), pt.y())?;
        }
        write!(f, "])")
    }
}
