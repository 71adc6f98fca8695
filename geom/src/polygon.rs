use std::fmt;

use anyhow::Result;
use geo::{Area, BooleanOps, Centroid, Contains, EuclideanDistance, Intersects};

use crate::{Bounds, Distance, PolyLine, Pt2D};

/// A simple polygon, possibly with holes. Backed directly by `geo`; the coordinate system is
/// foot-based, so `area` is in square feet.
#[derive(PartialEq, Clone, Debug)]
pub struct Polygon {
    inner: geo::Polygon,
}

impl Polygon {
    /// The ring is closed if the last point doesn't already match the first.
    pub fn new(exterior: Vec<Pt2D>, holes: Vec<Vec<Pt2D>>) -> Result<Polygon> {
        let exterior = to_ring(exterior)?;
        let mut interiors = Vec::new();
        for hole in holes {
            interiors.push(to_ring(hole)?);
        }
        Ok(Polygon {
            inner: geo::Polygon::new(exterior, interiors),
        })
    }

    pub fn must_new(exterior: Vec<Pt2D>) -> Polygon {
        Polygon::new(exterior, Vec::new()).unwrap()
    }

    pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon {
        Polygon::must_new(vec![
            Pt2D::new(min_x, min_y),
            Pt2D::new(max_x, min_y),
            Pt2D::new(max_x, max_y),
            Pt2D::new(min_x, max_y),
        ])
    }

    /// Parses the GeoJSON representation of a polygon: the exterior ring, then any holes.
    pub fn from_geojson(raw: &[Vec<Vec<f64>>]) -> Result<Polygon> {
        if raw.is_empty() {
            bail!("Polygon has no rings");
        }
        let mut rings = Vec::new();
        for ring in raw {
            let mut pts = Vec::new();
            for pair in ring {
                if pair.len() < 2 {
                    bail!("Polygon has a position with {} coordinates", pair.len());
                }
                pts.push(Pt2D::new(pair[0], pair[1]));
            }
            rings.push(pts);
        }
        let exterior = rings.remove(0);
        Polygon::new(exterior, rings)
    }

    /// In square feet. Orientation doesn't matter.
    pub fn area(&self) -> f64 {
        self.inner.unsigned_area()
    }

    /// Does this polygon contain the point in its interior?
    pub fn contains_pt(&self, pt: Pt2D) -> bool {
        self.inner.contains(&geo::Point::from(pt))
    }

    /// Do two polygons intersect at all?
    pub fn intersects(&self, other: &Polygon) -> bool {
        self.inner.intersects(&other.inner)
    }

    pub fn intersects_polyline(&self, pl: &PolyLine) -> bool {
        self.inner.intersects(&pl.to_geo())
    }

    /// Zero if the point is inside or on the boundary.
    pub fn dist_to_pt(&self, pt: Pt2D) -> Distance {
        let pt = geo::Point::from(pt);
        if self.inner.intersects(&pt) {
            return Distance::ZERO;
        }
        Distance::feet(pt.euclidean_distance(&self.inner))
    }

    /// Zero if the polygons touch or overlap.
    pub fn dist_to_polygon(&self, other: &Polygon) -> Distance {
        if self.intersects(other) {
            return Distance::ZERO;
        }
        Distance::feet(self.inner.euclidean_distance(&other.inner))
    }

    /// Would this polygon, buffered outwards by `radius`, contain the point?
    pub fn buffer_contains_pt(&self, pt: Pt2D, radius: Distance) -> bool {
        self.dist_to_pt(pt) <= radius
    }

    /// Would this polygon, buffered outwards by `radius`, overlap the other polygon?
    pub fn buffer_overlaps(&self, other: &Polygon, radius: Distance) -> bool {
        if !self
            .get_bounds()
            .expanded(radius)
            .overlaps(&other.get_bounds())
        {
            return false;
        }
        self.dist_to_polygon(other) <= radius
    }

    /// Union all of the polygons into one geo::MultiPolygon
    pub fn union_all_into_multipolygon(mut list: Vec<Polygon>) -> geo::MultiPolygon {
        if list.is_empty() {
            return geo::MultiPolygon(Vec::new());
        }

        let mut result = geo::MultiPolygon(vec![list.remove(0).inner]);
        for p in list {
            result = result.union(&geo::MultiPolygon(vec![p.inner]));
        }
        result
    }

    /// Union all of the polygons, returning each disjoint piece, largest first.
    pub fn union_all(list: Vec<Polygon>) -> Vec<Polygon> {
        let mut pieces: Vec<Polygon> = Polygon::union_all_into_multipolygon(list)
            .into_iter()
            .map(|inner| Polygon { inner })
            .collect();
        pieces.sort_by(|a, b| b.area().total_cmp(&a.area()));
        pieces
    }

    /// Unions two polygons. Returns every disjoint piece, largest first.
    pub fn union(&self, other: &Polygon) -> Vec<Polygon> {
        Polygon::union_all(vec![self.clone(), other.clone()])
    }

    /// The centroid, falling back to the middle of the bounding box for degenerate rings.
    pub fn center(&self) -> Pt2D {
        match self.inner.centroid() {
            Some(pt) => Pt2D::new(pt.x(), pt.y()),
            None => self.get_bounds().center(),
        }
    }

    pub fn exterior(&self) -> Vec<Pt2D> {
        self.inner
            .exterior()
            .0
            .iter()
            .map(|c| Pt2D::new(c.x, c.y))
            .collect()
    }

    pub fn get_bounds(&self) -> Bounds {
        let mut b = Bounds::new();
        for c in &self.inner.exterior().0 {
            b.update(Pt2D::new(c.x, c.y));
        }
        b
    }

    pub fn to_geojson(&self) -> geojson::Geometry {
        let mut rings = vec![ring_to_geojson(self.inner.exterior())];
        for hole in self.inner.interiors() {
            rings.push(ring_to_geojson(hole));
        }
        geojson::Geometry::new(geojson::Value::Polygon(rings))
    }
}

impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Polygon with {} points, {} holes, and area {}",
            self.inner.exterior().0.len(),
            self.inner.interiors().len(),
            self.area()
        )
    }
}

impl From<geo::Polygon> for Polygon {
    fn from(inner: geo::Polygon) -> Self {
        Polygon { inner }
    }
}

impl From<Polygon> for geo::Polygon {
    fn from(poly: Polygon) -> Self {
        poly.inner
    }
}

fn to_ring(mut pts: Vec<Pt2D>) -> Result<geo::LineString> {
    pts.dedup();
    if pts.len() > 1 && pts[0] == pts[pts.len() - 1] {
        pts.pop();
    }
    if pts.len() < 3 {
        bail!("A polygon ring needs at least 3 distinct points, got {}", pts.len());
    }
    pts.push(pts[0]);
    Ok(geo::LineString(
        pts.into_iter().map(geo::Coordinate::from).collect(),
    ))
}

fn ring_to_geojson(ring: &geo::LineString) -> Vec<Vec<f64>> {
    ring.0
        .iter()
        .map(|c| {
            let pt = Pt2D::new(c.x, c.y).trimmed();
            vec![pt.x(), pt.y()]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_and_containment() {
        let square = Polygon::rectangle(0.0, 0.0, 100.0, 50.0);
        assert_eq!(square.area(), 5000.0);
        assert!(square.contains_pt(Pt2D::new(10.0, 10.0)));
        assert!(!square.contains_pt(Pt2D::new(110.0, 10.0)));
        assert!(square
            .center()
            .approx_eq(Pt2D::new(50.0, 25.0), crate::EPSILON_DIST));
    }

    #[test]
    fn buffered_predicates() {
        let square = Polygon::rectangle(0.0, 0.0, 100.0, 100.0);
        for (pt, radius, expected) in [
            (Pt2D::new(50.0, 50.0), 0.0, true),
            (Pt2D::new(150.0, 50.0), 40.0, false),
            (Pt2D::new(150.0, 50.0), 50.0, true),
            (Pt2D::new(-30.0, -40.0), 49.0, false),
            (Pt2D::new(-30.0, -40.0), 50.0, true),
        ] {
            assert_eq!(
                square.buffer_contains_pt(pt, Distance::feet(radius)),
                expected
            );
        }

        let neighbor = Polygon::rectangle(300.0, 0.0, 400.0, 100.0);
        assert!(!square.buffer_overlaps(&neighbor, Distance::feet(199.0)));
        assert!(square.buffer_overlaps(&neighbor, Distance::feet(200.0)));
    }

    #[test]
    fn union_of_adjacent_pieces() {
        let left = Polygon::rectangle(0.0, 0.0, 100.0, 100.0);
        let right = Polygon::rectangle(100.0, 0.0, 200.0, 100.0);
        let far = Polygon::rectangle(500.0, 0.0, 510.0, 10.0);

        let pieces = Polygon::union_all(vec![left, right, far]);
        assert_eq!(pieces.len(), 2);
        assert!((pieces[0].area() - 20_000.0).abs() < 1e-6);
        assert!((pieces[1].area() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn rings_close_themselves() {
        let closed = Polygon::from_geojson(&[vec![
            vec![0.0, 0.0],
            vec![10.0, 0.0],
            vec![10.0, 10.0],
            vec![0.0, 0.0],
        ]])
        .unwrap();
        assert_eq!(closed.area(), 50.0);
        assert!(Polygon::new(vec![Pt2D::new(0.0, 0.0), Pt2D::new(1.0, 1.0)], Vec::new()).is_err());
    }
}
