//! Finding where reaches meet. Intersection points are grouped by rounded location; the first
//! reach seen at a location is the one receiving flow there.

use std::collections::BTreeMap;

use geom::{Distance, PolyLine, Pt2D, RoundedPt2D};

/// A reach passing through a point.
#[derive(Clone, Debug, PartialEq)]
pub struct IntersectionPoint {
    pub pt: Pt2D,
    pub reach: String,
}

impl IntersectionPoint {
    pub fn new(pt: Pt2D, reach: &str) -> IntersectionPoint {
        IntersectionPoint {
            pt,
            reach: reach.to_string(),
        }
    }
}

/// Everything meeting at one location.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    pub key: RoundedPt2D,
    /// Where the first point of the cluster was seen
    pub pt: Pt2D,
    pub downstream: String,
    /// Other reaches passing through, in the order seen, without duplicates
    pub upstream: Vec<String>,
}

impl Cluster {
    /// Clusters where only one reach shows up aren't confluences.
    pub fn is_confluence(&self) -> bool {
        !self.upstream.is_empty()
    }
}

/// Groups points whose coordinates match after rounding both to `decimals`. The result is in
/// the order clusters were first seen, so the same input always produces the same clusters.
pub fn cluster_points(points: &[IntersectionPoint], decimals: u32) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();
    let mut by_key: BTreeMap<RoundedPt2D, usize> = BTreeMap::new();
    for point in points {
        let key = point.pt.to_rounded(decimals);
        match by_key.get(&key) {
            Some(idx) => {
                let cluster = &mut clusters[*idx];
                if point.reach != cluster.downstream && !cluster.upstream.contains(&point.reach)
                {
                    cluster.upstream.push(point.reach.clone());
                }
            }
            None => {
                by_key.insert(key, clusters.len());
                clusters.push(Cluster {
                    key,
                    pt: point.pt,
                    downstream: point.reach.clone(),
                    upstream: Vec::new(),
                });
            }
        }
    }
    clusters
}

/// For every reach whose outfall touches another reach, produces the touched reach and then the
/// tributary at that point. Reaches ending at the same point are siblings, not receivers, so
/// they're skipped. Input order decides output order.
pub fn find_intersections(reaches: &[(&str, &PolyLine)], snap: Distance) -> Vec<IntersectionPoint> {
    let mut points = Vec::new();
    for (trib, trib_pl) in reaches {
        let outfall = trib_pl.last_pt();
        for (receiver, receiver_pl) in reaches {
            if trib == receiver || receiver_pl.last_pt().approx_eq(outfall, snap) {
                continue;
            }
            if !receiver_pl.get_bounds().expanded(snap).contains(outfall) {
                continue;
            }
            if receiver_pl.dist_to_pt(outfall) <= snap {
                points.push(IntersectionPoint::new(outfall, receiver));
                points.push(IntersectionPoint::new(outfall, trib));
            }
        }
    }
    points
}

/// Counts for the log.
pub fn describe(points: &[IntersectionPoint], clusters: &[Cluster]) -> String {
    let confluences = clusters.iter().filter(|c| c.is_confluence()).count();
    format!(
        "{} intersection points in {} clusters; {} confluences, {} filtered as self-intersections",
        points.len(),
        clusters.len(),
        confluences,
        clusters.len() - confluences
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(input: Vec<(f64, f64, &str)>) -> Vec<IntersectionPoint> {
        input
            .into_iter()
            .map(|(x, y, r)| IntersectionPoint::new(Pt2D::new(x, y), r))
            .collect()
    }

    #[test]
    fn grouping() {
        let points = pts(vec![
            (100.0, 0.0, "W100"),
            (100.001, 0.002, "W110"),
            (100.0, 0.0, "W110"),
            (100.0, 0.0, "W100"),
            // Shares only an x coordinate with the first cluster
            (100.0, 75.0, "W120"),
            (100.0, 75.0, "W120"),
            (100.0, 0.0, "W130"),
        ]);
        let clusters = cluster_points(&points, 2);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].downstream, "W100");
        assert_eq!(clusters[0].upstream, vec!["W110", "W130"]);
        assert_eq!(clusters[1].downstream, "W120");
        assert!(!clusters[1].is_confluence());

        // Too fine a tolerance splits the first confluence
        assert_eq!(cluster_points(&points, 3).len(), 3);
    }

    #[test]
    fn idempotent() {
        let points = pts(vec![
            (5.0, 5.0, "W100"),
            (5.0, 5.0, "W110"),
            (9.0, 1.0, "W110"),
            (9.0, 1.0, "W111"),
        ]);
        let first = cluster_points(&points, 2);
        assert_eq!(first, cluster_points(&points, 2));

        let mut doubled = points.clone();
        doubled.extend(points.clone());
        assert_eq!(first, cluster_points(&doubled, 2));
    }

    #[test]
    fn outfalls_touching_other_reaches() {
        let main = PolyLine::must_new(vec![Pt2D::new(0.0, 1000.0), Pt2D::new(0.0, 0.0)]);
        let trib = PolyLine::must_new(vec![Pt2D::new(-500.0, 500.0), Pt2D::new(0.0, 500.0)]);
        let sibling = PolyLine::must_new(vec![Pt2D::new(500.0, 500.0), Pt2D::new(0.0, 500.0)]);
        let points = find_intersections(
            &[("main", &main), ("trib", &trib), ("sibling", &sibling)],
            Distance::feet(0.01),
        );
        let clusters = cluster_points(&points, 2);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].downstream, "main");
        assert_eq!(clusters[0].upstream, vec!["trib", "sibling"]);
        assert_eq!(clusters[0].pt, Pt2D::new(0.0, 500.0));
        assert_eq!(
            describe(&points, &clusters),
            "4 intersection points in 1 clusters; 1 confluences, 0 filtered as self-intersections"
        );
    }
}
