use anyhow::Result;

use geom::{PolyLine, EPSILON_DIST};

use crate::objects::reach::Reach;
use crate::objects::segment::Segment;

/// Cuts a reach into segments between consecutive junctions, upstream first. Each segment keeps
/// the reach's vertices between the two junctions, plus the exact junction points at both ends
/// when they don't already coincide with a vertex.
pub fn segment_reach(reach: &Reach) -> Result<Vec<Segment>> {
    if reach.junctions.len() < 2 {
        bail!(
            "{} has {} junctions; can't segment it",
            reach.unit_number,
            reach.junctions.len()
        );
    }
    let length = reach.length();
    let vertices = reach.center.points();

    let mut segments = Vec::new();
    for pair in reach.junctions.windows(2) {
        let (upstream, downstream) = (&pair[0], &pair[1]);
        // Distances along the line, measured from its upstream end
        let start = length - upstream.dist;
        let end = length - downstream.dist;

        let mut pts = vec![upstream.pt];
        for idx in reach.center.vertex_range(start, end) {
            if !vertices[idx].approx_eq(pts[pts.len() - 1], EPSILON_DIST) {
                pts.push(vertices[idx]);
            }
        }
        if !downstream.pt.approx_eq(pts[pts.len() - 1], EPSILON_DIST) {
            pts.push(downstream.pt);
        }

        let center = PolyLine::new(pts).map_err(|err| {
            anyhow!(
                "segment of {} between {} and {}: {}",
                reach.unit_number,
                upstream.name,
                downstream.name,
                err
            )
        })?;
        segments.push(Segment {
            name: downstream.segment_name(),
            reach: reach.unit_number.clone(),
            upstream: upstream.name.clone(),
            downstream: downstream.name.clone(),
            upper: upstream.dist,
            lower: downstream.dist,
            center,
        });
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::junction::{Junction, JunctionKind};
    use crate::stationing::Stations;
    use geom::{Distance, Pt2D};

    #[test]
    fn cut_between_junctions() {
        let unit = "W100-00-00";
        let j = |dist: f64, pt: Pt2D, kind| Junction::new(unit, "W100", Distance::feet(dist), pt, kind);
        let reach = Reach {
            unit_number: unit.to_string(),
            code: "W100".to_string(),
            sub_reaches: Vec::new(),
            // 300 long: 100 east, then 200 south
            center: PolyLine::must_new(vec![
                Pt2D::new(0.0, 200.0),
                Pt2D::new(100.0, 200.0),
                Pt2D::new(100.0, 100.0),
                Pt2D::new(100.0, 0.0),
            ]),
            stations: Stations::default(),
            junctions: vec![
                j(300.0, Pt2D::new(0.0, 200.0), JunctionKind::UpstreamEnd),
                j(250.0, Pt2D::new(50.0, 200.0), JunctionKind::Confluence),
                j(100.0, Pt2D::new(100.0, 100.0), JunctionKind::Interval),
                j(0.0, Pt2D::new(100.0, 0.0), JunctionKind::Outfall),
            ],
        };

        let segments = segment_reach(&reach).unwrap();
        assert_eq!(
            segments.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            vec!["W100_250R", "W100_100R", "W100_0000R"]
        );
        assert_eq!(
            segments[0].center.points(),
            &vec![Pt2D::new(0.0, 200.0), Pt2D::new(50.0, 200.0)]
        );
        assert_eq!(
            segments[1].center.points(),
            &vec![
                Pt2D::new(50.0, 200.0),
                Pt2D::new(100.0, 200.0),
                Pt2D::new(100.0, 100.0)
            ]
        );
        assert_eq!(segments[2].upstream, "W100_100J");
        assert_eq!(segments[2].downstream, "W100_0000J");
        assert!(segments[1].covers(Distance::feet(180.0)));
        assert!(!segments[1].covers(Distance::feet(280.0)));

        // The segments add back up to the whole reach
        let total: Distance = segments.iter().map(|s| s.center.length()).sum();
        assert_eq!(total, reach.length());
    }
}
