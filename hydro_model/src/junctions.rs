use geom::Distance;
use hydroutil::Warn;

use crate::confluence::Cluster;
use crate::objects::junction::{Junction, JunctionKind};
use crate::objects::reach::Reach;
use crate::stationing::StationIter;
use crate::BuildOptions;

/// Places every junction on a reach: both ends, each confluence where this reach receives a
/// tributary, and optionally evenly spaced ones. Returns them sorted by distance from the
/// outfall, largest first, plus the number of junctions dropped for overlapping an existing
/// one.
///
/// Candidates are added in priority order (outfall, upstream end, confluences, intervals). A
/// candidate with the same name as an existing junction, or within the merge radius of one, is
/// folded into it instead.
pub fn place_junctions(
    reach: &Reach,
    clusters: &[Cluster],
    opts: &BuildOptions,
) -> Warn<(Vec<Junction>, usize)> {
    let mut warnings = Vec::new();
    let unit = &reach.unit_number;
    let length = reach.length();

    let mut candidates = vec![
        Junction::new(unit, &reach.code, Distance::ZERO, reach.outfall(), JunctionKind::Outfall),
        Junction::new(
            unit,
            &reach.code,
            length,
            reach.center.first_pt(),
            JunctionKind::UpstreamEnd,
        ),
    ];

    for cluster in clusters {
        if cluster.downstream != *unit || !cluster.is_confluence() {
            continue;
        }
        let dist = reach.dist_from_outfall(cluster.pt);
        if dist < opts.min_confluence_dist() {
            warnings.push(format!(
                "confluence with {:?} is {} from the outfall; not placing a junction",
                cluster.upstream, dist
            ));
            continue;
        }
        let mut j = Junction::new(unit, &reach.code, dist, cluster.pt, JunctionKind::Confluence);
        j.receives = cluster.upstream.clone();
        candidates.push(j);
    }

    if let Some(spacing) = opts.junction_spacing {
        let (iter, more_warnings) = StationIter::new(&reach.center, spacing, 0.0).consume();
        warnings.extend(more_warnings);
        // The first and last stations are the two ends.
        for station in iter.skip(1) {
            if station.dist <= Distance::ZERO {
                continue;
            }
            candidates.push(Junction::new(
                unit,
                &reach.code,
                station.dist,
                station.pt,
                JunctionKind::Interval,
            ));
        }
    }

    let radius = opts.junction_merge_radius();
    let mut junctions: Vec<Junction> = Vec::new();
    let mut overlapping = 0;
    for candidate in candidates {
        let existing = junctions.iter_mut().find(|j| {
            j.name == candidate.name || (j.dist - candidate.dist).abs() < radius
        });
        match existing {
            Some(j) => {
                if !candidate.receives.is_empty() {
                    if j.kind != JunctionKind::Outfall {
                        j.kind = JunctionKind::Confluence;
                    }
                    for trib in candidate.receives {
                        if !j.receives.contains(&trib) {
                            j.receives.push(trib);
                        }
                    }
                } else {
                    overlapping += 1;
                }
            }
            None => {
                junctions.push(candidate);
            }
        }
    }

    junctions.sort_by(|a, b| b.dist.cmp(&a.dist));
    Warn::warnings((junctions, overlapping), warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confluence::{cluster_points, IntersectionPoint};
    use crate::stationing::Stations;
    use geom::{PolyLine, Pt2D};

    fn reach() -> Reach {
        Reach {
            unit_number: "W100-00-00".to_string(),
            code: "W100".to_string(),
            sub_reaches: Vec::new(),
            center: PolyLine::must_new(vec![Pt2D::new(0.0, 1000.0), Pt2D::new(0.0, 0.0)]),
            stations: Stations::default(),
            junctions: Vec::new(),
        }
    }

    fn clusters() -> Vec<Cluster> {
        cluster_points(
            &[
                IntersectionPoint::new(Pt2D::new(0.0, 500.0), "W100-00-00"),
                IntersectionPoint::new(Pt2D::new(0.0, 500.0), "W110-00-00"),
                IntersectionPoint::new(Pt2D::new(0.0, 3.0), "W100-00-00"),
                IntersectionPoint::new(Pt2D::new(0.0, 3.0), "W120-00-00"),
                // Lies on a different reach
                IntersectionPoint::new(Pt2D::new(9.0, 9.0), "W130-00-00"),
                IntersectionPoint::new(Pt2D::new(9.0, 9.0), "W131-00-00"),
            ],
            2,
        )
    }

    fn names(junctions: &[Junction]) -> Vec<&str> {
        junctions.iter().map(|j| j.name.as_str()).collect()
    }

    #[test]
    fn ends_and_confluences() {
        let (result, warnings) =
            place_junctions(&reach(), &clusters(), &BuildOptions::default()).consume();
        let (junctions, overlapping) = result;
        assert_eq!(names(&junctions), vec!["W100_1000J", "W100_500J", "W100_0000J"]);
        assert_eq!(junctions[1].receives, vec!["W110-00-00"]);
        assert_eq!(junctions[1].kind, JunctionKind::Confluence);
        assert_eq!(junctions[2].kind, JunctionKind::Outfall);
        assert_eq!(overlapping, 0);
        // The confluence 3ft from the outfall was skipped
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn spacing_and_merging() {
        let opts = BuildOptions {
            junction_spacing: Some(300.0),
            junction_merge_radius: 150.0,
            ..Default::default()
        };
        let (junctions, overlapping) = place_junctions(&reach(), &clusters(), &opts).unwrap();
        // Intervals at 700, 400 and 100. 400 is too close to the confluence at 500, and 100 to
        // the outfall.
        assert_eq!(
            names(&junctions),
            vec!["W100_1000J", "W100_700J", "W100_500J", "W100_0000J"]
        );
        assert_eq!(junctions[1].kind, JunctionKind::Interval);
        assert_eq!(overlapping, 2);
    }
}
