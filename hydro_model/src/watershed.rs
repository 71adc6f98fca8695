use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;

use geom::{Distance, PolyLine, Pt2D};
use hydroutil::{Counter, MultiMap, Timer};

use crate::basins::{make_basins, Network};
use crate::confluence::{cluster_points, describe, find_intersections, Cluster, IntersectionPoint};
use crate::junctions::place_junctions;
use crate::objects::basin::Basin;
use crate::objects::reach::Reach;
use crate::objects::segment::Segment;
use crate::raw::{RawSubReach, RawWatershed};
use crate::report::{Problem, Report};
use crate::schematic::Schematic;
use crate::segmentation::segment_reach;
use crate::stationing::{stitch_parts, StationIter, Stations};
use crate::xsections::CrossSection;
use crate::{hms, xsections, BuildOptions};

/// Everything derived from one set of sub-reaches and catchments.
pub struct Watershed {
    pub name: String,
    /// The unit number of the mainstem
    pub mainstem: String,
    /// Prefixes every basin name
    pub root: String,
    pub reaches: BTreeMap<String, Reach>,
    /// Each tributary's unit number, pointing to the reach it drains into
    pub drains_to: BTreeMap<String, String>,
    /// The reverse of `drains_to`
    pub tributaries: MultiMap<String, String>,
    /// Each tributary, pointing to the junction on the receiving reach where it enters
    pub entry_junctions: BTreeMap<String, String>,
    pub clusters: Vec<Cluster>,
    /// Every reach's segments. Each reach's are upstream first.
    pub segments: Vec<Segment>,
    pub basins: Vec<Basin>,
    pub schematic: Schematic,
    pub report: Report,
}

impl Watershed {
    /// Problems with individual reaches and basins land in the report. Only failing to
    /// resolve the mainstem is an error.
    pub fn build(raw: &RawWatershed, opts: &BuildOptions, timer: &mut Timer) -> Result<Watershed> {
        let mut report = Report::default();

        timer.start("build reaches");
        let mut reaches = make_reaches(raw, opts, &mut report, timer);
        timer.stop("build reaches");
        if reaches.is_empty() {
            bail!("None of the {} sub-reaches formed a reach", raw.sub_reaches.len());
        }

        let mainstem = pick_mainstem(raw, &reaches, opts, &mut report, timer)?;
        let root: String = mainstem.chars().take(4).collect();
        timer.note(format!("Mainstem is {}", mainstem));

        timer.start("find confluences");
        let clusters = find_confluences(raw, &reaches, &mainstem, opts, &mut report, timer);
        let mut drains_to = BTreeMap::new();
        let mut tributaries = MultiMap::new();
        for cluster in &clusters {
            if cluster.upstream.len() > opts.expected_upstream_per_confluence {
                report.problem(
                    timer,
                    Problem::AmbiguousConfluence {
                        downstream: cluster.downstream.clone(),
                        x: cluster.pt.x(),
                        y: cluster.pt.y(),
                        upstream: cluster.upstream.clone(),
                    },
                );
            }
            for trib in &cluster.upstream {
                if *trib == mainstem || drains_to.contains_key(trib) {
                    continue;
                }
                drains_to.insert(trib.clone(), cluster.downstream.clone());
                tributaries.insert(cluster.downstream.clone(), trib.clone());
            }
        }
        for unit in reaches.keys() {
            if *unit != mainstem && !drains_to.contains_key(unit) {
                report.problem(timer, Problem::MissingTopology { reach: unit.clone() });
            }
        }
        timer.stop("find confluences");

        timer.start("place junctions");
        let units: Vec<String> = reaches.keys().cloned().collect();
        for unit in &units {
            let (result, warnings) = place_junctions(&reaches[unit], &clusters, opts).consume();
            report.extend_corrections(timer, unit, warnings);
            let (junctions, overlapping) = result;
            report.overlapping_junctions += overlapping;
            if let Some(reach) = reaches.get_mut(unit) {
                reach.junctions = junctions;
            }
        }
        let mut entry_junctions = BTreeMap::new();
        for (trib, receiver) in &drains_to {
            if let (Some(t), Some(r)) = (reaches.get(trib), reaches.get(receiver)) {
                if let Some(j) = r.nearest_junction(r.dist_from_outfall(t.outfall())) {
                    entry_junctions.insert(trib.clone(), j.name.clone());
                }
            }
        }
        timer.stop("place junctions");

        timer.start("segment reaches");
        let mut segments = Vec::new();
        let mut mainstem_segments = Vec::new();
        for reach in reaches.values() {
            match segment_reach(reach) {
                Ok(list) => {
                    if reach.unit_number == mainstem {
                        mainstem_segments = list.clone();
                    }
                    segments.extend(list);
                }
                Err(err) => {
                    if reach.unit_number == mainstem {
                        timer.stop("segment reaches");
                        return Err(err.context("segmenting the mainstem"));
                    }
                    report.problem(
                        timer,
                        Problem::DegenerateReach {
                            reach: reach.unit_number.clone(),
                            reason: err.to_string(),
                        },
                    );
                }
            }
        }
        timer.stop("segment reaches");

        timer.start("make basins");
        let basins = make_basins(
            &Network {
                raw,
                reaches: &reaches,
                mainstem: &mainstem,
                mainstem_segments: &mainstem_segments,
                drains_to: &drains_to,
                entry_junctions: &entry_junctions,
                root: &root,
            },
            opts,
            &mut report,
            timer,
        );
        timer.stop("make basins");
        let basins = basins?;
        if basins.is_empty() {
            bail!("No catchments could be assigned to any basin");
        }

        let mainstem_junctions: Vec<String> = reaches[&mainstem]
            .junctions
            .iter()
            .map(|j| j.name.clone())
            .collect();
        let schematic = Schematic::new(&mainstem_junctions, &basins)?;
        debug!("Schematic:\n{}", schematic.describe());

        for line in report.describe() {
            timer.note(line);
        }
        Ok(Watershed {
            name: raw.name.clone(),
            mainstem,
            root,
            reaches,
            drains_to,
            tributaries,
            entry_junctions,
            clusters,
            segments,
            basins,
            schematic,
            report,
        })
    }

    pub fn mainstem_reach(&self) -> &Reach {
        &self.reaches[&self.mainstem]
    }

    pub fn get_basin(&self, name: &str) -> Option<&Basin> {
        self.basins.iter().find(|b| b.name == name)
    }

    /// Cross-sections perpendicular to a reach at each of its stations.
    pub fn cross_sections(&self, unit: &str, width: Distance) -> Result<Vec<CrossSection>> {
        match self.reaches.get(unit) {
            Some(reach) => Ok(xsections::cross_sections(unit, reach.stations.all(), width)),
            None => bail!("No reach {}", unit),
        }
    }

    /// The HEC-HMS basin model file.
    pub fn basin_file(&self) -> String {
        hms::basin_file(
            &self.name,
            &self.basins,
            &self.schematic,
            &self.mainstem_reach().junctions,
        )
    }
}

fn make_reaches(
    raw: &RawWatershed,
    opts: &BuildOptions,
    report: &mut Report,
    timer: &mut Timer,
) -> BTreeMap<String, Reach> {
    let mut by_unit: BTreeMap<String, Vec<&RawSubReach>> = BTreeMap::new();
    for sr in &raw.sub_reaches {
        by_unit
            .entry(sr.unit_number.clone())
            .or_insert_with(Vec::new)
            .push(sr);
    }

    let convention = opts.numbering();
    let mut codes: Counter<String> = Counter::new();
    for unit in by_unit.keys() {
        codes.inc(convention.tributary_code(unit));
    }

    let mut reaches = BTreeMap::new();
    timer.start_iter("dissolve sub-reaches", by_unit.len());
    for (unit, sub_reaches) in by_unit {
        timer.next();
        let parts: Vec<Vec<Pt2D>> = sub_reaches
            .iter()
            .flat_map(|sr| sr.parts.iter().cloned())
            .collect();
        let (mut pts, leftover) = stitch_parts(&parts, opts.coincidence_decimals);
        if leftover > 0 {
            report.problem(
                timer,
                Problem::DisconnectedParts {
                    reach: unit.clone(),
                    parts: leftover,
                },
            );
            continue;
        }
        let before = pts.len();
        pts.dedup();
        if pts.len() != before {
            report.correction(
                timer,
                format!("{}: removed {} repeated points", unit, before - pts.len()),
            );
        }
        let center = match PolyLine::new(pts) {
            Ok(pl) => pl,
            Err(err) => {
                report.problem(
                    timer,
                    Problem::DegenerateReach {
                        reach: unit.clone(),
                        reason: err.to_string(),
                    },
                );
                continue;
            }
        };

        let (iter, warnings) = StationIter::new(&center, opts.station_interval, 0.0).consume();
        report.extend_corrections(timer, &unit, warnings);
        let stations = Stations::new(iter);

        let code = convention.tributary_code(&unit);
        let code = if codes.get(code.clone()) > 1 {
            unit.clone()
        } else {
            code
        };
        reaches.insert(
            unit.clone(),
            Reach {
                unit_number: unit,
                code,
                sub_reaches: sub_reaches.iter().map(|sr| sr.id.clone()).collect(),
                center,
                stations,
                junctions: Vec::new(),
            },
        );
    }
    reaches
}

// Picked from every input unit number, including units whose reach didn't build. A mainstem
// that didn't build is an error; a tributary never stands in for it.
fn pick_mainstem(
    raw: &RawWatershed,
    reaches: &BTreeMap<String, Reach>,
    opts: &BuildOptions,
    report: &mut Report,
    timer: &mut Timer,
) -> Result<String> {
    let unit = match opts.mainstem {
        Some(ref unit) => unit.clone(),
        None => {
            let units: BTreeSet<&str> = raw
                .sub_reaches
                .iter()
                .map(|sr| sr.unit_number.as_str())
                .collect();
            let first = match units.iter().next() {
                Some(unit) => *unit,
                None => bail!("No sub-reaches to pick a mainstem from"),
            };
            let convention = opts.numbering();
            let candidate = convention.mainstem_unit(&convention.tributary_code(first));
            if units.contains(candidate.as_str()) {
                candidate
            } else {
                report.correction(
                    timer,
                    format!("{} doesn't exist; using {} as the mainstem", candidate, first),
                );
                first.to_string()
            }
        }
    };
    if !reaches.contains_key(&unit) {
        bail!("The mainstem {} wasn't built; see the problems reported for it", unit);
    }
    Ok(unit)
}

// Geometry first. Tributaries that don't touch anything fall back to the drains-to attribute,
// or to the mainstem's outfall if they end there.
fn find_confluences(
    raw: &RawWatershed,
    reaches: &BTreeMap<String, Reach>,
    mainstem: &str,
    opts: &BuildOptions,
    report: &mut Report,
    timer: &mut Timer,
) -> Vec<Cluster> {
    let snap = opts.confluence_snap();
    let lines: Vec<(&str, &PolyLine)> = reaches
        .values()
        .map(|r| (r.unit_number.as_str(), &r.center))
        .collect();
    let mut points = find_intersections(&lines, snap);

    let mut connected: Vec<&str> = points
        .chunks(2)
        .filter_map(|pair| pair.get(1).map(|p| p.reach.as_str()))
        .collect();
    connected.sort_unstable();
    connected.dedup();

    let mut extra = Vec::new();
    for reach in reaches.values() {
        let unit = reach.unit_number.as_str();
        if unit == mainstem || connected.binary_search(&unit).is_ok() {
            continue;
        }
        let outfall = reach.outfall();
        if let Some(receiver) = drains_to_attribute(raw, reach).and_then(|u| reaches.get(&u)) {
            let (along, off) = receiver.center.dist_along_of_point(outfall);
            let pt = receiver.center.dist_along(along);
            report.correction(
                timer,
                format!(
                    "{} doesn't touch another reach; its sub-reaches drain to {}, {} away",
                    unit, receiver.unit_number, off
                ),
            );
            extra.push(IntersectionPoint::new(pt, &receiver.unit_number));
            extra.push(IntersectionPoint::new(pt, unit));
        } else if let Some(main) = reaches.get(mainstem) {
            if main.outfall().approx_eq(outfall, snap) {
                report.correction(
                    timer,
                    format!("{} ends at the mainstem's outfall", unit),
                );
                extra.push(IntersectionPoint::new(main.outfall(), mainstem));
                extra.push(IntersectionPoint::new(main.outfall(), unit));
            }
        }
    }
    points.extend(extra);

    let clusters = cluster_points(&points, opts.coincidence_decimals);
    timer.note(describe(&points, &clusters));
    clusters
}

// The unit number of the reach that one of this reach's sub-reaches says it drains to.
fn drains_to_attribute(raw: &RawWatershed, reach: &Reach) -> Option<String> {
    for id in &reach.sub_reaches {
        let target = match raw.find_sub_reach(id).and_then(|sr| sr.drains_to.as_ref()) {
            Some(id) => id,
            None => continue,
        };
        if let Some(target) = raw.find_sub_reach(target) {
            if target.unit_number != reach.unit_number {
                return Some(target.unit_number.clone());
            }
        }
    }
    None
}
