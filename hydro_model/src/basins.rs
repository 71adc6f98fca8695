//! Turning catchments into named basins bounded by mainstem junctions.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;

use geom::{Distance, Polygon};
use hydroutil::{MultiMap, Timer};

use crate::hydrology::{compute_tc_r, weighted_bdf};
use crate::objects::basin::{sqft_to_sqmi, Basin, BasinSource};
use crate::objects::junction::JunctionRef;
use crate::objects::reach::Reach;
use crate::objects::segment::Segment;
use crate::raw::{RawCatchment, RawWatershed};
use crate::report::{Problem, Report};
use crate::BuildOptions;

/// Everything basin assignment needs to know about the network.
pub struct Network<'a> {
    pub raw: &'a RawWatershed,
    pub reaches: &'a BTreeMap<String, Reach>,
    pub mainstem: &'a str,
    /// Upstream first
    pub mainstem_segments: &'a [Segment],
    /// Each tributary's unit number, pointing to the reach it drains into
    pub drains_to: &'a BTreeMap<String, String>,
    /// Each tributary joining the mainstem, pointing to the mainstem junction it enters at
    pub entry_junctions: &'a BTreeMap<String, String>,
    /// Prefixes every basin name
    pub root: &'a str,
}

impl<'a> Network<'a> {
    fn mainstem_reach(&self) -> Result<&'a Reach> {
        match self.reaches.get(self.mainstem) {
            Some(r) => Ok(r),
            None => bail!("The mainstem {} wasn't built", self.mainstem),
        }
    }

    /// Follows a tributary down to the one joining the mainstem.
    pub fn top_level_tributary(&self, unit: &str) -> Option<String> {
        let mut current = unit.to_string();
        // Bounded, in case the input has a cycle
        for _ in 0..=self.drains_to.len() {
            let next = self.drains_to.get(&current)?;
            if next == self.mainstem {
                return Some(current);
            }
            current = next.clone();
        }
        None
    }
}

// Mainstem segments sort upstream-first, then tributaries by unit number.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Key {
    Mainstem(usize),
    Tributary(String),
}

/// Assigns catchments, dissolves them into named basins, finds the junctions bounding each, and
/// repairs fragments. Problems with individual catchments and basins are reported and skipped.
pub fn make_basins(
    network: &Network,
    opts: &BuildOptions,
    report: &mut Report,
    timer: &mut Timer,
) -> Result<Vec<Basin>> {
    let groups = assign_catchments(network, opts, report, timer)?;

    timer.start("dissolve basins");
    let mut basins = dissolve(network, groups, opts);
    timer.stop("dissolve basins");

    bracket_mainstem_basins(network, &mut basins, opts, report, timer)?;
    reconcile_fragments(network, &mut basins, opts, report, timer)?;
    rename_duplicates(network.root, &mut basins, report, timer);

    for basin in &mut basins {
        basin.recalculate_area();
        let (tc, r) = compute_tc_r(basin.bdf, basin.area_sqmi)?;
        basin.tc = tc;
        basin.r = r;
    }
    Ok(basins)
}

fn assign_catchments<'a>(
    network: &Network<'a>,
    opts: &BuildOptions,
    report: &mut Report,
    timer: &mut Timer,
) -> Result<BTreeMap<Key, Vec<&'a RawCatchment>>> {
    let mainstem = network.mainstem_reach()?;
    let offset = opts.assignment_offset();

    let mut groups: BTreeMap<Key, Vec<&RawCatchment>> = BTreeMap::new();
    timer.start_iter("assign catchments", network.raw.catchments.len());
    for catchment in &network.raw.catchments {
        timer.next();
        match assign(network, mainstem, offset, catchment) {
            Ok(key) => {
                groups.entry(key).or_insert_with(Vec::new).push(catchment);
            }
            Err(reason) => {
                report.problem(
                    timer,
                    Problem::UnassignedCatchment {
                        catchment: catchment.id.clone(),
                        sub_reach: catchment.sub_reach.clone(),
                        reason,
                    },
                );
            }
        }
    }
    Ok(groups)
}

fn assign(
    network: &Network,
    mainstem: &Reach,
    offset: Distance,
    catchment: &RawCatchment,
) -> std::result::Result<Key, String> {
    if catchment.polygon.area() <= 0.0 {
        return Err("it has no area".to_string());
    }
    let sub_reach = network
        .raw
        .find_sub_reach(&catchment.sub_reach)
        .ok_or_else(|| "the sub-reach doesn't exist".to_string())?;
    let unit = &sub_reach.unit_number;
    if !network.reaches.contains_key(unit) {
        return Err(format!("reach {} wasn't built", unit));
    }

    if unit == network.mainstem {
        let first_pt = sub_reach
            .parts
            .iter()
            .find_map(|part| part.first())
            .ok_or_else(|| "the sub-reach has no points".to_string())?;
        let upper = mainstem.dist_from_outfall(*first_pt);
        let station = (upper - offset).max(Distance::ZERO);
        return network
            .mainstem_segments
            .iter()
            .position(|s| s.covers(station))
            .map(Key::Mainstem)
            .ok_or_else(|| format!("no mainstem segment covers station {}", station.label()));
    }

    match network.top_level_tributary(unit) {
        Some(top) => Ok(Key::Tributary(top)),
        None => Err(format!("tributary {} doesn't reach the mainstem", unit)),
    }
}

/// Bijective base-26: A through Z, then AA through ZZ, then AAA...
pub fn basin_letters(mut n: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}

// Every disjoint piece of a group becomes its own basin. The largest piece owns the name; the
// other pieces temporarily share it, until reconciliation either merges or renames them.
fn dissolve(
    network: &Network,
    groups: BTreeMap<Key, Vec<&RawCatchment>>,
    opts: &BuildOptions,
) -> Vec<Basin> {
    let mut basins = Vec::new();
    for (idx, (key, catchments)) in groups.into_iter().enumerate() {
        let name = format!("{}-{}", network.root, basin_letters(idx));
        let source = match key {
            Key::Mainstem(seg) => BasinSource::Mainstem(network.mainstem_segments[seg].name.clone()),
            Key::Tributary(unit) => BasinSource::Tributary(unit),
        };
        let down = match &source {
            BasinSource::Tributary(unit) => match network.entry_junctions.get(unit) {
                Some(j) => JunctionRef::Junction(j.clone()),
                None => JunctionRef::None,
            },
            BasinSource::Mainstem(_) => JunctionRef::None,
        };

        let pieces =
            Polygon::union_all(catchments.iter().map(|c| c.polygon.clone()).collect());
        // Which piece does each catchment belong to?
        let mut members: MultiMap<usize, usize> = MultiMap::new();
        for (c_idx, c) in catchments.iter().enumerate() {
            let center = c.polygon.center();
            let piece = pieces
                .iter()
                .position(|p| p.contains_pt(center) || p.intersects(&c.polygon))
                .unwrap_or(0);
            members.insert(piece, c_idx);
        }

        for (piece_idx, polygon) in pieces.into_iter().enumerate() {
            let mine: Vec<&RawCatchment> = members
                .get(piece_idx)
                .iter()
                .map(|c_idx| catchments[*c_idx])
                .collect();
            let bdf = weighted_bdf(
                &mine
                    .iter()
                    .map(|c| (c.bdf.unwrap_or(opts.default_bdf), c.polygon.area()))
                    .collect::<Vec<_>>(),
                opts.default_bdf,
            );
            let area_sqmi = sqft_to_sqmi(polygon.area());
            basins.push(Basin {
                name: name.clone(),
                source: source.clone(),
                pieces: vec![polygon],
                up: JunctionRef::None,
                down: down.clone(),
                area_sqmi,
                bdf,
                tc: 0.0,
                r: 0.0,
                catchments: mine.iter().map(|c| c.id.clone()).collect(),
            });
        }
    }
    basins
}

// Mainstem basins are bounded by the lowest and highest mainstem junctions near them.
fn bracket_mainstem_basins(
    network: &Network,
    basins: &mut Vec<Basin>,
    opts: &BuildOptions,
    report: &mut Report,
    timer: &mut Timer,
) -> Result<()> {
    let mainstem = network.mainstem_reach()?;
    let buffer = opts.junction_search_buffer();
    let mut keep = Vec::new();
    for mut basin in basins.drain(..) {
        if !basin.is_mainstem() {
            keep.push(basin);
            continue;
        }
        // Junctions are sorted upstream-first.
        let nearby: Vec<_> = mainstem
            .junctions
            .iter()
            .filter(|j| basin.buffer_contains_pt(j.pt, buffer))
            .collect();
        match (nearby.last(), nearby.first()) {
            (Some(lowest), Some(highest)) => {
                basin.down = JunctionRef::Junction(lowest.name.clone());
                basin.up = if nearby.len() == 1 {
                    JunctionRef::None
                } else {
                    JunctionRef::Junction(highest.name.clone())
                };
                keep.push(basin);
            }
            _ => {
                report.problem(
                    timer,
                    Problem::UnresolvedBasin {
                        basin: basin.name.clone(),
                        buffer: buffer.inner_feet(),
                    },
                );
            }
        }
    }
    *basins = keep;
    Ok(())
}

// Mainstem basins that only touched one junction are either fragments of a neighbor or sit at
// one end of the mainstem.
fn reconcile_fragments(
    network: &Network,
    basins: &mut Vec<Basin>,
    opts: &BuildOptions,
    report: &mut Report,
    timer: &mut Timer,
) -> Result<()> {
    let mainstem = network.mainstem_reach()?;
    let (top, lowest) = match (mainstem.junctions.first(), mainstem.junctions.last()) {
        (Some(top), Some(lowest)) => (top.name.clone(), lowest.name.clone()),
        _ => bail!("The mainstem {} has no junctions", network.mainstem),
    };
    let dist_of = |r: &JunctionRef| -> Option<Distance> {
        r.name()
            .and_then(|name| mainstem.junction(name))
            .map(|j| j.dist)
    };
    let buffer = opts.fragment_merge_buffer();

    let mut removed: BTreeSet<usize> = BTreeSet::new();
    for idx in 0..basins.len() {
        if removed.contains(&idx) || !basins[idx].is_mainstem() || !basins[idx].up.is_none() {
            continue;
        }
        let junction = match basins[idx].down.name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        let others: Vec<usize> = (0..basins.len())
            .filter(|other| {
                *other != idx && !removed.contains(other) && basins[*other].is_mainstem()
            })
            .collect();

        if junction == top {
            // Part of the highest basin
            let below = match mainstem.junction_below(&junction) {
                Some(j) => JunctionRef::Junction(j.name.clone()),
                None => continue,
            };
            if let Some(target) = others.into_iter().find(|o| basins[*o].down == below) {
                let fragment = basins[idx].clone();
                report.correction(
                    timer,
                    format!(
                        "{} only touches {}; merging it into {}",
                        fragment.name, junction, basins[target].name
                    ),
                );
                basins[target].absorb(fragment);
                if basins[target].up.is_none() {
                    basins[target].up = JunctionRef::Junction(junction);
                }
                removed.insert(idx);
            }
        } else if junction == lowest {
            let j_dist = dist_of(&basins[idx].down).unwrap_or(Distance::ZERO);
            if j_dist > Distance::ZERO {
                basins[idx].up = basins[idx].down.clone();
                basins[idx].down = JunctionRef::Outfall;
                continue;
            }
            if let Some(above) = mainstem.junction_above(&junction) {
                basins[idx].up = JunctionRef::Junction(above.name.clone());
            }
            let down = basins[idx].down.clone();
            if let Some(target) = others.into_iter().find(|o| basins[*o].down == down) {
                let fragment = basins[idx].clone();
                report.correction(
                    timer,
                    format!(
                        "{} only touches the outfall {}; merging it into {}",
                        fragment.name, junction, basins[target].name
                    ),
                );
                let up = fragment.up.clone();
                basins[target].absorb(fragment);
                if basins[target].up.is_none() {
                    basins[target].up = up;
                }
                removed.insert(idx);
            }
        } else {
            let partner = others.into_iter().find(|o| {
                basins[*o].name == basins[idx].name
                    && basins[*o].buffer_overlaps(&basins[idx], buffer)
            });
            if let Some(target) = partner {
                let fragment = basins[idx].clone();
                let mut bounds: Vec<(Distance, JunctionRef)> =
                    [&fragment.down, &basins[target].down, &basins[target].up]
                        .into_iter()
                        .filter_map(|r| dist_of(r).map(|d| (d, r.clone())))
                        .collect();
                bounds.sort();
                bounds.dedup();
                report.correction(
                    timer,
                    format!("merging a fragment of {} at {}", fragment.name, junction),
                );
                basins[target].absorb(fragment);
                if let (Some(low), Some(high)) = (bounds.first(), bounds.last()) {
                    basins[target].down = low.1.clone();
                    basins[target].up = if bounds.len() > 1 {
                        high.1.clone()
                    } else {
                        JunctionRef::None
                    };
                }
                removed.insert(idx);
            }
        }
    }

    let mut idx = 0;
    basins.retain(|_| {
        idx += 1;
        !removed.contains(&(idx - 1))
    });
    Ok(())
}

// Fragments that survived reconciliation get fresh names, continuing the sequence.
fn rename_duplicates(root: &str, basins: &mut [Basin], report: &mut Report, timer: &mut Timer) {
    let mut used: BTreeSet<String> = basins.iter().map(|b| b.name.clone()).collect();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut next = used.len();
    for basin in basins.iter_mut() {
        if seen.insert(basin.name.clone()) {
            continue;
        }
        let fresh = loop {
            let candidate = format!("{}-{}", root, basin_letters(next));
            next += 1;
            if !used.contains(&candidate) {
                break candidate;
            }
        };
        report.correction(
            timer,
            format!("a separate piece of {} is now {}", basin.name, fresh),
        );
        used.insert(fresh.clone());
        seen.insert(fresh.clone());
        basin.name = fresh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::junction::{Junction, JunctionKind};
    use crate::stationing::Stations;
    use geom::{PolyLine, Pt2D};

    fn junction(name: &str) -> JunctionRef {
        JunctionRef::Junction(name.to_string())
    }

    fn mainstem_basin(name: &str, up: JunctionRef, down: JunctionRef, piece: Polygon) -> Basin {
        Basin {
            name: name.to_string(),
            source: BasinSource::Mainstem("W100_0000R".to_string()),
            pieces: vec![piece],
            up,
            down,
            area_sqmi: 0.0,
            bdf: 0.0,
            tc: 0.0,
            r: 0.0,
            catchments: vec![name.to_string()],
        }
    }

    // The mainstem runs south along x=0 from y=3000, with junctions at the given distances
    // from its outfall.
    fn reconcile(junctions: Vec<(f64, JunctionKind)>, basins: &mut Vec<Basin>) -> Report {
        let unit = "W100-00-00";
        let reach = Reach {
            unit_number: unit.to_string(),
            code: "W100".to_string(),
            sub_reaches: Vec::new(),
            center: PolyLine::must_new(vec![Pt2D::new(0.0, 3000.0), Pt2D::new(0.0, 0.0)]),
            stations: Stations::default(),
            junctions: junctions
                .into_iter()
                .map(|(dist, kind)| {
                    Junction::new(unit, "W100", Distance::feet(dist), Pt2D::new(0.0, dist), kind)
                })
                .collect(),
        };
        let raw = RawWatershed::new("test".to_string(), Vec::new(), Vec::new());
        let mut reaches = BTreeMap::new();
        reaches.insert(unit.to_string(), reach);
        let empty = BTreeMap::new();
        let network = Network {
            raw: &raw,
            reaches: &reaches,
            mainstem: unit,
            mainstem_segments: &[],
            drains_to: &empty,
            entry_junctions: &empty,
            root: "W100",
        };
        let mut report = Report::default();
        reconcile_fragments(
            &network,
            basins,
            &BuildOptions::default(),
            &mut report,
            &mut Timer::throwaway(),
        )
        .unwrap();
        report
    }

    fn three_junctions() -> Vec<(f64, JunctionKind)> {
        vec![
            (3000.0, JunctionKind::UpstreamEnd),
            (1500.0, JunctionKind::Confluence),
            (0.0, JunctionKind::Outfall),
        ]
    }

    #[test]
    fn fragment_at_the_top_joins_the_basin_below() {
        let mut basins = vec![
            mainstem_basin(
                "W100-A",
                JunctionRef::None,
                junction("W100_3000J"),
                Polygon::rectangle(-100.0, 2900.0, 100.0, 3100.0),
            ),
            mainstem_basin(
                "W100-B",
                JunctionRef::None,
                junction("W100_1500J"),
                Polygon::rectangle(-100.0, 1500.0, 100.0, 2900.0),
            ),
        ];
        let report = reconcile(three_junctions(), &mut basins);

        assert_eq!(basins.len(), 1);
        let b = &basins[0];
        assert_eq!(b.name, "W100-B");
        assert_eq!(b.up, junction("W100_3000J"));
        assert_eq!(b.down, junction("W100_1500J"));
        assert!((b.area_sqft() - 320_000.0).abs() < 1.0);
        assert_eq!(b.catchments, vec!["W100-B".to_string(), "W100-A".to_string()]);
        assert_eq!(report.corrections.len(), 1);
    }

    #[test]
    fn fragment_at_the_outfall_joins_the_basin_above() {
        let mut basins = vec![
            mainstem_basin(
                "W100-C",
                JunctionRef::None,
                junction("W100_0000J"),
                Polygon::rectangle(-100.0, -100.0, 100.0, 100.0),
            ),
            mainstem_basin(
                "W100-B",
                junction("W100_1500J"),
                junction("W100_0000J"),
                Polygon::rectangle(-100.0, 100.0, 100.0, 1500.0),
            ),
        ];
        reconcile(three_junctions(), &mut basins);

        assert_eq!(basins.len(), 1);
        let b = &basins[0];
        assert_eq!(b.name, "W100-B");
        assert_eq!(b.up, junction("W100_1500J"));
        assert_eq!(b.down, junction("W100_0000J"));
        assert!((b.area_sqft() - 320_000.0).abs() < 1.0);
    }

    #[test]
    fn lowest_junction_above_the_outfall() {
        // No junction was placed at the outfall itself
        let mut basins = vec![mainstem_basin(
            "W100-A",
            JunctionRef::None,
            junction("W100_800J"),
            Polygon::rectangle(-100.0, 0.0, 100.0, 800.0),
        )];
        let report = reconcile(
            vec![
                (3000.0, JunctionKind::UpstreamEnd),
                (800.0, JunctionKind::Confluence),
            ],
            &mut basins,
        );

        assert_eq!(basins.len(), 1);
        assert_eq!(basins[0].up, junction("W100_800J"));
        assert_eq!(basins[0].down, JunctionRef::Outfall);
        assert!(report.corrections.is_empty());
    }

    #[test]
    fn nearby_fragments_with_the_same_name_merge() {
        let junctions = vec![
            (3000.0, JunctionKind::UpstreamEnd),
            (2000.0, JunctionKind::Confluence),
            (1000.0, JunctionKind::Confluence),
            (0.0, JunctionKind::Outfall),
        ];
        let mut basins = vec![
            mainstem_basin(
                "W100-C",
                junction("W100_3000J"),
                junction("W100_2000J"),
                Polygon::rectangle(-100.0, 2000.0, 100.0, 3000.0),
            ),
            // 100 feet below the piece above, within the default merge buffer
            mainstem_basin(
                "W100-C",
                JunctionRef::None,
                junction("W100_1000J"),
                Polygon::rectangle(-100.0, 1000.0, 100.0, 1900.0),
            ),
            // Far from everything, so it stays separate
            mainstem_basin(
                "W100-C",
                JunctionRef::None,
                junction("W100_2000J"),
                Polygon::rectangle(5000.0, 2000.0, 5200.0, 2200.0),
            ),
        ];
        let report = reconcile(junctions, &mut basins);

        assert_eq!(basins.len(), 2);
        let merged = &basins[0];
        assert_eq!(merged.up, junction("W100_3000J"));
        assert_eq!(merged.down, junction("W100_1000J"));
        assert_eq!(merged.pieces.len(), 2);
        assert!((merged.area_sqft() - 380_000.0).abs() < 1.0);
        assert_eq!(merged.catchments.len(), 2);

        assert!((basins[1].area_sqft() - 40_000.0).abs() < 1.0);
        assert_eq!(basins[1].up, JunctionRef::None);
        assert_eq!(report.corrections.len(), 1);
    }

    #[test]
    fn letters() {
        for (n, expected) in [
            (0, "A"),
            (1, "B"),
            (3, "D"),
            (4, "E"),
            (25, "Z"),
            (26, "AA"),
            (27, "AB"),
            (51, "AZ"),
            (52, "BA"),
            (701, "ZZ"),
            (702, "AAA"),
        ] {
            assert_eq!(basin_letters(n), expected);
        }
    }

    #[test]
    fn letters_are_unique_and_ordered_by_length() {
        let all: Vec<String> = (0..2000).map(basin_letters).collect();
        let unique: BTreeSet<&String> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
        for pair in all.windows(2) {
            assert!(
                pair[0].len() < pair[1].len()
                    || (pair[0].len() == pair[1].len() && pair[0] < pair[1])
            );
        }
    }

    #[test]
    fn renaming() {
        let basin = |name: &str| Basin {
            name: name.to_string(),
            source: BasinSource::Tributary("W110-00-00".to_string()),
            pieces: vec![Polygon::rectangle(0.0, 0.0, 1.0, 1.0)],
            up: JunctionRef::None,
            down: JunctionRef::Outfall,
            area_sqmi: 0.0,
            bdf: 0.0,
            tc: 0.0,
            r: 0.0,
            catchments: Vec::new(),
        };
        let mut basins = vec![basin("W100-A"), basin("W100-B"), basin("W100-A")];
        let mut report = Report::default();
        rename_duplicates("W100", &mut basins, &mut report, &mut Timer::throwaway());
        assert_eq!(
            basins.iter().map(|b| b.name.as_str()).collect::<Vec<_>>(),
            vec!["W100-A", "W100-B", "W100-C"]
        );
        assert_eq!(report.corrections.len(), 1);
    }
}
