//! Writes the HEC-HMS basin model file: a header, then one keyed block per subbasin, junction
//! and reach, each ending with `End:`.

use std::collections::BTreeMap;

use geom::Pt2D;

use crate::objects::basin::Basin;
use crate::objects::junction::{Junction, JunctionKind};
use crate::schematic::{Element, Schematic};

pub const HMS_VERSION: &str = "3.4";

const INDENT: &str = "     ";

/// Elements are written upstream first, following the order of the schematic's merges: the
/// subbasins feeding a junction, the junction itself, then the mainstem reach leaving it.
pub fn basin_file(
    name: &str,
    basins: &[Basin],
    schematic: &Schematic,
    junctions: &[Junction],
) -> String {
    let basins_by_name: BTreeMap<&str, &Basin> =
        basins.iter().map(|b| (b.name.as_str(), b)).collect();
    let junctions_by_name: BTreeMap<&str, &Junction> =
        junctions.iter().map(|j| (j.name.as_str(), j)).collect();
    let links_from: BTreeMap<&str, &crate::schematic::Link> = schematic
        .links
        .iter()
        .map(|l| (l.from.as_str(), l))
        .collect();
    let locate = |junction: &str| -> Pt2D {
        if let Some(j) = junctions_by_name.get(junction) {
            return j.pt;
        }
        // Intermediate junctions sit on top of the natural junction they feed.
        junctions
            .iter()
            .find(|j| {
                junction
                    .strip_prefix(j.name.as_str())
                    .and_then(|rest| rest.strip_prefix('I'))
                    .map(|idx| idx.chars().all(|c| c.is_ascii_digit()))
                    .unwrap_or(false)
            })
            .map(|j| j.pt)
            .unwrap_or_else(|| Pt2D::new(0.0, 0.0))
    };

    let mut lines = header(name);
    for merge in &schematic.merges {
        for input in &merge.inputs {
            if let Element::Basin(basin) = input {
                if let Some(basin) = basins_by_name.get(basin.as_str()) {
                    lines.extend(subbasin(basin, &merge.junction));
                }
            }
        }

        let pt = locate(&merge.junction);
        let description = match junctions_by_name.get(merge.junction.as_str()) {
            Some(j) => describe(j),
            None => format!("Intermediate junction of {} inputs", merge.inputs.len()),
        };
        let link = links_from.get(merge.junction.as_str());
        let downstream = link
            .map(|l| l.name.clone())
            .or_else(|| schematic.downstream.get(&merge.junction).cloned());
        lines.push(format!("Junction: {}", merge.junction));
        lines.push(format!("{}Description: {}", INDENT, description));
        lines.push(format!("{}Canvas X: {:.2}", INDENT, pt.x()));
        lines.push(format!("{}Canvas Y: {:.2}", INDENT, pt.y()));
        lines.push(format!("{}Label X: 14.0", INDENT));
        lines.push(format!("{}Label Y: 14.0", INDENT));
        if let Some(downstream) = downstream {
            lines.push(format!("{}Downstream: {}", INDENT, downstream));
        }
        lines.push("End:".to_string());
        lines.push(String::new());

        if let Some(link) = link {
            let to = locate(&link.to);
            lines.push(format!("Reach: {}", link.name));
            lines.push(format!("{}Description: {} to {}", INDENT, link.from, link.to));
            lines.push(format!("{}Canvas X: {:.2}", INDENT, to.x()));
            lines.push(format!("{}Canvas Y: {:.2}", INDENT, to.y()));
            lines.push(format!("{}From Canvas X: {:.2}", INDENT, pt.x()));
            lines.push(format!("{}From Canvas Y: {:.2}", INDENT, pt.y()));
            lines.push(format!("{}Label X: 14.0", INDENT));
            lines.push(format!("{}Label Y: 14.0", INDENT));
            lines.push(format!("{}Downstream: {}", INDENT, link.to));
            lines.push(String::new());
            lines.push(format!("{}Route: Lag", INDENT));
            lines.push(format!("{}Lag: 0", INDENT));
            lines.push("End:".to_string());
            lines.push(String::new());
        }
    }
    lines.join("\n")
}

fn header(name: &str) -> Vec<String> {
    vec![
        format!("Basin: {}", name),
        format!("{}Version: {}", INDENT, HMS_VERSION),
        format!("{}Unit System: English", INDENT),
        format!("{}Missing Flow To Zero: No", INDENT),
        format!("{}Enable Flow Ratio: No", INDENT),
        format!("{}Allow Blending: No", INDENT),
        format!("{}Compute Local Flow At Junctions: No", INDENT),
        String::new(),
        format!("{}Enable Sediment Routing: No", INDENT),
        String::new(),
        format!("{}Enable Quality Routing: No", INDENT),
        "End:".to_string(),
        String::new(),
    ]
}

fn subbasin(basin: &Basin, downstream: &str) -> Vec<String> {
    let center = basin.center();
    vec![
        format!("Subbasin: {}", basin.name),
        format!("{}Canvas X: {:.2}", INDENT, center.x()),
        format!("{}Canvas Y: {:.2}", INDENT, center.y()),
        format!("{}Label X: -14.0", INDENT),
        format!("{}Label Y: -14.0", INDENT),
        format!("{}Area: {:.5}", INDENT, basin.area_sqmi),
        format!("{}Downstream: {}", INDENT, downstream),
        String::new(),
        format!("{}Canopy: None", INDENT),
        String::new(),
        format!("{}Surface: None", INDENT),
        String::new(),
        format!("{}Transform: Clark", INDENT),
        format!("{}Time of Concentration: {:.2}", INDENT, basin.tc),
        format!("{}Storage Coefficient: {:.2}", INDENT, basin.r),
        String::new(),
        format!("{}Baseflow: None", INDENT),
        "End:".to_string(),
        String::new(),
    ]
}

fn describe(j: &Junction) -> String {
    match j.kind {
        JunctionKind::Confluence => format!("Confluence with {}", j.receives.join(", ")),
        JunctionKind::UpstreamEnd => format!("Upstream end of {}", j.reach),
        JunctionKind::Interval => format!("Station {} on {}", j.dist.label(), j.reach),
        JunctionKind::Outfall => format!("Outfall of {}", j.reach),
    }
}
