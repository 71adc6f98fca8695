//! The routing schematic: which basins and junctions drain to which junction. HMS junctions take
//! at most 2 inputs, so bigger fan-ins are split up through intermediate junctions.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use serde::Serialize;

use crate::objects::basin::Basin;
use crate::objects::junction::JunctionRef;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Element {
    Basin(String),
    Junction(String),
}

impl Element {
    pub fn name(&self) -> &str {
        match self {
            Element::Basin(name) | Element::Junction(name) => name,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A junction and everything draining directly into it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Merge {
    pub junction: String,
    pub inputs: Vec<Element>,
}

/// A mainstem link between two junctions of the schematic.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Link {
    pub name: String,
    pub from: String,
    pub to: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Schematic {
    /// In the order created. Intermediate junctions come before the junction they feed.
    pub merges: Vec<Merge>,
    /// The parent of every element except the root
    pub downstream: BTreeMap<String, String>,
    /// Mainstem junctions with basins, upstream first. The last is the root.
    pub mainstem: Vec<String>,
    pub links: Vec<Link>,
}

impl Schematic {
    /// Builds the schematic from the mainstem junctions, sorted upstream first, and the finished
    /// basins. A basin draining to `Outfall` is attached to the last mainstem junction.
    pub fn new(mainstem_junctions: &[String], basins: &[Basin]) -> Result<Schematic> {
        let outfall = match mainstem_junctions.last() {
            Some(j) => j.clone(),
            None => bail!("No mainstem junctions to build a schematic from"),
        };

        // Basins are already ordered mainstem upstream-first, then tributaries.
        let mut children: BTreeMap<String, Vec<Element>> = BTreeMap::new();
        for basin in basins {
            let junction = match &basin.down {
                JunctionRef::Junction(name) => name.clone(),
                JunctionRef::Outfall => outfall.clone(),
                JunctionRef::None => bail!("{} doesn't drain to anything", basin.name),
            };
            if !mainstem_junctions.contains(&junction) {
                bail!("{} drains to {}, which isn't on the mainstem", basin.name, junction);
            }
            children
                .entry(junction)
                .or_insert_with(Vec::new)
                .push(Element::Basin(basin.name.clone()));
        }

        let mut schematic = Schematic::default();
        let mut predecessor: Option<String> = None;
        for junction in mainstem_junctions {
            let siblings = match children.remove(junction) {
                Some(list) => list,
                None => continue,
            };
            let inputs = match predecessor.take() {
                Some(prev) => {
                    let mut inputs = vec![Element::Junction(prev.clone())];
                    inputs.extend(merge_siblings(junction, siblings, 1, 1, &mut schematic.merges));
                    schematic.links.push(Link {
                        name: crate::objects::junction::segment_name(junction),
                        from: prev,
                        to: junction.clone(),
                    });
                    inputs
                }
                None => merge_siblings(junction, siblings, 2, 1, &mut schematic.merges),
            };
            schematic.merges.push(Merge {
                junction: junction.clone(),
                inputs,
            });
            schematic.mainstem.push(junction.clone());
            predecessor = Some(junction.clone());
        }

        for merge in &schematic.merges {
            for input in &merge.inputs {
                schematic
                    .downstream
                    .insert(input.name().to_string(), merge.junction.clone());
            }
        }
        Ok(schematic)
    }

    pub fn root(&self) -> Option<&String> {
        self.mainstem.last()
    }

    pub fn describe(&self) -> String {
        let mut lines = Vec::new();
        for merge in &self.merges {
            lines.push(format!(
                "{} <- {}",
                merge.junction,
                merge
                    .inputs
                    .iter()
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        lines.join("\n")
    }
}

/// Splits siblings draining to one junction so that it receives at most `capacity` of them
/// directly. The first `capacity - 1` stay; the rest pair off recursively into intermediate
/// junctions named `<junction>I<idx>`, each taking 2 inputs. Creates `n - capacity` merges for
/// `n > capacity` siblings, each sibling feeding exactly one of them or the junction itself.
pub fn merge_siblings(
    junction: &str,
    mut siblings: Vec<Element>,
    capacity: usize,
    idx: usize,
    merges: &mut Vec<Merge>,
) -> Vec<Element> {
    if siblings.len() <= capacity {
        return siblings;
    }
    let rest = siblings.split_off(capacity - 1);
    let intermediate = format!("{}I{}", junction, idx);
    let inputs = merge_siblings(junction, rest, 2, idx + 1, merges);
    merges.push(Merge {
        junction: intermediate.clone(),
        inputs,
    });
    siblings.push(Element::Junction(intermediate));
    siblings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::basin::BasinSource;
    use geom::Polygon;

    fn basin(name: &str, down: &str) -> Basin {
        Basin {
            name: name.to_string(),
            source: BasinSource::Mainstem("W100_0000R".to_string()),
            pieces: vec![Polygon::rectangle(0.0, 0.0, 1.0, 1.0)],
            up: JunctionRef::None,
            down: JunctionRef::Junction(down.to_string()),
            area_sqmi: 0.0,
            bdf: 0.0,
            tc: 0.0,
            r: 0.0,
            catchments: Vec::new(),
        }
    }

    fn b(name: &str) -> Element {
        Element::Basin(name.to_string())
    }

    fn j(name: &str) -> Element {
        Element::Junction(name.to_string())
    }

    #[test]
    fn three_basins_at_one_junction() {
        let mainstem = vec!["W100_500J".to_string(), "W100_0000J".to_string()];
        let basins = vec![
            basin("A", "W100_500J"),
            basin("B", "W100_500J"),
            basin("C", "W100_500J"),
        ];
        let schematic = Schematic::new(&mainstem, &basins).unwrap();
        assert_eq!(
            schematic.merges,
            vec![
                Merge {
                    junction: "W100_500JI1".to_string(),
                    inputs: vec![b("B"), b("C")],
                },
                Merge {
                    junction: "W100_500J".to_string(),
                    inputs: vec![b("A"), j("W100_500JI1")],
                },
            ]
        );
        for (child, parent) in [
            ("A", "W100_500J"),
            ("B", "W100_500JI1"),
            ("C", "W100_500JI1"),
            ("W100_500JI1", "W100_500J"),
        ] {
            assert_eq!(schematic.downstream[child], parent);
        }
        // No basins reach the outfall, so W100_500J is the root
        assert_eq!(schematic.root().unwrap(), "W100_500J");
        assert!(!schematic.downstream.contains_key("W100_500J"));
    }

    #[test]
    fn predecessor_takes_a_slot() {
        let mainstem = vec![
            "W100_2000J".to_string(),
            "W100_1000J".to_string(),
            "W100_0000J".to_string(),
        ];
        let mut basins = vec![basin("A", "W100_2000J"), basin("B", "W100_1000J")];
        basins.push(basin("C", "W100_0000J"));
        basins.push(basin("D", "W100_0000J"));
        let mut outfall = basin("E", "W100_0000J");
        outfall.down = JunctionRef::Outfall;
        basins.push(outfall);

        let schematic = Schematic::new(&mainstem, &basins).unwrap();
        assert_eq!(
            schematic.describe(),
            vec![
                "W100_2000J <- A",
                "W100_1000J <- W100_2000J, B",
                "W100_0000JI2 <- D, E",
                "W100_0000JI1 <- C, W100_0000JI2",
                "W100_0000J <- W100_1000J, W100_0000JI1",
            ]
            .join("\n")
        );
        assert_eq!(
            schematic
                .links
                .iter()
                .map(|l| l.name.as_str())
                .collect::<Vec<_>>(),
            vec!["W100_1000R", "W100_0000R"]
        );
        assert_eq!(schematic.root().unwrap(), "W100_0000J");
    }

    #[test]
    fn fan_in_makes_a_tree() {
        for n in 3..12 {
            let siblings: Vec<Element> = (0..n).map(|i| b(&format!("B{}", i))).collect();
            let mut merges = Vec::new();
            let top = merge_siblings("W100_500J", siblings, 2, 1, &mut merges);
            merges.push(Merge {
                junction: "W100_500J".to_string(),
                inputs: top,
            });
            assert_eq!(merges.len(), n - 1);

            let mut leaves = Vec::new();
            let mut parents = BTreeMap::new();
            for m in &merges {
                assert!(m.inputs.len() <= 2);
                for input in &m.inputs {
                    assert!(parents.insert(input.clone(), m.junction.clone()).is_none());
                    if let Element::Basin(name) = input {
                        leaves.push(name.clone());
                    }
                }
            }
            leaves.sort();
            let mut expected: Vec<String> = (0..n).map(|i| format!("B{}", i)).collect();
            expected.sort();
            assert_eq!(leaves, expected);
            // Every intermediate junction feeds exactly one parent
            assert_eq!(parents.len(), 2 * (n - 1));
        }
    }

    #[test]
    fn undrained_basins_are_errors() {
        let mainstem = vec!["W100_0000J".to_string()];
        let mut lost = basin("A", "W100_0000J");
        lost.down = JunctionRef::None;
        assert!(Schematic::new(&mainstem, &[lost]).is_err());
        assert!(Schematic::new(&mainstem, &[basin("A", "W110_80J")]).is_err());
    }
}
