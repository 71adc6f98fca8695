use serde::Serialize;

use geom::{Distance, PolyLine, Pt2D};

use crate::objects::junction::Junction;
use crate::stationing::Stations;

/// All the sub-reaches sharing one unit number, joined into a single line.
#[derive(Clone, Debug)]
pub struct Reach {
    pub unit_number: String,
    /// The prefix of junction names on this reach
    pub code: String,
    pub sub_reaches: Vec<String>,
    /// Runs upstream to downstream, so the outfall is the last point.
    pub center: PolyLine,
    pub stations: Stations,
    /// Sorted by distance from the outfall, largest first.
    pub junctions: Vec<Junction>,
}

impl Reach {
    pub fn length(&self) -> Distance {
        self.center.length()
    }

    pub fn outfall(&self) -> Pt2D {
        self.center.last_pt()
    }

    /// How far upstream of this reach's outfall is the point, after projecting it onto the line?
    pub fn dist_from_outfall(&self, pt: Pt2D) -> Distance {
        (self.length() - self.center.dist_along_of_point(pt).0).max(Distance::ZERO)
    }

    pub fn junction(&self, name: &str) -> Option<&Junction> {
        self.junctions.iter().find(|j| j.name == name)
    }

    /// The junction closest to a distance from the outfall.
    pub fn nearest_junction(&self, dist: Distance) -> Option<&Junction> {
        self.junctions.iter().min_by_key(|j| (j.dist - dist).abs())
    }

    pub fn outfall_junction(&self) -> Option<&Junction> {
        self.junctions.last()
    }

    /// The next junction downstream of the named one.
    pub fn junction_below(&self, name: &str) -> Option<&Junction> {
        let idx = self.junctions.iter().position(|j| j.name == name)?;
        self.junctions.get(idx + 1)
    }

    /// The next junction upstream of the named one.
    pub fn junction_above(&self, name: &str) -> Option<&Junction> {
        let idx = self.junctions.iter().position(|j| j.name == name)?;
        idx.checked_sub(1).and_then(|i| self.junctions.get(i))
    }
}

/// A reach summarized for output.
#[derive(Serialize)]
pub struct ReachSummary<'a> {
    pub unit_number: &'a str,
    pub code: &'a str,
    pub length: Distance,
    pub sub_reaches: usize,
    pub junctions: usize,
    pub stations: usize,
}

impl Reach {
    pub fn summary(&self) -> ReachSummary {
        ReachSummary {
            unit_number: &self.unit_number,
            code: &self.code,
            length: self.length(),
            sub_reaches: self.sub_reaches.len(),
            junctions: self.junctions.len(),
            stations: self.stations.len(),
        }
    }
}
