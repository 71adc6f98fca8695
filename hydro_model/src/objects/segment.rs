use serde::Serialize;

use geom::{Distance, PolyLine};

/// The piece of a reach between two consecutive junctions.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Segment {
    /// Named after the downstream junction
    pub name: String,
    pub reach: String,
    pub upstream: String,
    pub downstream: String,
    /// The station of the upstream junction
    pub upper: Distance,
    /// The station of the downstream junction
    pub lower: Distance,
    /// Runs upstream to downstream
    pub center: PolyLine,
}

impl Segment {
    /// Is a station within this segment, ends included?
    pub fn covers(&self, dist: Distance) -> bool {
        self.lower <= dist && dist <= self.upper
    }
}
