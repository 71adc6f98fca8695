use serde::Serialize;

use geom::{Distance, Polygon, Pt2D};

use crate::objects::junction::JunctionRef;

const SQFT_PER_ACRE: f64 = 43_560.0;
const ACRES_PER_SQMI: f64 = 640.0;

pub fn sqft_to_sqmi(sqft: f64) -> f64 {
    sqft / SQFT_PER_ACRE / ACRES_PER_SQMI
}

/// Where a basin's runoff enters the stream network.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum BasinSource {
    /// Directly into a mainstem segment
    Mainstem(String),
    /// Through a tributary reach, identified by unit number, that joins the mainstem
    Tributary(String),
}

/// A drainage area feeding one junction of the schematic.
#[derive(Clone, Debug)]
pub struct Basin {
    /// `<root>-<letters>`
    pub name: String,
    pub source: BasinSource,
    /// Disjoint polygons, largest first. Usually just one.
    pub pieces: Vec<Polygon>,
    pub up: JunctionRef,
    pub down: JunctionRef,
    pub area_sqmi: f64,
    /// Basin development factor, weighted by area
    pub bdf: f64,
    /// Time of concentration, in hours
    pub tc: f64,
    /// Storage coefficient, in hours
    pub r: f64,
    /// The IDs of the catchments that make up this basin
    pub catchments: Vec<String>,
}

impl Basin {
    pub fn is_mainstem(&self) -> bool {
        matches!(self.source, BasinSource::Mainstem(_))
    }

    pub fn area_sqft(&self) -> f64 {
        self.pieces.iter().map(|p| p.area()).sum()
    }

    pub fn recalculate_area(&mut self) {
        self.area_sqmi = sqft_to_sqmi(self.area_sqft());
    }

    /// The centroid of the largest piece.
    pub fn center(&self) -> Pt2D {
        self.pieces[0].center()
    }

    pub fn buffer_contains_pt(&self, pt: Pt2D, radius: Distance) -> bool {
        self.pieces.iter().any(|p| p.buffer_contains_pt(pt, radius))
    }

    pub fn buffer_overlaps(&self, other: &Basin, radius: Distance) -> bool {
        self.pieces
            .iter()
            .any(|p| other.pieces.iter().any(|q| p.buffer_overlaps(q, radius)))
    }

    /// Absorbs another basin. The pieces are unioned and the development factor reweighted.
    pub fn absorb(&mut self, other: Basin) {
        let my_area = self.area_sqft();
        let other_area = other.area_sqft();
        if my_area + other_area > 0.0 {
            self.bdf = (self.bdf * my_area + other.bdf * other_area) / (my_area + other_area);
        }
        let mut pieces = std::mem::take(&mut self.pieces);
        pieces.extend(other.pieces);
        self.pieces = Polygon::union_all(pieces);
        self.catchments.extend(other.catchments);
        self.recalculate_area();
    }
}
