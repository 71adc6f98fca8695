use serde::{Deserialize, Serialize};
use structopt::StructOpt;

use geom::Distance;

/// Tunables for turning raw sub-reaches and catchments into a watershed. Every distance is in
/// feet.
#[derive(Clone, Debug, StructOpt, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Distance between stations along each reach. Zero or negative falls back to 50.
    #[structopt(long, default_value = "50")]
    pub station_interval: f64,
    /// Endpoints and confluence points are considered coincident when both coordinates match
    /// after rounding to this many decimals.
    #[structopt(long, default_value = "2")]
    pub coincidence_decimals: u32,
    /// A reach whose outfall is within this distance of another reach drains into it.
    #[structopt(long, default_value = "0.01")]
    pub confluence_snap: f64,
    /// Confluences closer than this to the receiving reach's outfall don't get a junction.
    #[structopt(long, default_value = "5.0")]
    pub min_confluence_dist: f64,
    /// If set, also place junctions at this spacing along every reach.
    #[structopt(long)]
    pub junction_spacing: Option<f64>,
    /// Junctions closer than this to an existing junction on the same reach are dropped.
    /// Disabled at 0.
    #[structopt(long, default_value = "0.0")]
    pub junction_merge_radius: f64,
    /// A mainstem catchment belongs to a segment if its upper station minus this offset falls
    /// within the segment.
    #[structopt(long, default_value = "20.0")]
    pub assignment_offset: f64,
    /// How far from a mainstem basin to look for its bounding junctions.
    #[structopt(long, default_value = "400.0")]
    pub junction_search_buffer: f64,
    /// Two fragments of the same basin merge if they're within this distance.
    #[structopt(long, default_value = "200.0")]
    pub fragment_merge_buffer: f64,
    /// A confluence with more upstream reaches than this is flagged as ambiguous.
    #[structopt(long, default_value = "1")]
    pub expected_upstream_per_confluence: usize,
    /// Basin development factor for catchments that don't have one.
    #[structopt(long, default_value = "0.0")]
    pub default_bdf: f64,
    /// Use the multi-level tributary numbering convention (7-character codes) instead of
    /// single-level (4-character codes).
    #[structopt(long)]
    pub multi_level: bool,
    /// The unit number of the mainstem. By default, the mainstem unit of the first sorted unit
    /// number's watershed code.
    #[structopt(long)]
    pub mainstem: Option<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            station_interval: 50.0,
            coincidence_decimals: 2,
            confluence_snap: 0.01,
            min_confluence_dist: 5.0,
            junction_spacing: None,
            junction_merge_radius: 0.0,
            assignment_offset: 20.0,
            junction_search_buffer: 400.0,
            fragment_merge_buffer: 200.0,
            expected_upstream_per_confluence: 1,
            default_bdf: 0.0,
            multi_level: false,
            mainstem: None,
        }
    }
}

impl BuildOptions {
    pub fn numbering(&self) -> NumberingConvention {
        if self.multi_level {
            NumberingConvention::MultiLevel
        } else {
            NumberingConvention::SingleLevel
        }
    }

    pub fn confluence_snap(&self) -> Distance {
        Distance::feet(self.confluence_snap)
    }

    pub fn min_confluence_dist(&self) -> Distance {
        Distance::feet(self.min_confluence_dist)
    }

    pub fn junction_merge_radius(&self) -> Distance {
        Distance::feet(self.junction_merge_radius)
    }

    pub fn assignment_offset(&self) -> Distance {
        Distance::feet(self.assignment_offset)
    }

    pub fn junction_search_buffer(&self) -> Distance {
        Distance::feet(self.junction_search_buffer)
    }

    pub fn fragment_merge_buffer(&self) -> Distance {
        Distance::feet(self.fragment_merge_buffer)
    }
}

/// The GeoJSON property names to read from the input layers.
#[derive(Clone, Debug, StructOpt, Serialize, Deserialize)]
pub struct FieldNames {
    /// Identifies each sub-reach. The first 10 characters double as the unit number.
    #[structopt(long, default_value = "SubReach_ID")]
    pub sub_reach_id: String,
    /// The unit number of each sub-reach. Falls back to the sub-reach ID when missing.
    #[structopt(long, default_value = "UnitNumber")]
    pub unit_number: String,
    /// The sub-reach that each sub-reach drains to.
    #[structopt(long, default_value = "DrainsTo")]
    pub drains_to: String,
    /// Identifies each catchment in the report.
    #[structopt(long, default_value = "OBJECTID")]
    pub catchment_id: String,
    /// The sub-reach that each catchment drains to.
    #[structopt(long, default_value = "SubReach_ID")]
    pub catchment_sub_reach: String,
    /// The basin development factor of each catchment.
    #[structopt(long, default_value = "BDF")]
    pub bdf: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        FieldNames {
            sub_reach_id: "SubReach_ID".to_string(),
            unit_number: "UnitNumber".to_string(),
            drains_to: "DrainsTo".to_string(),
            catchment_id: "OBJECTID".to_string(),
            catchment_sub_reach: "SubReach_ID".to_string(),
            bdf: "BDF".to_string(),
        }
    }
}

/// How tributaries are coded inside a unit number like `W100-00-00`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberingConvention {
    /// `W100` names the tributary; the mainstem is `W100-00-00`.
    SingleLevel,
    /// `W100-10` names the tributary; the mainstem is `W100-00`.
    MultiLevel,
}

impl NumberingConvention {
    pub fn code_len(self) -> usize {
        match self {
            NumberingConvention::SingleLevel => 4,
            NumberingConvention::MultiLevel => 7,
        }
    }

    /// The short tributary code of a unit number.
    pub fn tributary_code(self, unit_number: &str) -> String {
        unit_number.chars().take(self.code_len()).collect()
    }

    /// The unit number of the mainstem of a tributary code.
    pub fn mainstem_unit(self, code: &str) -> String {
        match self {
            NumberingConvention::SingleLevel => format!("{}-00-00", code),
            NumberingConvention::MultiLevel => format!("{}-00", code),
        }
    }
}
