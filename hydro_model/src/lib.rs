//! Builds a hydrologic model of one watershed from a stream network and its catchments:
//! stationing along each reach, junctions at confluences, segments between junctions, named
//! basins dissolved from catchments, and a HEC-HMS basin file routing them all to the outfall.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

pub use crate::objects::basin::{Basin, BasinSource};
pub use crate::objects::junction::{Junction, JunctionKind, JunctionRef};
pub use crate::objects::reach::Reach;
pub use crate::objects::segment::Segment;
pub use crate::options::{BuildOptions, FieldNames, NumberingConvention};
pub use crate::raw::{load_sub_reaches, RawCatchment, RawSubReach, RawWatershed};
pub use crate::report::{Problem, Report};
pub use crate::schematic::{Element, Schematic};
pub use crate::stationing::{Station, StationIter, Stations};
pub use crate::watershed::Watershed;
pub use crate::xsections::CrossSection;

pub mod basins;
pub mod confluence;
pub mod hms;
pub mod hydrology;
pub mod junctions;
mod objects;
mod options;
pub mod output;
mod raw;
mod report;
pub mod schematic;
pub mod segmentation;
pub mod stationing;
mod watershed;
pub mod xsections;
