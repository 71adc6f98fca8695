//! Tools for building HEC-HMS basin models from a stream network and its catchments, bundled as
//! a single executable.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

use anyhow::Result;
use structopt::StructOpt;

use geom::{float_to_station, Distance, PolyLine, Pt2D};
use hydro_model::output::{cross_sections_layer, stations_layer, write_geojson};
use hydro_model::stationing::stitch_parts;
use hydro_model::xsections::{cross_sections, samuels_spacing};
use hydro_model::{
    load_sub_reaches, BuildOptions, FieldNames, RawWatershed, StationIter, Watershed,
};
use hydroutil::Timer;

#[derive(StructOpt)]
#[structopt(name = "hydrocli", about = "Builds hydrologic models of watersheds")]
enum Command {
    /// Builds the whole model: stations, junctions, segments, basins, and the HMS basin file
    Build {
        /// The path to a GeoJSON file with the stream network's sub-reaches
        #[structopt(long)]
        network: String,
        /// The path to a GeoJSON file with catchment polygons
        #[structopt(long)]
        catchments: String,
        /// Everything is written into this directory
        #[structopt(long)]
        output_dir: String,
        /// Names the HMS basin model
        #[structopt(long, default_value = "Watershed")]
        name: String,
        #[structopt(flatten)]
        opts: BuildOptions,
        #[structopt(flatten)]
        fields: FieldNames,
    },
    /// Stations a single reach and writes the stations as GeoJSON points
    Stations {
        /// The path to a GeoJSON file with the stream network's sub-reaches
        #[structopt(long)]
        network: String,
        /// The unit number of the reach to station
        #[structopt(long)]
        reach: String,
        #[structopt(long, default_value = "50")]
        interval: f64,
        /// Continue numbering from this distance, for a reach split across several inputs
        #[structopt(long, default_value = "0")]
        start: f64,
        /// Write GeoJSON points here instead of printing the stations
        #[structopt(long)]
        output: Option<String>,
        /// Parts of a sub-reach connect when their endpoints match after rounding to this many
        /// decimals
        #[structopt(long, default_value = "2")]
        coincidence_decimals: u32,
        #[structopt(flatten)]
        fields: FieldNames,
    },
    /// Writes cross-sections perpendicular to a reach at every station
    CrossSections {
        #[structopt(long)]
        network: String,
        #[structopt(long)]
        reach: String,
        #[structopt(long, default_value = "300")]
        interval: f64,
        /// With --bed-slope, space cross-sections using Samuels' formula instead of --interval
        #[structopt(long)]
        bankfull_depth: Option<f64>,
        #[structopt(long)]
        bed_slope: Option<f64>,
        /// The total width of each cross-section
        #[structopt(long, default_value = "500")]
        width: f64,
        #[structopt(long)]
        output: String,
        /// Parts of a sub-reach connect when their endpoints match after rounding to this many
        /// decimals
        #[structopt(long, default_value = "2")]
        coincidence_decimals: u32,
        #[structopt(flatten)]
        fields: FieldNames,
    },
    /// Prints the Clark time of concentration and storage coefficient for one basin
    TcR {
        /// Basin development factor
        #[structopt(long)]
        bdf: f64,
        /// Drainage area in square miles
        #[structopt(long)]
        area: f64,
    },
}

fn main() -> Result<()> {
    hydroutil::logger::setup();

    match Command::from_args() {
        Command::Build {
            network,
            catchments,
            output_dir,
            name,
            opts,
            fields,
        } => {
            let mut timer = Timer::new(format!("build {}", name));
            let raw = RawWatershed::load(name, &network, &catchments, &fields, &mut timer)?;
            let watershed = Watershed::build(&raw, &opts, &mut timer)?;
            watershed.save(&output_dir)?;
            if watershed.report.has_errors() {
                warn!(
                    "Finished with {} problems; see {}/report.json",
                    watershed.report.problems.len(),
                    output_dir
                );
            }
        }
        Command::Stations {
            network,
            reach,
            interval,
            start,
            output,
            coincidence_decimals,
            fields,
        } => {
            let center = load_reach(&network, &reach, coincidence_decimals, &fields)?;
            let (iter, warnings) = StationIter::new(&center, interval, start).consume();
            for warning in warnings {
                warn!("{}", warning);
            }
            let stations: Vec<_> = iter.collect();
            info!("{} stations along {}", stations.len(), reach);
            match output {
                Some(path) => write_geojson(path, &stations_layer(&reach, &stations))?,
                None => {
                    for s in &stations {
                        println!(
                            "{}\t{}\t{:.2}\t{:.2}",
                            s.label(),
                            float_to_station(s.dist.inner_feet()),
                            s.pt.x(),
                            s.pt.y()
                        );
                    }
                }
            }
        }
        Command::CrossSections {
            network,
            reach,
            interval,
            bankfull_depth,
            bed_slope,
            width,
            output,
            coincidence_decimals,
            fields,
        } => {
            let center = load_reach(&network, &reach, coincidence_decimals, &fields)?;
            let interval = match (bankfull_depth, bed_slope) {
                (Some(depth), Some(slope)) => samuels_spacing(depth, slope, interval),
                _ => interval,
            };
            info!("Cross-sections every {} feet along {}", interval, reach);
            let stations: Vec<_> = StationIter::new(&center, interval, 0.0).unwrap().collect();
            let xs = cross_sections(&reach, &stations, Distance::feet(width));
            write_geojson(output, &cross_sections_layer(&xs))?;
        }
        Command::TcR { bdf, area } => {
            let (tc, r) = hydro_model::hydrology::compute_tc_r(bdf, area)?;
            println!("Tc = {:.2} hr, R = {:.2} hr", tc, r);
        }
    }
    Ok(())
}

fn load_reach(
    network: &str,
    unit: &str,
    coincidence_decimals: u32,
    fields: &FieldNames,
) -> Result<PolyLine> {
    let parts: Vec<_> = load_sub_reaches(network, fields)?
        .into_iter()
        .filter(|sr| sr.unit_number == unit)
        .flat_map(|sr| sr.parts)
        .collect();
    if parts.is_empty() {
        bail!("{} has no sub-reaches with unit number {}", network, unit);
    }
    stitch_reach(unit, &parts, coincidence_decimals)
}

fn stitch_reach(unit: &str, parts: &[Vec<Pt2D>], coincidence_decimals: u32) -> Result<PolyLine> {
    let (mut pts, leftover) = stitch_parts(parts, coincidence_decimals);
    if leftover > 0 {
        bail!("{} has {} parts that don't connect", unit, leftover);
    }
    pts.dedup();
    PolyLine::new(pts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stitching_precision() {
        // The second part starts 0.3 feet from where the first ends
        let parts = vec![
            vec![Pt2D::new(0.0, 100.0), Pt2D::new(0.0, 50.0)],
            vec![Pt2D::new(0.3, 50.0), Pt2D::new(0.0, 0.0)],
        ];
        assert!(stitch_reach("W100-00-00", &parts, 2).is_err());
        let pl = stitch_reach("W100-00-00", &parts, 0).unwrap();
        assert_eq!(pl.points().len(), 3);
    }
}
