//! GeoJSON layers of everything derived, plus the files written for one run.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};

use geom::{Line, Pt2D};

use crate::objects::basin::Basin;
use crate::objects::reach::Reach;
use crate::objects::segment::Segment;
use crate::stationing::Station;
use crate::xsections::CrossSection;
use crate::Watershed;

fn feature(geometry: Geometry) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: None,
        foreign_members: None,
    }
}

fn point(pt: Pt2D) -> Geometry {
    let pt = pt.trimmed();
    Geometry::new(Value::Point(vec![pt.x(), pt.y()]))
}

fn line(l: &Line) -> Geometry {
    let (a, b) = (l.pt1().trimmed(), l.pt2().trimmed());
    Geometry::new(Value::LineString(vec![vec![a.x(), a.y()], vec![b.x(), b.y()]]))
}

fn collection(features: Vec<Feature>) -> GeoJson {
    GeoJson::FeatureCollection(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    })
}

pub fn stations_layer(reach: &str, stations: &[Station]) -> GeoJson {
    collection(
        stations
            .iter()
            .map(|s| {
                let mut f = feature(point(s.pt));
                f.set_property("reach", reach);
                f.set_property("id", s.id);
                f.set_property("station", s.label());
                f.set_property("station_text", geom::float_to_station(s.dist.inner_feet()));
                f
            })
            .collect(),
    )
}

/// Every junction on the reaches, with the ID of the station nearest to each.
pub fn junctions_layer<'a>(reaches: impl Iterator<Item = &'a Reach>) -> GeoJson {
    collection(
        reaches
            .flat_map(|r| r.junctions.iter().map(move |j| (r, j)))
            .map(|(r, j)| {
                let mut f = feature(point(j.pt));
                f.set_property("name", j.name.clone());
                f.set_property("reach", j.reach.clone());
                f.set_property("station", j.dist.label());
                f.set_property("kind", format!("{:?}", j.kind));
                f.set_property("receives", j.receives.join(","));
                if let Some(s) = r.stations.nearest(j.dist) {
                    f.set_property("nearest_station", s.id);
                }
                f
            })
            .collect(),
    )
}

pub fn segments_layer(segments: &[Segment]) -> GeoJson {
    collection(
        segments
            .iter()
            .map(|s| {
                let mut f = feature(s.center.to_geojson());
                f.set_property("name", s.name.clone());
                f.set_property("reach", s.reach.clone());
                f.set_property("upstream", s.upstream.clone());
                f.set_property("downstream", s.downstream.clone());
                f.set_property("length", s.center.length().label());
                f
            })
            .collect(),
    )
}

pub fn basins_layer(basins: &[Basin]) -> GeoJson {
    collection(
        basins
            .iter()
            .map(|b| {
                let mut polygons = Vec::new();
                for piece in &b.pieces {
                    if let Value::Polygon(rings) = piece.to_geojson().value {
                        polygons.push(rings);
                    }
                }
                let geometry = if polygons.len() == 1 {
                    Geometry::new(Value::Polygon(polygons.remove(0)))
                } else {
                    Geometry::new(Value::MultiPolygon(polygons))
                };
                let mut f = feature(geometry);
                f.set_property("name", b.name.clone());
                f.set_property("up", b.up.to_string());
                f.set_property("down", b.down.to_string());
                f.set_property("area_sqmi", b.area_sqmi);
                f.set_property("bdf", b.bdf);
                f.set_property("tc_hr", b.tc);
                f.set_property("r_hr", b.r);
                f.set_property("catchments", b.catchments.join(","));
                f
            })
            .collect(),
    )
}

pub fn cross_sections_layer(xs: &[CrossSection]) -> GeoJson {
    collection(
        xs.iter()
            .map(|x| {
                let mut f = feature(line(&x.line));
                f.set_property("reach", x.reach.clone());
                f.set_property("station", x.station.label());
                f
            })
            .collect(),
    )
}

pub fn write_geojson<P: AsRef<Path>>(path: P, gj: &GeoJson) -> Result<()> {
    let mut file = fs_err::File::create(path.as_ref())?;
    write!(file, "{}", serde_json::to_string_pretty(gj)?)?;
    info!("Wrote {}", path.as_ref().display());
    Ok(())
}

impl Watershed {
    /// Writes the HMS basin file, the GeoJSON layers, a summary of each reach and the run report
    /// into a directory.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs_err::create_dir_all(dir)?;

        let basin_path = dir.join(format!("{}.basin", self.name));
        fs_err::write(&basin_path, self.basin_file())?;
        info!("Wrote {}", basin_path.display());

        let mut stations = Vec::new();
        for reach in self.reaches.values() {
            if let GeoJson::FeatureCollection(fc) =
                stations_layer(&reach.unit_number, reach.stations.all())
            {
                stations.extend(fc.features);
            }
        }
        write_geojson(dir.join("stations.geojson"), &collection(stations))?;
        write_geojson(
            dir.join("junctions.geojson"),
            &junctions_layer(self.reaches.values()),
        )?;
        write_geojson(dir.join("segments.geojson"), &segments_layer(&self.segments))?;
        write_geojson(dir.join("basins.geojson"), &basins_layer(&self.basins))?;

        let summaries: Vec<_> = self.reaches.values().map(|r| r.summary()).collect();
        let reaches_path = dir.join("reaches.json");
        fs_err::write(&reaches_path, serde_json::to_string_pretty(&summaries)?)?;
        info!("Wrote {}", reaches_path.display());

        let report_path = dir.join("report.json");
        fs_err::write(&report_path, serde_json::to_string_pretty(&self.report)?)?;
        info!("Wrote {}", report_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::basin::BasinSource;
    use crate::objects::junction::JunctionRef;
    use geom::{Distance, Polygon};

    #[test]
    fn basin_properties() {
        let basin = Basin {
            name: "W100-A".to_string(),
            source: BasinSource::Tributary("W110-00-00".to_string()),
            pieces: vec![
                Polygon::rectangle(0.0, 0.0, 10.0, 10.0),
                Polygon::rectangle(50.0, 0.0, 55.0, 5.0),
            ],
            up: JunctionRef::None,
            down: JunctionRef::Junction("W100_500J".to_string()),
            area_sqmi: 0.0,
            bdf: 2.0,
            tc: 0.0,
            r: 0.0,
            catchments: vec!["1".to_string(), "2".to_string()],
        };
        let gj = basins_layer(&[basin]);
        let json = serde_json::to_value(&gj).unwrap();
        let f = &json["features"][0];
        assert_eq!(f["geometry"]["type"], "MultiPolygon");
        assert_eq!(f["properties"]["up"], "None");
        assert_eq!(f["properties"]["down"], "W100_500J");
        assert_eq!(f["properties"]["catchments"], "1,2");
    }

    #[test]
    fn station_text() {
        let stations = vec![Station {
            id: 0,
            dist: Distance::feet(1234.56),
            pt: Pt2D::new(1.0, 2.0),
        }];
        let json = serde_json::to_value(&stations_layer("W100-00-00", &stations)).unwrap();
        let props = &json["features"][0]["properties"];
        assert_eq!(props["station"], "1234.56");
        assert_eq!(props["station_text"], "12+34");
        assert_eq!(json["features"][0]["geometry"]["coordinates"][1], 2.0);
    }
}
