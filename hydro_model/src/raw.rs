//! The input layers, read from GeoJSON into typed records. Nothing here is derived yet.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use geojson::{Feature, GeoJson, Value};

use geom::{Polygon, Pt2D};
use hydroutil::Timer;

use crate::FieldNames;

/// One directed piece of the stream network. Vertices run upstream to downstream.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSubReach {
    pub id: String,
    pub unit_number: String,
    /// The sub-reach this one flows into, if the input says.
    pub drains_to: Option<String>,
    /// Usually one part, but multi-part lines happen.
    pub parts: Vec<Vec<Pt2D>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawCatchment {
    /// Used to report problems with this catchment.
    pub id: String,
    pub sub_reach: String,
    pub bdf: Option<f64>,
    pub polygon: Polygon,
}

#[derive(Clone, Debug)]
pub struct RawWatershed {
    pub name: String,
    pub sub_reaches: Vec<RawSubReach>,
    pub catchments: Vec<RawCatchment>,
    /// Sub-reach ID to its index in `sub_reaches`, built once by `new`. The first occurrence of a
    /// duplicate ID wins.
    by_id: BTreeMap<String, usize>,
}

impl RawWatershed {
    pub fn load(
        name: String,
        network_path: &str,
        catchments_path: &str,
        fields: &FieldNames,
        timer: &mut Timer,
    ) -> Result<RawWatershed> {
        timer.start(format!("read {} and {}", network_path, catchments_path));
        let network = fs_err::read_to_string(network_path)?.parse::<GeoJson>()?;
        let catchments = fs_err::read_to_string(catchments_path)?.parse::<GeoJson>()?;
        let raw = RawWatershed::from_geojson(name, network, catchments, fields);
        timer.stop(format!("read {} and {}", network_path, catchments_path));
        raw
    }

    pub fn from_geojson(
        name: String,
        network: GeoJson,
        catchment_layer: GeoJson,
        fields: &FieldNames,
    ) -> Result<RawWatershed> {
        let mut sub_reaches = Vec::new();
        for (idx, feature) in features(network)?.iter().enumerate() {
            sub_reaches.push(
                parse_sub_reach(feature, fields)
                    .with_context(|| format!("network feature #{}", idx))?,
            );
        }
        let mut catchments = Vec::new();
        for (idx, feature) in features(catchment_layer)?.iter().enumerate() {
            catchments.extend(
                parse_catchment(feature, idx, fields)
                    .with_context(|| format!("catchment feature #{}", idx))?,
            );
        }
        if sub_reaches.is_empty() {
            bail!("The network has no sub-reaches");
        }
        Ok(RawWatershed::new(name, sub_reaches, catchments))
    }

    pub fn new(
        name: String,
        sub_reaches: Vec<RawSubReach>,
        catchments: Vec<RawCatchment>,
    ) -> RawWatershed {
        let mut by_id = BTreeMap::new();
        for (idx, sr) in sub_reaches.iter().enumerate() {
            by_id.entry(sr.id.clone()).or_insert(idx);
        }
        RawWatershed {
            name,
            sub_reaches,
            catchments,
            by_id,
        }
    }

    pub fn find_sub_reach(&self, id: &str) -> Option<&RawSubReach> {
        self.by_id.get(id).map(|idx| &self.sub_reaches[*idx])
    }
}

/// Reads just the stream network, for tools that don't need catchments.
pub fn load_sub_reaches(path: &str, fields: &FieldNames) -> Result<Vec<RawSubReach>> {
    let network = fs_err::read_to_string(path)?.parse::<GeoJson>()?;
    let mut sub_reaches = Vec::new();
    for (idx, feature) in features(network)?.iter().enumerate() {
        sub_reaches.push(
            parse_sub_reach(feature, fields)
                .with_context(|| format!("network feature #{}", idx))?,
        );
    }
    Ok(sub_reaches)
}

fn features(gj: GeoJson) -> Result<Vec<Feature>> {
    match gj {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        GeoJson::Feature(feature) => Ok(vec![feature]),
        _ => bail!("Input isn't a FeatureCollection"),
    }
}

fn parse_sub_reach(feature: &Feature, fields: &FieldNames) -> Result<RawSubReach> {
    let id = id_prop(feature, &fields.sub_reach_id)?;
    let unit_number = match id_prop(feature, &fields.unit_number) {
        Ok(unit) if !unit.is_empty() => unit,
        _ => id.chars().take(10).collect(),
    };
    let drains_to = id_prop(feature, &fields.drains_to)
        .ok()
        .filter(|x| !x.is_empty());
    let parts = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::LineString(pts)) => vec![to_pts(pts)?],
        Some(Value::MultiLineString(lines)) => {
            let mut parts = Vec::new();
            for pts in lines {
                parts.push(to_pts(pts)?);
            }
            parts
        }
        _ => bail!("sub-reach {} isn't a LineString", id),
    };
    Ok(RawSubReach {
        id,
        unit_number,
        drains_to,
        parts,
    })
}

// A MultiPolygon catchment becomes one record per polygon, all sharing the ID.
fn parse_catchment(
    feature: &Feature,
    idx: usize,
    fields: &FieldNames,
) -> Result<Vec<RawCatchment>> {
    let id = match id_prop(feature, &fields.catchment_id) {
        Ok(id) => id,
        Err(_) => match &feature.id {
            Some(geojson::feature::Id::String(id)) => id.clone(),
            Some(geojson::feature::Id::Number(id)) => id.to_string(),
            None => idx.to_string(),
        },
    };
    let sub_reach = id_prop(feature, &fields.catchment_sub_reach)?;
    let bdf = f64_prop(feature, &fields.bdf).ok();

    let polygons = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Polygon(rings)) => vec![Polygon::from_geojson(rings)?],
        Some(Value::MultiPolygon(list)) => {
            let mut polygons = Vec::new();
            for rings in list {
                polygons.push(Polygon::from_geojson(rings)?);
            }
            polygons
        }
        _ => bail!("catchment {} isn't a Polygon", id),
    };
    Ok(polygons
        .into_iter()
        .map(|polygon| RawCatchment {
            id: id.clone(),
            sub_reach: sub_reach.clone(),
            bdf,
            polygon,
        })
        .collect())
}

fn to_pts(raw: &[Vec<f64>]) -> Result<Vec<Pt2D>> {
    let mut pts = Vec::new();
    for pair in raw {
        if pair.len() < 2 || !pair[0].is_finite() || !pair[1].is_finite() {
            bail!("bad position {:?}", pair);
        }
        pts.push(Pt2D::new(pair[0], pair[1]));
    }
    Ok(pts)
}

/// Identifiers are sometimes stored as numbers.
fn id_prop(f: &Feature, key: &str) -> Result<String> {
    if let Some(value) = f.property(key) {
        if let Some(string) = value.as_str() {
            return Ok(string.to_string());
        }
        if value.is_number() {
            return Ok(value.to_string());
        }
        bail!("{key} isn't a string");
    }
    bail!("feature is missing {key}");
}

fn f64_prop(f: &Feature, key: &str) -> Result<f64> {
    if let Some(value) = f.property(key) {
        if let Some(x) = value.as_f64() {
            return Ok(x);
        }
        bail!("{key} isn't a float");
    }
    bail!("feature is missing {key}");
}
