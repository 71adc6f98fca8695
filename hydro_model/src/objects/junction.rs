use std::fmt;

use serde::{Serialize, Serializer};

use geom::{Distance, Pt2D};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum JunctionKind {
    /// The first vertex of the reach
    UpstreamEnd,
    /// Another reach drains in here
    Confluence,
    /// Only placed to split a long reach up
    Interval,
    Outfall,
}

/// A point on a reach where flow combines or where the reach is cut into segments.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Junction {
    pub name: String,
    /// The unit number of the reach this lies on
    pub reach: String,
    /// Distance upstream from the reach's outfall
    pub dist: Distance,
    pub pt: Pt2D,
    pub kind: JunctionKind,
    /// The unit numbers of tributaries entering here. Only confluences have any.
    pub receives: Vec<String>,
}

impl Junction {
    pub fn new(reach: &str, code: &str, dist: Distance, pt: Pt2D, kind: JunctionKind) -> Junction {
        Junction {
            name: junction_name(code, dist),
            reach: reach.to_string(),
            dist,
            pt,
            kind,
            receives: Vec::new(),
        }
    }

    /// The name of the segment ending here.
    pub fn segment_name(&self) -> String {
        segment_name(&self.name)
    }
}

/// `<code>_<dist>J`, with the distance rounded to the foot. The outfall is always `_0000J`.
pub fn junction_name(code: &str, dist: Distance) -> String {
    let feet = dist.inner_feet().round();
    if feet <= 0.0 {
        format!("{}_0000J", code)
    } else {
        format!("{}_{:.0}J", code, feet)
    }
}

/// Splits a junction name back into the reach code and distance.
pub fn parse_junction_name(name: &str) -> Option<(String, f64)> {
    let (code, dist) = name.strip_suffix('J')?.rsplit_once('_')?;
    Some((code.to_string(), dist.parse().ok()?))
}

/// Segments are named after the junction at their downstream end, `J` swapped for `R`.
pub fn segment_name(junction: &str) -> String {
    match junction.strip_suffix('J') {
        Some(base) => format!("{}R", base),
        None => format!("{}R", junction),
    }
}

/// What bounds a basin on one side.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum JunctionRef {
    /// Nothing upstream
    None,
    /// Drains to the watershed's outfall
    Outfall,
    Junction(String),
}

impl JunctionRef {
    pub fn name(&self) -> Option<&str> {
        match self {
            JunctionRef::Junction(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        *self == JunctionRef::None
    }
}

impl fmt::Display for JunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JunctionRef::None => write!(f, "None"),
            JunctionRef::Outfall => write!(f, "Outfall"),
            JunctionRef::Junction(name) => write!(f, "{}", name),
        }
    }
}

impl Serialize for JunctionRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for (code, dist, name) in [
            ("W100", 500.0, "W100_500J"),
            ("W100", 0.0, "W100_0000J"),
            ("W100", 0.3, "W100_0000J"),
            ("W110", 1234.56, "W110_1235J"),
            ("W100-10-00", 87.0, "W100-10-00_87J"),
        ] {
            let actual = junction_name(code, Distance::feet(dist));
            assert_eq!(actual, name);
            let (parsed_code, parsed_dist) = parse_junction_name(&actual).unwrap();
            assert_eq!(parsed_code, code);
            assert_eq!(parsed_dist, dist.round());
        }
        assert_eq!(parse_junction_name("W100_500"), None);
        assert_eq!(parse_junction_name("W100J"), None);
        assert_eq!(segment_name("W100_500J"), "W100_500R");
    }

    #[test]
    fn refs_serialize_as_text() {
        for (r, expected) in [
            (JunctionRef::None, "\"None\""),
            (JunctionRef::Outfall, "\"Outfall\""),
            (JunctionRef::Junction("W100_500J".to_string()), "\"W100_500J\""),
        ] {
            assert_eq!(serde_json::to_string(&r).unwrap(), expected);
        }
    }
}
