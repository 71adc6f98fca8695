//! Linear referencing along a reach. Stations are measured from the downstream end, so the
//! first vertex of an upstream-to-downstream line carries the largest station.

use geom::{Distance, Line, PolyLine, Pt2D, EPSILON_DIST};
use hydroutil::Warn;

/// Used when the requested interval can't make progress.
pub const DEFAULT_STATION_INTERVAL: f64 = 50.0;

/// A point along a reach, labeled by its distance from the reach's outfall.
#[derive(Clone, Debug, PartialEq)]
pub struct Station {
    pub id: usize,
    /// Distance upstream from the outfall
    pub dist: Distance,
    pub pt: Pt2D,
}

impl Station {
    pub fn label(&self) -> String {
        self.dist.label()
    }
}

/// Joins the parts of a multi-part line into one sequence of points. The first part fixes the
/// direction. Endpoints match when they're equal after rounding to `decimals`. Each part is
/// first tried against the end of the line built so far, and reversed if its tail is what
/// matches. Parts that don't attach are retried against both ends once everything else is in
/// place. The result includes the number of parts that never attached; they're left out.
pub fn stitch_parts(parts: &[Vec<Pt2D>], decimals: u32) -> (Vec<Pt2D>, usize) {
    let mut parts = parts.iter().filter(|p| !p.is_empty());
    let mut line: Vec<Pt2D> = match parts.next() {
        Some(first) => first.clone(),
        None => return (Vec::new(), 0),
    };
    let same = |a: Pt2D, b: Pt2D| a.to_rounded(decimals) == b.to_rounded(decimals);

    let mut deferred: Vec<&Vec<Pt2D>> = Vec::new();
    for part in parts {
        let tail = line[line.len() - 1];
        if same(tail, part[0]) {
            line.extend(part.iter().skip(1).cloned());
        } else if same(tail, part[part.len() - 1]) {
            line.extend(part.iter().rev().skip(1).cloned());
        } else {
            deferred.push(part);
        }
    }

    // Keep sweeping until a pass makes no progress.
    loop {
        let before = deferred.len();
        let mut still_deferred = Vec::new();
        for part in deferred {
            let head = line[0];
            let tail = line[line.len() - 1];
            let first = part[0];
            let last = part[part.len() - 1];
            if same(tail, first) {
                line.extend(part.iter().skip(1).cloned());
            } else if same(tail, last) {
                line.extend(part.iter().rev().skip(1).cloned());
            } else if same(head, last) {
                let mut joined = part.clone();
                joined.extend(line.into_iter().skip(1));
                line = joined;
            } else if same(head, first) {
                let mut joined: Vec<Pt2D> = part.iter().rev().cloned().collect();
                joined.extend(line.into_iter().skip(1));
                line = joined;
            } else {
                still_deferred.push(part);
            }
        }
        deferred = still_deferred;
        if deferred.is_empty() || deferred.len() == before {
            break;
        }
    }

    (line, deferred.len())
}

/// Lazily walks a line, yielding the starting vertex and then a station every `interval`.
///
/// The walk optionally begins `start` feet into a longer model, to continue numbering across
/// tiles. Bins are multiples of the interval in that global frame, and a bin landing exactly on
/// the end of the line (within floating tolerance) is included. Each station is projected from
/// the start of the segment containing it along the segment's bearing.
pub struct StationIter<'a> {
    pts: &'a [Pt2D],
    interval: f64,
    start: f64,
    length: f64,

    started: bool,
    next_id: usize,
    // The segment currently being walked, and the global distance to its first point
    seg: usize,
    running: f64,
    next_bin: usize,
}

impl<'a> StationIter<'a> {
    /// Non-positive intervals fall back to `DEFAULT_STATION_INTERVAL`.
    pub fn new(pl: &'a PolyLine, interval: f64, start: f64) -> Warn<StationIter<'a>> {
        let mut warnings = Vec::new();
        let interval = if interval > 0.0 && interval.is_finite() {
            interval
        } else {
            warnings.push(format!(
                "station interval {} replaced with {}",
                interval, DEFAULT_STATION_INTERVAL
            ));
            DEFAULT_STATION_INTERVAL
        };
        let start = start.max(0.0);
        Warn::warnings(
            StationIter {
                pts: pl.points(),
                interval,
                start,
                length: pl.length().inner_feet(),
                started: false,
                next_id: 0,
                seg: 0,
                running: start,
                // The first bin strictly past the start
                next_bin: (start / interval).floor() as usize + 1,
            },
            warnings,
        )
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    fn make_station(&mut self, pt: Pt2D, global_dist: f64) -> Station {
        let id = self.next_id;
        self.next_id += 1;
        Station {
            id,
            dist: Distance::feet((self.start + self.length - global_dist).max(0.0)),
            pt,
        }
    }
}

impl<'a> Iterator for StationIter<'a> {
    type Item = Station;

    fn next(&mut self) -> Option<Station> {
        if !self.started {
            self.started = true;
            let pt = self.pts[0];
            let start = self.start;
            return Some(self.make_station(pt, start));
        }

        let tolerance = EPSILON_DIST.inner_feet();
        let end = self.start + self.length;
        while self.seg + 1 < self.pts.len() {
            let line = Line::new(self.pts[self.seg], self.pts[self.seg + 1]);
            let seg_len = line.length().inner_feet();
            let bin = (self.next_bin as f64) * self.interval;
            if bin <= self.running + seg_len + tolerance && bin <= end + tolerance {
                self.next_bin += 1;
                let pt = line.unbounded_dist_along(Distance::feet(bin - self.running));
                return Some(self.make_station(pt, bin));
            }
            self.running += seg_len;
            self.seg += 1;
        }
        None
    }
}

/// Every station along a reach, ordered from upstream (largest station) to the outfall.
#[derive(Clone, Debug, Default)]
pub struct Stations {
    list: Vec<Station>,
}

impl Stations {
    pub fn new(iter: StationIter) -> Stations {
        Stations {
            list: iter.collect(),
        }
    }

    pub fn all(&self) -> &Vec<Station> {
        &self.list
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// The station nearest to a distance from the outfall.
    pub fn nearest(&self, dist: Distance) -> Option<&Station> {
        // Stations are sorted by descending distance.
        let idx = self.list.partition_point(|s| s.dist > dist);
        let after = self.list.get(idx);
        let before = idx.checked_sub(1).and_then(|i| self.list.get(i));
        match (before, after) {
            (Some(b), Some(a)) => {
                if (b.dist - dist).abs() <= (a.dist - dist).abs() {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (Some(b), None) => Some(b),
            (None, a) => a,
        }
    }
}
