use serde::Serialize;
use thiserror::Error;

use hydroutil::{Counter, Timer};

/// Something wrong with the input data. Problems only abort the reach or basin they affect.
#[derive(Clone, Debug, PartialEq, Serialize, Error)]
#[serde(tag = "kind")]
pub enum Problem {
    #[error("reach {reach} has {parts} part(s) that don't connect to the rest of the line")]
    DisconnectedParts { reach: String, parts: usize },
    #[error("catchment {catchment} on sub-reach {sub_reach} isn't drained by any segment: {reason}")]
    UnassignedCatchment {
        catchment: String,
        sub_reach: String,
        reason: String,
    },
    #[error("basin {basin} has no mainstem junction within {buffer}ft")]
    UnresolvedBasin { basin: String, buffer: f64 },
    #[error("confluence at ({x}, {y}) on {downstream} receives {upstream:?}")]
    AmbiguousConfluence {
        downstream: String,
        x: f64,
        y: f64,
        upstream: Vec<String>,
    },
    #[error("reach {reach} is degenerate: {reason}")]
    DegenerateReach { reach: String, reason: String },
    #[error("reach {reach} doesn't drain to anything")]
    MissingTopology { reach: String },
}

impl Problem {
    /// Ambiguous confluences are occasionally real, so they're only warnings.
    pub fn is_warning(&self) -> bool {
        matches!(self, Problem::AmbiguousConfluence { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Problem::DisconnectedParts { .. } => "DisconnectedParts",
            Problem::UnassignedCatchment { .. } => "UnassignedCatchment",
            Problem::UnresolvedBasin { .. } => "UnresolvedBasin",
            Problem::AmbiguousConfluence { .. } => "AmbiguousConfluence",
            Problem::DegenerateReach { .. } => "DegenerateReach",
            Problem::MissingTopology { .. } => "MissingTopology",
        }
    }
}

/// Everything noteworthy from one run: data problems, plus the corrections applied to degenerate
/// input.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Report {
    pub problems: Vec<Problem>,
    pub corrections: Vec<String>,
    pub overlapping_junctions: usize,
}

impl Report {
    pub fn problem(&mut self, timer: &mut Timer, problem: Problem) {
        timer.warn(problem.to_string());
        self.problems.push(problem);
    }

    pub fn correction<S: Into<String>>(&mut self, timer: &mut Timer, line: S) {
        let line = line.into();
        timer.note(line.clone());
        self.corrections.push(line);
    }

    pub fn extend_corrections(&mut self, timer: &mut Timer, context: &str, lines: Vec<String>) {
        for line in lines {
            self.correction(timer, format!("{}: {}", context, line));
        }
    }

    pub fn count_by_kind(&self) -> Counter<&'static str> {
        let mut counts = Counter::new();
        for p in &self.problems {
            counts.inc(p.kind());
        }
        counts
    }

    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(|p| !p.is_warning())
    }

    pub fn describe(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "{} problems, {} corrections, {} overlapping junctions dropped",
            self.problems.len(),
            self.corrections.len(),
            self.overlapping_junctions
        )];
        for (kind, count) in self.count_by_kind().borrow() {
            lines.push(format!("  {}: {}", kind, count));
        }
        lines
    }
}
