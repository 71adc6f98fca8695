//! Ambient utilities shared by the hydrology crates: logging setup, phase timing with collected
//! warnings, and a few collections.

#[macro_use]
extern crate log;

pub use crate::collections::{Counter, MultiMap};
pub use crate::logs::Warn;
pub use crate::time::{prettyprint_time, prettyprint_usize, Timer};

mod collections;
pub mod logger;
mod logs;
mod time;

const PROGRESS_FREQUENCY_SECONDS: f64 = 0.2;
