//! Small helpers shared by every crate in the workspace: phase timing, logging setup, OSM tags,
//! and number formatting.

#[macro_use]
extern crate log;

pub mod logger;
mod tags;
mod time;
mod utils;

pub use crate::tags::Tags;
pub use crate::time::{prettyprint_time, Timer};
pub use crate::utils::prettyprint_usize;
