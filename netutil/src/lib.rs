//! Odds and ends shared by every crate in the workspace: logging setup, a hierarchical phase
//! timer, and number formatting.

#[macro_use]
extern crate log;

pub mod logger;
mod time;
mod utils;

pub use crate::time::{elapsed_seconds, prettyprint_time, Timer};
pub use crate::utils::prettyprint_usize;
