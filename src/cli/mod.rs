//! Command-line interface for papersum.

mod commands;
pub mod icons;

pub use commands::{is_verbose, run};
