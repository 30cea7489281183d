//! Command-line interface helpers

pub mod play;
