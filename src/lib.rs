// Library exports for barline

pub mod csv_reader;
pub mod data;
pub mod dimension;
pub mod error;
pub mod palette;
pub mod sizing;

// Configuration
pub mod config;
pub mod resolve;

// Specification synthesis
pub mod expr;
pub mod ir;
pub mod tooltip;
pub mod transform;
pub mod signal;
pub mod scale;
pub mod compiler;
pub mod guide;
pub mod validate;
pub mod graph;

pub use error::{Result, SpecError};
