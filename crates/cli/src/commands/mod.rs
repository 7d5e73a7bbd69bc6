//! CLI command implementations

pub mod audit;
pub mod baseline;
pub mod spec;
