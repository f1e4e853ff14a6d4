//! Navigation engine: datasets, loading, search and the tool swimlane.

pub mod cycle;
pub mod dataset;
pub mod intersect;
pub mod loader;
pub mod navigator;
pub mod rate_limit;
pub mod search;
pub mod swimlane;
pub mod tool;
