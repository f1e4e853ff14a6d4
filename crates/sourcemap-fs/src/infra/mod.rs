//! Infrastructure adapters for config, logging and sourcemap decoding.

pub mod config;
pub mod decoder;
pub mod logging;
