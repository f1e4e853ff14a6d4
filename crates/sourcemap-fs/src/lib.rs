pub mod app;
pub mod domain;
pub mod infra;
pub mod ui;

use anyhow::Result;

use crate::infra::config::Config;

/// Install logging as configured. Call once, before the terminal is taken over.
pub fn init(config: &Config) -> Result<()> {
    infra::logging::init(&config.log)
}
