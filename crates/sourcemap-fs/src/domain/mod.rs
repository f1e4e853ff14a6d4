//! Core entities shared by the engine and the shell.

pub mod errors;
pub mod model;
