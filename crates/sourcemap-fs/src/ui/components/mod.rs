//! Widgets drawn from navigator state.

pub mod cycle_bar;
pub mod swimlane;
pub mod tools;
