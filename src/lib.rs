//! Load diversity statistics for distribution transformer planning.
//!
//! Loads per-building power time series from a simulation output dataset,
//! resamples them to 5-minute demand, and computes per-day summaries plus
//! aggregate diversity and utilization metrics across a building selection.

pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod error;
pub mod io;
pub mod roster;
pub mod series;
