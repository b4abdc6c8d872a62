//! Demand statistics: per-day resampling and summaries, aggregate
//! diversity metrics, load-survey regression, and fleet allocation.

pub mod aggregate;
pub mod allocation;
pub mod demand;
pub mod regression;
