//! Time-series primitives: customer identity, raw samples, and the
//! calendar-day / 5-minute-interval partitioning they feed into.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Width of one demand interval. Demand, per Kersting, is average power over
/// a fixed interval; this crate uses five minutes throughout.
pub const DEMAND_INTERVAL_MIN: u32 = 5;

/// Demand interval width in hours, for energy conversion.
pub const DEMAND_INTERVAL_HOURS: f64 = DEMAND_INTERVAL_MIN as f64 / 60.0;

const DEMAND_INTERVAL_SECS: i64 = DEMAND_INTERVAL_MIN as i64 * 60;

/// Identity of one load profile: a building plus the upgrade package it was
/// simulated under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CustomerId {
    /// Building directory name in the dataset.
    pub building: String,
    /// Upgrade tag (e.g. `up00`).
    pub upgrade: String,
}

impl CustomerId {
    pub fn new(building: impl Into<String>, upgrade: impl Into<String>) -> Self {
        Self {
            building: building.into(),
            upgrade: upgrade.into(),
        }
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bldg_{}_{}", self.building, self.upgrade)
    }
}

/// One raw reading from a building output file.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePoint {
    /// Timestamp of the reading (naive; dataset-local time).
    pub time: NaiveDateTime,
    /// Total real power (kW).
    pub real_kw: f64,
    /// Total reactive power (kVAR); zero when the column is absent.
    pub reactive_kvar: f64,
}

/// Floors a timestamp to the start of its demand interval.
pub fn floor_to_interval(time: NaiveDateTime) -> NaiveDateTime {
    let secs = time.and_utc().timestamp();
    let floored = secs - secs.rem_euclid(DEMAND_INTERVAL_SECS);
    DateTime::<Utc>::from_timestamp(floored, 0)
        .map(|t| t.naive_utc())
        .unwrap_or(time)
}

/// Splits samples into per-calendar-day groups, preserving input order
/// within each day. Days are returned in ascending date order.
pub fn partition_by_day(samples: &[SamplePoint]) -> Vec<(NaiveDate, Vec<SamplePoint>)> {
    let mut days: std::collections::BTreeMap<NaiveDate, Vec<SamplePoint>> =
        std::collections::BTreeMap::new();
    for sample in samples {
        days.entry(sample.time.date()).or_default().push(sample.clone());
    }
    days.into_iter().collect()
}
