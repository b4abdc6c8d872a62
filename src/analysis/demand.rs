//! Per-building-day demand statistics over 5-minute intervals.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::series::{DEMAND_INTERVAL_HOURS, SamplePoint, floor_to_interval};

/// Average demand over one 5-minute interval.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalDemand {
    /// Start of the interval.
    pub interval_start: NaiveDateTime,
    /// Mean real power over the interval (kW).
    pub real_kw: f64,
    /// Mean reactive power over the interval (kVAR).
    pub reactive_kvar: f64,
}

/// One building-day resampled into fixed 5-minute demand intervals.
///
/// Only intervals that received at least one sample are present; gaps are
/// not filled. Intervals are ordered by start time.
#[derive(Debug, Clone)]
pub struct DayProfile {
    /// Calendar day the profile covers.
    pub day: NaiveDate,
    /// Ordered demand intervals.
    pub intervals: Vec<IntervalDemand>,
}

impl DayProfile {
    /// Resamples one day's raw samples into demand intervals, averaging all
    /// samples that fall within each interval. A series already aligned on
    /// 5-minute boundaries passes through unchanged.
    pub fn from_samples(day: NaiveDate, samples: &[SamplePoint]) -> Self {
        let mut bins: BTreeMap<NaiveDateTime, (f64, f64, usize)> = BTreeMap::new();
        for sample in samples {
            let start = floor_to_interval(sample.time);
            let bin = bins.entry(start).or_insert((0.0, 0.0, 0));
            bin.0 += sample.real_kw;
            bin.1 += sample.reactive_kvar;
            bin.2 += 1;
        }

        let intervals = bins
            .into_iter()
            .map(|(interval_start, (p_sum, q_sum, n))| IntervalDemand {
                interval_start,
                real_kw: p_sum / n as f64,
                reactive_kvar: q_sum / n as f64,
            })
            .collect();

        Self { day, intervals }
    }

    /// Maximum interval demand (kW), or `None` for an empty day.
    pub fn max_demand_kw(&self) -> Option<f64> {
        self.intervals
            .iter()
            .map(|i| i.real_kw)
            .fold(None, |acc, kw| Some(acc.map_or(kw, |a: f64| a.max(kw))))
    }

    /// Energy consumed over the day (kWh): interval demand times interval
    /// width, summed. `None` for an empty day.
    pub fn total_energy_kwh(&self) -> Option<f64> {
        if self.intervals.is_empty() {
            return None;
        }
        Some(
            self.intervals
                .iter()
                .map(|i| i.real_kw * DEMAND_INTERVAL_HOURS)
                .sum(),
        )
    }

    /// Hours actually covered by intervals present in the profile. Partial
    /// days yield less than 24.
    pub fn covered_hours(&self) -> f64 {
        self.intervals.len() as f64 * DEMAND_INTERVAL_HOURS
    }

    /// Derives the day's demand summary.
    pub fn summarize(&self) -> DemandSummary {
        let max_demand_kw = self.max_demand_kw();
        let total_energy_kwh = self.total_energy_kwh();
        let hours = self.covered_hours();
        let avg_demand_kw = total_energy_kwh
            .filter(|_| hours > 0.0)
            .map(|energy| energy / hours);
        let load_factor = match (avg_demand_kw, max_demand_kw) {
            (Some(avg), Some(max)) if max > 0.0 => Some(avg / max),
            _ => None,
        };

        DemandSummary {
            max_demand_kw,
            avg_demand_kw,
            total_energy_kwh,
            load_factor,
        }
    }
}

/// Demand summary for one building-day.
///
/// Degenerate inputs (an empty day, an all-zero day) surface as `None`
/// fields rather than zeros or NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandSummary {
    /// Maximum 5-minute demand (kW).
    pub max_demand_kw: Option<f64>,
    /// Total energy divided by hours covered (kW).
    pub avg_demand_kw: Option<f64>,
    /// Energy consumed over the day (kWh).
    pub total_energy_kwh: Option<f64>,
    /// `avg_demand_kw / max_demand_kw`; `None` when the peak is zero.
    pub load_factor: Option<f64>,
}

fn fmt_opt(f: &mut fmt::Formatter<'_>, value: Option<f64>) -> fmt::Result {
    match value {
        Some(v) => write!(f, "{v:.3}"),
        None => write!(f, "n/a"),
    }
}

impl fmt::Display for DemandSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "max=")?;
        fmt_opt(f, self.max_demand_kw)?;
        write!(f, " kW  avg=")?;
        fmt_opt(f, self.avg_demand_kw)?;
        write!(f, " kW  energy=")?;
        fmt_opt(f, self.total_energy_kwh)?;
        write!(f, " kWh  load_factor=")?;
        fmt_opt(f, self.load_factor)
    }
}
