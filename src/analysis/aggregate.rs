//! Aggregate diversity and utilization metrics across customers
//! (Kersting, ch. 2).

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;

use crate::analysis::demand::DayProfile;
use crate::error::AnalysisError;

/// Total demand across the selection at one aligned interval.
#[derive(Debug, Clone, PartialEq)]
pub struct DiversifiedPoint {
    /// Interval start shared by the contributing profiles.
    pub interval_start: NaiveDateTime,
    /// Sum of contributing demands (kW).
    pub demand_kw: f64,
}

/// One point of the load duration curve.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationPoint {
    /// Diversified demand (kW).
    pub demand_kw: f64,
    /// Percent of sampled time this demand level is met or exceeded.
    pub pct_of_time: f64,
}

/// Aggregate statistics for a customer selection against one hypothetical
/// transformer.
#[derive(Debug, Clone)]
pub struct AggregateReport {
    /// Diversified demand at each aligned interval, in time order.
    pub diversified_demand: Vec<DiversifiedPoint>,
    /// Diversified demand sorted descending with percent-of-time ranks.
    pub load_duration_curve: Vec<DurationPoint>,
    /// Peak of the diversified demand series (kW).
    pub max_diversified_kw: f64,
    /// Sum of each building-day's own peak (kW); peaks are not time-aligned.
    pub max_noncoincident_kw: f64,
    /// `max_noncoincident / max_diversified`.
    pub diversity_factor: f64,
    /// `max_noncoincident - max_diversified` (kW).
    pub load_diversity_kw: f64,
    /// `(max_diversified / pf) / transformer_kva`; above 1.0 means the
    /// transformer is overloaded and is reported as-is.
    pub utilization_factor: f64,
    /// Number of customers in the selection.
    pub n_customers: usize,
    /// Transformer rating the utilization factor was computed against (kVA).
    pub transformer_kva: f64,
    /// Assumed power factor.
    pub power_factor: f64,
}

/// Computes aggregate metrics over every day-slice of a customer selection.
///
/// Diversified demand groups by interval timestamp and sums whatever
/// profiles contribute there; profiles that share no common interval only
/// stack where they overlap, with no interpolation or fill.
///
/// # Panics
///
/// Panics if `transformer_kva` is not positive or `power_factor` is outside
/// `(0, 1]`.
///
/// # Errors
///
/// * [`AnalysisError::EmptySelection`] when `n_customers` is zero.
/// * [`AnalysisError::ZeroDiversifiedDemand`] when the diversified series
///   has no positive value (including a selection with no intervals at
///   all), which leaves the diversity factor undefined.
pub fn aggregate_day_profiles(
    profiles: &[&DayProfile],
    n_customers: usize,
    transformer_kva: f64,
    power_factor: f64,
) -> Result<AggregateReport, AnalysisError> {
    assert!(transformer_kva > 0.0, "transformer_kva must be > 0");
    assert!(
        power_factor > 0.0 && power_factor <= 1.0,
        "power_factor must be in (0, 1]"
    );

    if n_customers == 0 {
        return Err(AnalysisError::EmptySelection);
    }

    let mut bins: BTreeMap<NaiveDateTime, f64> = BTreeMap::new();
    for profile in profiles {
        for interval in &profile.intervals {
            *bins.entry(interval.interval_start).or_insert(0.0) += interval.real_kw;
        }
    }

    let diversified_demand: Vec<DiversifiedPoint> = bins
        .into_iter()
        .map(|(interval_start, demand_kw)| DiversifiedPoint {
            interval_start,
            demand_kw,
        })
        .collect();

    let max_diversified_kw = diversified_demand
        .iter()
        .map(|p| p.demand_kw)
        .fold(f64::NEG_INFINITY, f64::max);
    if max_diversified_kw <= 0.0 {
        return Err(AnalysisError::ZeroDiversifiedDemand);
    }

    let max_noncoincident_kw: f64 = profiles
        .iter()
        .filter_map(|p| p.max_demand_kw())
        .sum();

    let load_duration_curve = duration_curve(&diversified_demand);

    Ok(AggregateReport {
        max_diversified_kw,
        max_noncoincident_kw,
        diversity_factor: max_noncoincident_kw / max_diversified_kw,
        load_diversity_kw: max_noncoincident_kw - max_diversified_kw,
        utilization_factor: (max_diversified_kw / power_factor) / transformer_kva,
        diversified_demand,
        load_duration_curve,
        n_customers,
        transformer_kva,
        power_factor,
    })
}

/// Sorts the diversified series descending and annotates each row with its
/// rank as a percent of the sample count.
fn duration_curve(diversified: &[DiversifiedPoint]) -> Vec<DurationPoint> {
    let mut demands: Vec<f64> = diversified.iter().map(|p| p.demand_kw).collect();
    demands.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let n = demands.len() as f64;
    demands
        .into_iter()
        .enumerate()
        .map(|(i, demand_kw)| DurationPoint {
            demand_kw,
            pct_of_time: (i + 1) as f64 / n * 100.0,
        })
        .collect()
}

impl fmt::Display for AggregateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Transformer Aggregate Report ---")?;
        writeln!(f, "Customers:             {}", self.n_customers)?;
        writeln!(f, "Max diversified:       {:.3} kW", self.max_diversified_kw)?;
        writeln!(
            f,
            "Max noncoincident:     {:.3} kW",
            self.max_noncoincident_kw
        )?;
        writeln!(f, "Diversity factor:      {:.4}", self.diversity_factor)?;
        writeln!(f, "Load diversity:        {:.3} kW", self.load_diversity_kw)?;
        write!(
            f,
            "Utilization factor:    {:.4} ({:.1} kVA at pf {:.2})",
            self.utilization_factor, self.transformer_kva, self.power_factor
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::SamplePoint;
    use chrono::NaiveDate;

    fn profile(day: u32, demands_kw: &[f64]) -> DayProfile {
        let date = NaiveDate::from_ymd_opt(2025, 6, day).expect("valid date");
        let samples: Vec<SamplePoint> = demands_kw
            .iter()
            .enumerate()
            .map(|(i, &kw)| SamplePoint {
                time: date
                    .and_hms_opt(0, 5 * i as u32, 0)
                    .expect("valid time"),
                real_kw: kw,
                reactive_kvar: 0.0,
            })
            .collect();
        DayProfile::from_samples(date, &samples)
    }

    #[test]
    fn textbook_two_customer_example() {
        // Customers A and B, one shared day of three intervals.
        let a = profile(1, &[2.0, 4.0, 6.0]);
        let b = profile(1, &[1.0, 1.0, 1.0]);
        let report =
            aggregate_day_profiles(&[&a, &b], 2, 10.0, 1.0).expect("aggregate");

        let demands: Vec<f64> = report
            .diversified_demand
            .iter()
            .map(|p| p.demand_kw)
            .collect();
        assert_eq!(demands, vec![3.0, 5.0, 7.0]);
        assert_eq!(report.max_diversified_kw, 7.0);
        assert_eq!(report.max_noncoincident_kw, 7.0);
        assert!((report.diversity_factor - 1.0).abs() < 1e-12);
        assert!((report.utilization_factor - 0.7).abs() < 1e-12);
        assert!((report.load_diversity_kw - 0.0).abs() < 1e-12);
    }

    #[test]
    fn diversified_peak_never_exceeds_noncoincident_sum() {
        let profiles = vec![
            profile(1, &[0.4, 2.1, 0.9, 3.3]),
            profile(1, &[1.8, 0.2, 2.7, 0.5]),
            profile(2, &[0.9, 0.9, 4.0]),
            profile(3, &[2.2]),
        ];
        let refs: Vec<&DayProfile> = profiles.iter().collect();
        let report = aggregate_day_profiles(&refs, 3, 25.0, 0.9).expect("aggregate");
        assert!(
            report.max_diversified_kw <= report.max_noncoincident_kw + 1e-12,
            "diversified {} > noncoincident {}",
            report.max_diversified_kw,
            report.max_noncoincident_kw
        );
        assert!(report.diversity_factor >= 1.0 - 1e-12);
    }

    #[test]
    fn non_overlapping_intervals_are_not_filled() {
        // B has one extra interval A lacks; it must appear with B's demand
        // alone, not an interpolated contribution from A.
        let a = profile(1, &[2.0, 4.0]);
        let b = profile(1, &[1.0, 1.0, 5.0]);
        let report =
            aggregate_day_profiles(&[&a, &b], 2, 10.0, 1.0).expect("aggregate");
        let demands: Vec<f64> = report
            .diversified_demand
            .iter()
            .map(|p| p.demand_kw)
            .collect();
        assert_eq!(demands, vec![3.0, 5.0, 5.0]);
    }

    #[test]
    fn empty_selection_is_rejected() {
        let err = aggregate_day_profiles(&[], 0, 10.0, 1.0).expect_err("must fail");
        assert!(matches!(err, AnalysisError::EmptySelection));
    }

    #[test]
    fn all_zero_demand_is_a_distinct_error() {
        let a = profile(1, &[0.0, 0.0, 0.0]);
        let err = aggregate_day_profiles(&[&a], 1, 10.0, 1.0).expect_err("must fail");
        assert!(matches!(err, AnalysisError::ZeroDiversifiedDemand));
    }

    #[test]
    fn net_exporting_selection_has_no_positive_demand() {
        // Negative readings are valid input (behind-the-meter generation);
        // a series that never goes positive leaves the metrics undefined.
        let a = profile(1, &[-2.0, -0.5, -3.1]);
        let err = aggregate_day_profiles(&[&a], 1, 10.0, 1.0).expect_err("must fail");
        assert!(matches!(err, AnalysisError::ZeroDiversifiedDemand));
        assert!(err.to_string().contains("nowhere positive"));
    }

    #[test]
    fn selection_without_intervals_has_undefined_diversity() {
        let empty = profile(1, &[]);
        let err = aggregate_day_profiles(&[&empty], 1, 10.0, 1.0).expect_err("must fail");
        assert!(matches!(err, AnalysisError::ZeroDiversifiedDemand));
    }

    #[test]
    fn utilization_above_one_is_preserved() {
        let a = profile(1, &[30.0, 60.0]);
        let report = aggregate_day_profiles(&[&a], 1, 25.0, 0.9).expect("aggregate");
        // (60 / 0.9) / 25 = 2.666...
        assert!(report.utilization_factor > 1.0);
        assert!((report.utilization_factor - 60.0 / 0.9 / 25.0).abs() < 1e-12);
    }

    #[test]
    fn duration_curve_is_descending_with_rank_percents() {
        let a = profile(1, &[1.0, 4.0, 2.0, 3.0]);
        let report = aggregate_day_profiles(&[&a], 1, 10.0, 1.0).expect("aggregate");
        let ldc = &report.load_duration_curve;
        assert_eq!(ldc.len(), 4);
        let demands: Vec<f64> = ldc.iter().map(|p| p.demand_kw).collect();
        assert_eq!(demands, vec![4.0, 3.0, 2.0, 1.0]);
        let pcts: Vec<f64> = ldc.iter().map(|p| p.pct_of_time).collect();
        assert_eq!(pcts, vec![25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    #[should_panic]
    fn zero_rating_panics() {
        let a = profile(1, &[1.0]);
        let _ = aggregate_day_profiles(&[&a], 1, 0.0, 1.0);
    }
}
