//! Load-survey regression: peak demand as a linear function of daily
//! energy, fitted by ordinary least squares.

use crate::analysis::demand::DemandSummary;

/// One survey observation: a building-day's energy and its peak demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurveyPoint {
    /// Daily energy (kWh).
    pub energy_kwh: f64,
    /// Daily peak demand (kW).
    pub peak_kw: f64,
}

/// Least-squares line `y = intercept + slope * x` with its fit quality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
    /// Coefficient of determination in `[0, 1]`.
    pub r_squared: f64,
}

impl LinearFit {
    /// The fitted relation in the form used by survey reports.
    pub fn equation(&self) -> String {
        format!(
            "kW_peak = {:.4} + {:.6} x kWh",
            self.intercept, self.slope
        )
    }

    /// Predicted peak demand for a given daily energy.
    pub fn predict(&self, energy_kwh: f64) -> f64 {
        self.intercept + self.slope * energy_kwh
    }
}

/// Fits `y` against `x` by ordinary least squares.
///
/// Returns `None` for fewer than two points, mismatched lengths, or zero
/// variance in `x` (a vertical line has no finite slope).
pub fn fit_linear(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    // A constant y is fitted exactly by the horizontal line.
    let r_squared = if syy > 0.0 { (sxy * sxy) / (sxx * syy) } else { 1.0 };

    Some(LinearFit {
        intercept,
        slope,
        r_squared,
    })
}

/// Extracts survey points from building-day summaries, skipping days whose
/// energy or peak is not available.
pub fn survey_points<'a>(
    summaries: impl IntoIterator<Item = &'a DemandSummary>,
) -> Vec<SurveyPoint> {
    summaries
        .into_iter()
        .filter_map(|s| {
            Some(SurveyPoint {
                energy_kwh: s.total_energy_kwh?,
                peak_kw: s.max_demand_kw?,
            })
        })
        .collect()
}

/// Fits peak demand against daily energy over a set of survey points.
pub fn fit_survey(points: &[SurveyPoint]) -> Option<LinearFit> {
    let x: Vec<f64> = points.iter().map(|p| p.energy_kwh).collect();
    let y: Vec<f64> = points.iter().map(|p| p.peak_kw).collect();
    fit_linear(&x, &y)
}
