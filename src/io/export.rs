//! CSV export of aggregate results for external plotting and reporting.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::analysis::aggregate::AggregateReport;
use crate::analysis::regression::{LinearFit, SurveyPoint};

/// Column header for the diversified demand series.
const DIVERSIFIED_HEADER: &str = "interval_start,diversified_demand_kw";

/// Column header for the load duration curve.
const DURATION_HEADER: &str = "diversified_demand_kw,pct_of_time";

/// Column header for the one-row aggregate summary.
const SUMMARY_HEADER: &str = "n_customers,transformer_kva,power_factor,\
                              max_diversified_kw,max_noncoincident_kw,\
                              diversity_factor,load_diversity_kw,utilization_factor";

/// Column header for load-survey points.
const SURVEY_HEADER: &str = "energy_kwh,peak_kw";

/// Column header for the one-row survey regression result.
const REGRESSION_HEADER: &str = "intercept_a,slope_b,r_squared,equation";

const TIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes the diversified demand series as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_diversified_csv(report: &AggregateReport, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(DIVERSIFIED_HEADER.split(','))?;
    for point in &report.diversified_demand {
        wtr.write_record(&[
            point.interval_start.format(TIME_FMT).to_string(),
            format!("{:.6}", point.demand_kw),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the load duration curve as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_duration_curve_csv(report: &AggregateReport, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(DURATION_HEADER.split(','))?;
    for point in &report.load_duration_curve {
        wtr.write_record(&[
            format!("{:.6}", point.demand_kw),
            format!("{:.6}", point.pct_of_time),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the scalar aggregate metrics as a one-row CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_summary_csv(report: &AggregateReport, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SUMMARY_HEADER.split(',').map(str::trim))?;
    wtr.write_record(&[
        report.n_customers.to_string(),
        format!("{:.2}", report.transformer_kva),
        format!("{:.4}", report.power_factor),
        format!("{:.6}", report.max_diversified_kw),
        format!("{:.6}", report.max_noncoincident_kw),
        format!("{:.6}", report.diversity_factor),
        format!("{:.6}", report.load_diversity_kw),
        format!("{:.6}", report.utilization_factor),
    ])?;
    wtr.flush()?;
    Ok(())
}

/// Writes survey points and, when a fit was possible, the regression row.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_survey_csv(
    points: &[SurveyPoint],
    fit: Option<&LinearFit>,
    points_writer: impl Write,
    fit_writer: impl Write,
) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(points_writer);
    wtr.write_record(SURVEY_HEADER.split(','))?;
    for p in points {
        wtr.write_record(&[
            format!("{:.6}", p.energy_kwh),
            format!("{:.6}", p.peak_kw),
        ])?;
    }
    wtr.flush()?;

    let mut wtr = csv::WriterBuilder::new().from_writer(fit_writer);
    wtr.write_record(REGRESSION_HEADER.split(','))?;
    if let Some(fit) = fit {
        wtr.write_record(&[
            format!("{:.6}", fit.intercept),
            format!("{:.6}", fit.slope),
            format!("{:.6}", fit.r_squared),
            fit.equation(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Exports all aggregate result tables into `out_dir`, creating it first.
///
/// Produces `diversified_demand.csv`, `load_duration_curve.csv`, and
/// `aggregate_summary.csv`.
///
/// # Errors
///
/// Returns an `io::Error` if directory creation or any write fails.
pub fn export_aggregate(report: &AggregateReport, out_dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(out_dir)?;
    write_diversified_csv(
        report,
        io::BufWriter::new(File::create(out_dir.join("diversified_demand.csv"))?),
    )?;
    write_duration_curve_csv(
        report,
        io::BufWriter::new(File::create(out_dir.join("load_duration_curve.csv"))?),
    )?;
    write_summary_csv(
        report,
        io::BufWriter::new(File::create(out_dir.join("aggregate_summary.csv"))?),
    )
}

/// Exports survey points and regression into `out_dir` as
/// `survey_points.csv` and `survey_regression.csv`.
///
/// # Errors
///
/// Returns an `io::Error` if directory creation or any write fails.
pub fn export_survey(
    points: &[SurveyPoint],
    fit: Option<&LinearFit>,
    out_dir: &Path,
) -> io::Result<()> {
    std::fs::create_dir_all(out_dir)?;
    write_survey_csv(
        points,
        fit,
        io::BufWriter::new(File::create(out_dir.join("survey_points.csv"))?),
        io::BufWriter::new(File::create(out_dir.join("survey_regression.csv"))?),
    )
}
