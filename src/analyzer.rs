//! Top-level analyzer: roster resolution, per-building loading and
//! summarizing, and subset aggregation.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::analysis::aggregate::{AggregateReport, aggregate_day_profiles};
use crate::analysis::demand::{DayProfile, DemandSummary};
use crate::error::AnalysisError;
use crate::io::reader::{OUTPUT_FILE, read_load_series};
use crate::roster::{RosterCache, SelectionMode, select_buildings};
use crate::series::{CustomerId, partition_by_day};

/// Loads a selection of building load profiles from a dataset directory and
/// computes per-day and aggregate demand statistics over them.
///
/// One analyzer instance corresponds to one run: `run()` resolves the
/// roster (building it on first use, trusting the cache afterwards), loads
/// every selected building's output file, and keeps the per-day profiles
/// and summaries for later aggregation. Any missing or malformed input
/// aborts the run.
pub struct LoadAnalyzer {
    dataset_dir: PathBuf,
    upgrades: Vec<String>,
    n_buildings: usize,
    mode: SelectionMode,
    cache: RosterCache,
    customers: Vec<CustomerId>,
    profiles: BTreeMap<CustomerId, BTreeMap<NaiveDate, DayProfile>>,
    summaries: BTreeMap<CustomerId, BTreeMap<NaiveDate, DemandSummary>>,
}

impl LoadAnalyzer {
    /// Creates an analyzer. The roster cache is injected so callers decide
    /// where cached building ids live and when to invalidate them.
    pub fn new(
        dataset_dir: impl Into<PathBuf>,
        upgrades: Vec<String>,
        n_buildings: usize,
        mode: SelectionMode,
        cache: RosterCache,
    ) -> Self {
        Self {
            dataset_dir: dataset_dir.into(),
            upgrades,
            n_buildings,
            mode,
            cache,
            customers: Vec::new(),
            profiles: BTreeMap::new(),
            summaries: BTreeMap::new(),
        }
    }

    /// Resolves the roster, selects buildings, and loads and summarizes
    /// every (building, upgrade) time series day by day.
    ///
    /// Returns the customer ids loaded, in selection order per upgrade.
    ///
    /// # Errors
    ///
    /// Fails on roster-cache I/O problems and on any missing or malformed
    /// building output file. No partial result is retained on failure.
    pub fn run(&mut self) -> Result<&[CustomerId], AnalysisError> {
        self.customers.clear();
        self.profiles.clear();
        self.summaries.clear();

        let roster = self
            .cache
            .load_or_build(&self.dataset_dir, &self.upgrades)?;
        let selected = select_buildings(&roster, self.n_buildings, &self.mode);

        for upgrade in &self.upgrades {
            for building in &selected {
                let path = self
                    .dataset_dir
                    .join(building)
                    .join(upgrade)
                    .join(OUTPUT_FILE);
                let samples = read_load_series(&path)?;

                let id = CustomerId::new(building.clone(), upgrade.clone());
                for (day, day_samples) in partition_by_day(&samples) {
                    let profile = DayProfile::from_samples(day, &day_samples);
                    let summary = profile.summarize();
                    self.profiles
                        .entry(id.clone())
                        .or_default()
                        .insert(day, profile);
                    self.summaries
                        .entry(id.clone())
                        .or_default()
                        .insert(day, summary);
                }
                self.customers.push(id);
            }
        }

        Ok(&self.customers)
    }

    /// Customer ids loaded by the last `run()`.
    pub fn customers(&self) -> &[CustomerId] {
        &self.customers
    }

    /// Per-day profiles for one customer, keyed by date.
    pub fn day_profiles(&self, id: &CustomerId) -> Option<&BTreeMap<NaiveDate, DayProfile>> {
        self.profiles.get(id)
    }

    /// Per-day summaries for one customer, keyed by date.
    pub fn day_summaries(&self, id: &CustomerId) -> Option<&BTreeMap<NaiveDate, DemandSummary>> {
        self.summaries.get(id)
    }

    /// Iterates every (customer, day, summary) triple in customer order.
    pub fn all_summaries(
        &self,
    ) -> impl Iterator<Item = (&CustomerId, NaiveDate, &DemandSummary)> {
        self.customers.iter().flat_map(move |id| {
            self.summaries
                .get(id)
                .into_iter()
                .flat_map(move |days| days.iter().map(move |(day, s)| (id, *day, s)))
        })
    }

    /// Aggregates every day-slice of the given customers (or of all loaded
    /// customers when `ids` is `None`) for a transformer of the given
    /// rating and assumed power factor. An id listed more than once counts
    /// once; stacking the same profile twice would inflate the diversified
    /// series.
    ///
    /// # Errors
    ///
    /// * [`AnalysisError::EmptySelection`] for an empty id list.
    /// * [`AnalysisError::UnknownCustomer`] for an id the run never loaded.
    /// * [`AnalysisError::ZeroDiversifiedDemand`] when the selection has no
    ///   positive demand anywhere.
    pub fn aggregate(
        &self,
        ids: Option<&[CustomerId]>,
        transformer_kva: f64,
        power_factor: f64,
    ) -> Result<AggregateReport, AnalysisError> {
        let candidates: Vec<&CustomerId> = match ids {
            Some(list) => list.iter().collect(),
            None => self.customers.iter().collect(),
        };
        if candidates.is_empty() {
            return Err(AnalysisError::EmptySelection);
        }

        let mut selected: Vec<&CustomerId> = Vec::new();
        for id in candidates {
            if !self.customers.contains(id) {
                return Err(AnalysisError::UnknownCustomer { id: id.to_string() });
            }
            if !selected.contains(&id) {
                selected.push(id);
            }
        }

        let mut day_profiles: Vec<&DayProfile> = Vec::new();
        for id in &selected {
            if let Some(days) = self.profiles.get(*id) {
                day_profiles.extend(days.values());
            }
        }

        aggregate_day_profiles(
            &day_profiles,
            selected.len(),
            transformer_kva,
            power_factor,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::path::Path;

    use crate::roster::SCHEDULE_FILE;

    /// Lays out `<root>/<building>/<upgrade>/` with a schedule file and an
    /// output CSV holding the given 5-minute demands.
    fn write_building(root: &Path, building: &str, upgrade: &str, demands_kw: &[f64]) {
        let dir = root.join(building).join(upgrade);
        fs::create_dir_all(&dir).expect("create building dir");
        fs::write(dir.join(SCHEDULE_FILE), "occupancy\n1\n").expect("schedule");

        let mut out = fs::File::create(dir.join(OUTPUT_FILE)).expect("output file");
        writeln!(out, "Time,Total Electric Power (kW),Total Reactive Power (kVAR)")
            .expect("header");
        for (i, kw) in demands_kw.iter().enumerate() {
            writeln!(
                out,
                "2025-06-01 00:{:02}:00,{kw},0.0",
                5 * i
            )
            .expect("row");
        }
    }

    fn analyzer_for(root: &Path, cache_path: &Path, n: usize) -> LoadAnalyzer {
        LoadAnalyzer::new(
            root,
            vec!["up00".to_string()],
            n,
            SelectionMode::FirstN,
            RosterCache::new(cache_path),
        )
    }

    #[test]
    fn run_loads_selected_buildings_and_summaries() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_building(dir.path(), "a", "up00", &[2.0, 4.0, 6.0]);
        write_building(dir.path(), "b", "up00", &[1.0, 1.0, 1.0]);

        let mut analyzer = analyzer_for(dir.path(), &dir.path().join("roster.csv"), 2);
        let customers = analyzer.run().expect("run").to_vec();
        assert_eq!(customers.len(), 2);

        let a = &customers[0];
        let summaries = analyzer.day_summaries(a).expect("summaries for a");
        assert_eq!(summaries.len(), 1);
        let summary = summaries.values().next().expect("one day");
        assert_eq!(summary.max_demand_kw, Some(6.0));
    }

    #[test]
    fn aggregate_matches_worked_example() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_building(dir.path(), "a", "up00", &[2.0, 4.0, 6.0]);
        write_building(dir.path(), "b", "up00", &[1.0, 1.0, 1.0]);

        let mut analyzer = analyzer_for(dir.path(), &dir.path().join("roster.csv"), 2);
        analyzer.run().expect("run");

        let report = analyzer.aggregate(None, 10.0, 1.0).expect("aggregate");
        assert_eq!(report.max_diversified_kw, 7.0);
        assert_eq!(report.max_noncoincident_kw, 7.0);
        assert!((report.diversity_factor - 1.0).abs() < 1e-12);
        assert!((report.utilization_factor - 0.7).abs() < 1e-12);
    }

    #[test]
    fn over_request_degrades_instead_of_failing() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_building(dir.path(), "a", "up00", &[1.0]);
        write_building(dir.path(), "b", "up00", &[2.0]);

        let mut analyzer = analyzer_for(dir.path(), &dir.path().join("roster.csv"), 5);
        let customers = analyzer.run().expect("run must not fail");
        assert_eq!(customers.len(), 2);
    }

    #[test]
    fn missing_output_file_halts_the_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_building(dir.path(), "a", "up00", &[1.0]);
        // Building qualifies by schedule but its output file is gone.
        write_building(dir.path(), "b", "up00", &[1.0]);
        fs::remove_file(dir.path().join("b").join("up00").join(OUTPUT_FILE))
            .expect("remove output");

        let mut analyzer = analyzer_for(dir.path(), &dir.path().join("roster.csv"), 2);
        let err = analyzer.run().expect_err("must fail");
        assert!(matches!(err, AnalysisError::MissingInput { .. }));
    }

    #[test]
    fn aggregate_with_unknown_customer_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_building(dir.path(), "a", "up00", &[1.0]);

        let mut analyzer = analyzer_for(dir.path(), &dir.path().join("roster.csv"), 1);
        analyzer.run().expect("run");

        let ghost = vec![CustomerId::new("ghost", "up00")];
        let err = analyzer
            .aggregate(Some(&ghost), 10.0, 1.0)
            .expect_err("must fail");
        assert!(matches!(err, AnalysisError::UnknownCustomer { .. }));
    }

    #[test]
    fn duplicate_ids_in_a_selection_count_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_building(dir.path(), "a", "up00", &[2.0, 4.0, 6.0]);
        write_building(dir.path(), "b", "up00", &[1.0, 1.0, 1.0]);

        let mut analyzer = analyzer_for(dir.path(), &dir.path().join("roster.csv"), 2);
        analyzer.run().expect("run");

        let a = CustomerId::new("a", "up00");
        let doubled = vec![a.clone(), a.clone()];
        let report = analyzer
            .aggregate(Some(&doubled), 10.0, 1.0)
            .expect("aggregate");
        assert_eq!(report.n_customers, 1);
        assert_eq!(report.max_diversified_kw, 6.0);

        let single = analyzer
            .aggregate(Some(&[a]), 10.0, 1.0)
            .expect("aggregate");
        assert_eq!(report.max_noncoincident_kw, single.max_noncoincident_kw);
    }

    #[test]
    fn aggregate_with_empty_id_list_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_building(dir.path(), "a", "up00", &[1.0]);

        let mut analyzer = analyzer_for(dir.path(), &dir.path().join("roster.csv"), 1);
        analyzer.run().expect("run");

        let err = analyzer
            .aggregate(Some(&[]), 10.0, 1.0)
            .expect_err("must fail");
        assert!(matches!(err, AnalysisError::EmptySelection));
    }
}
