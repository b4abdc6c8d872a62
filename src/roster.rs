//! Dataset roster: which buildings are usable, cached to a side file, and
//! how a subset of them is selected for a run.

use std::fs;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::AnalysisError;

/// Per-building file that must exist and be non-empty for the building to
/// qualify for the roster.
pub const SCHEDULE_FILE: &str = "in.schedules.csv";

/// How buildings are drawn from the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionMode {
    /// First N entries in roster order. Stable and reproducible.
    FirstN,
    /// N entries without replacement. Unseeded draws use OS entropy, so two
    /// invocations may differ; pass a seed for reproducible fixtures.
    Randomized {
        /// Optional RNG seed.
        seed: Option<u64>,
    },
}

/// Scans the immediate subdirectories of `root` and returns the buildings
/// whose schedule file exists and is non-empty for at least one listed
/// upgrade. Loading a rostered building under an upgrade it lacks still
/// fails with a missing-input error.
///
/// Entries are sorted by name so roster order is stable across runs and
/// platforms.
///
/// # Errors
///
/// Returns an error if `root` cannot be read.
pub fn scan_dataset(root: &Path, upgrades: &[String]) -> Result<Vec<String>, AnalysisError> {
    let entries = fs::read_dir(root).map_err(|e| AnalysisError::io(root, e))?;

    let mut buildings = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AnalysisError::io(root, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();

        let qualifies = upgrades.iter().any(|upgrade| {
            let schedule = path.join(upgrade).join(SCHEDULE_FILE);
            schedule
                .metadata()
                .map(|m| m.is_file() && m.len() > 0)
                .unwrap_or(false)
        });
        if qualifies {
            buildings.push(name);
        }
    }

    buildings.sort();
    Ok(buildings)
}

/// Cache of validated building ids, one per line.
///
/// The cache path is injected at construction rather than implied by the
/// working directory. An existing cache is trusted as-is with no staleness
/// check; delete the file to force a re-scan. Concurrent analyzers writing
/// the same cache race last-writer-wins.
#[derive(Debug, Clone)]
pub struct RosterCache {
    path: PathBuf,
}

impl RosterCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a cache file already exists.
    pub fn is_present(&self) -> bool {
        self.path.is_file()
    }

    /// Reads the cached roster, skipping blank lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache file cannot be read.
    pub fn read(&self) -> Result<Vec<String>, AnalysisError> {
        let content =
            fs::read_to_string(&self.path).map_err(|e| AnalysisError::io(&self.path, e))?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Writes the roster, one building id per line.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache file cannot be written.
    pub fn write(&self, buildings: &[String]) -> Result<(), AnalysisError> {
        let mut content = buildings.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(&self.path, content).map_err(|e| AnalysisError::io(&self.path, e))
    }

    /// Returns the cached roster, scanning the dataset and writing a fresh
    /// cache when none exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan or the cache read/write fails.
    pub fn load_or_build(
        &self,
        root: &Path,
        upgrades: &[String],
    ) -> Result<Vec<String>, AnalysisError> {
        if self.is_present() {
            return self.read();
        }
        eprintln!(
            "roster cache \"{}\" not found; scanning \"{}\"",
            self.path.display(),
            root.display()
        );
        let buildings = scan_dataset(root, upgrades)?;
        self.write(&buildings)?;
        Ok(buildings)
    }
}

/// Draws `requested` buildings from the roster according to `mode`.
///
/// Requesting more buildings than the roster holds is not an error: the full
/// roster is returned and a notice is printed.
pub fn select_buildings(
    roster: &[String],
    requested: usize,
    mode: &SelectionMode,
) -> Vec<String> {
    let count = if requested > roster.len() {
        eprintln!(
            "requested {requested} buildings but only {} are available; using {}",
            roster.len(),
            roster.len()
        );
        roster.len()
    } else {
        requested
    };

    match mode {
        SelectionMode::FirstN => roster[..count].to_vec(),
        SelectionMode::Randomized { seed } => {
            let mut rng = match seed {
                Some(s) => StdRng::seed_from_u64(*s),
                None => StdRng::from_os_rng(),
            };
            rand::seq::index::sample(&mut rng, roster.len(), count)
                .into_iter()
                .map(|i| roster[i].clone())
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn make_dataset(upgrades: &[&str], buildings: &[(&str, bool)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        for (name, has_schedule) in buildings {
            for upgrade in upgrades {
                let up_dir = dir.path().join(name).join(upgrade);
                fs::create_dir_all(&up_dir).expect("create upgrade dir");
                if *has_schedule {
                    let mut f = File::create(up_dir.join(SCHEDULE_FILE)).expect("schedule");
                    writeln!(f, "header").expect("write schedule");
                }
            }
        }
        dir
    }

    #[test]
    fn scan_includes_only_buildings_with_schedules() {
        let upgrades = vec!["up00".to_string()];
        let dir = make_dataset(&["up00"], &[("b2", true), ("b1", true), ("b3", false)]);
        let roster = scan_dataset(dir.path(), &upgrades).expect("scan");
        assert_eq!(roster, vec!["b1".to_string(), "b2".to_string()]);
    }

    #[test]
    fn scan_admits_buildings_with_a_partial_upgrade_set() {
        let upgrades = vec!["up00".to_string(), "up05".to_string()];
        // Building "a" has a schedule under up00 only.
        let dir = make_dataset(&["up00"], &[("a", true)]);
        let roster = scan_dataset(dir.path(), &upgrades).expect("scan");
        assert_eq!(roster, vec!["a".to_string()]);
    }

    #[test]
    fn scan_rejects_empty_schedule_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let up_dir = dir.path().join("b1").join("up00");
        fs::create_dir_all(&up_dir).expect("dirs");
        File::create(up_dir.join(SCHEDULE_FILE)).expect("empty schedule");
        let roster = scan_dataset(dir.path(), &["up00".to_string()]).expect("scan");
        assert!(roster.is_empty());
    }

    #[test]
    fn scan_order_is_sorted_and_stable() {
        let upgrades = vec!["up00".to_string()];
        let dir = make_dataset(&["up00"], &[("z", true), ("a", true), ("m", true)]);
        let first = scan_dataset(dir.path(), &upgrades).expect("scan");
        let second = scan_dataset(dir.path(), &upgrades).expect("scan");
        assert_eq!(first, vec!["a", "m", "z"]);
        assert_eq!(first, second);
    }

    #[test]
    fn cache_round_trips_and_skips_blank_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = RosterCache::new(dir.path().join("roster.csv"));
        assert!(!cache.is_present());

        cache
            .write(&["b1".to_string(), "b2".to_string()])
            .expect("write");
        assert!(cache.is_present());
        assert_eq!(cache.read().expect("read"), vec!["b1", "b2"]);

        fs::write(cache.path(), "b1\n\n  \nb2\n").expect("rewrite");
        assert_eq!(cache.read().expect("read"), vec!["b1", "b2"]);
    }

    #[test]
    fn load_or_build_trusts_existing_cache() {
        let upgrades = vec!["up00".to_string()];
        let dataset = make_dataset(&["up00"], &[("real", true)]);
        let cache_dir = tempfile::tempdir().expect("tempdir");
        let cache = RosterCache::new(cache_dir.path().join("roster.csv"));
        cache.write(&["stale".to_string()]).expect("seed cache");

        let roster = cache
            .load_or_build(dataset.path(), &upgrades)
            .expect("load");
        assert_eq!(roster, vec!["stale"]);
    }

    fn roster_of(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("b{i:03}")).collect()
    }

    #[test]
    fn first_n_selection_is_reproducible() {
        let roster = roster_of(6);
        let a = select_buildings(&roster, 3, &SelectionMode::FirstN);
        let b = select_buildings(&roster, 3, &SelectionMode::FirstN);
        assert_eq!(a, b);
        assert_eq!(a, vec!["b000", "b001", "b002"]);
    }

    #[test]
    fn randomized_full_draw_is_a_permutation() {
        let roster = roster_of(8);
        let picked = select_buildings(
            &roster,
            8,
            &SelectionMode::Randomized { seed: Some(7) },
        );
        let mut sorted = picked.clone();
        sorted.sort();
        assert_eq!(sorted, roster);
    }

    #[test]
    fn randomized_draw_with_seed_is_reproducible() {
        let roster = roster_of(20);
        let mode = SelectionMode::Randomized { seed: Some(42) };
        let a = select_buildings(&roster, 5, &mode);
        let b = select_buildings(&roster, 5, &mode);
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn over_request_degrades_to_full_roster() {
        let roster = roster_of(2);
        let picked = select_buildings(&roster, 5, &SelectionMode::FirstN);
        assert_eq!(picked, roster);
    }
}
