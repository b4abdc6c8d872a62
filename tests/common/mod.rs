//! Shared dataset fixtures for integration tests.

use std::fs;
use std::io::Write;
use std::path::Path;

use load_diversity::io::reader::OUTPUT_FILE;
use load_diversity::roster::SCHEDULE_FILE;

/// Lays out `<root>/<building>/<upgrade>/` with a non-empty schedule file
/// and an output CSV holding the given 5-minute demands for `date`.
pub fn write_building(
    root: &Path,
    building: &str,
    upgrade: &str,
    date: &str,
    demands_kw: &[f64],
) {
    let dir = root.join(building).join(upgrade);
    fs::create_dir_all(&dir).expect("create building dir");
    fs::write(dir.join(SCHEDULE_FILE), "occupancy\n1\n").expect("schedule");

    let mut out = fs::File::create(dir.join(OUTPUT_FILE)).expect("output file");
    writeln!(out, "Time,Total Electric Power (kW),Total Reactive Power (kVAR)")
        .expect("header");
    for (i, kw) in demands_kw.iter().enumerate() {
        writeln!(out, "{date} 00:{:02}:00,{kw},0.0", 5 * i).expect("row");
    }
}
