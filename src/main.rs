//! Load diversity CLI entry point: argument wiring and config-driven runs.

use std::path::{Path, PathBuf};
use std::process;

use load_diversity::analysis::regression::{fit_survey, survey_points};
use load_diversity::analyzer::LoadAnalyzer;
use load_diversity::config::AnalysisConfig;
use load_diversity::io::export::{export_aggregate, export_survey};
use load_diversity::roster::{RosterCache, SelectionMode};

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    dataset: Option<String>,
    n_buildings: Option<usize>,
    randomized: bool,
    seed: Option<u64>,
    rating_kva: Option<f64>,
    power_factor: Option<f64>,
    out_dir: Option<String>,
    survey: bool,
}

fn print_help() {
    eprintln!("load-diversity — demand diversity statistics over building load profiles");
    eprintln!();
    eprintln!("Usage: load-diversity [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>      Load analysis settings from a TOML file");
    eprintln!("  --dataset <path>     Dataset root (one subdirectory per building)");
    eprintln!("  --buildings <n>      Number of buildings to analyze");
    eprintln!("  --randomized         Draw a random subset instead of the roster head");
    eprintln!("  --seed <u64>         Seed for the randomized draw");
    eprintln!("  --kva <f64>          Transformer rating in kVA");
    eprintln!("  --pf <f64>           Assumed power factor");
    eprintln!("  --out-dir <path>     Export result tables as CSV into this directory");
    eprintln!("  --survey             Fit the peak-vs-energy load survey regression");
    eprintln!("  --help               Show this help message");
    eprintln!();
    eprintln!("Command-line options override values from --config.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        dataset: None,
        n_buildings: None,
        randomized: false,
        seed: None,
        rating_kva: None,
        power_factor: None,
        out_dir: None,
        survey: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --config requires a path argument");
                    process::exit(1);
                }
                cli.config_path = Some(args[i].clone());
            }
            "--dataset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --dataset requires a path argument");
                    process::exit(1);
                }
                cli.dataset = Some(args[i].clone());
            }
            "--buildings" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --buildings requires a count argument");
                    process::exit(1);
                }
                match args[i].parse::<usize>() {
                    Ok(n) => cli.n_buildings = Some(n),
                    Err(_) => {
                        eprintln!(
                            "error: --buildings value \"{}\" is not a valid count",
                            args[i]
                        );
                        process::exit(1);
                    }
                }
            }
            "--randomized" => {
                cli.randomized = true;
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                match args[i].parse::<u64>() {
                    Ok(s) => cli.seed = Some(s),
                    Err(_) => {
                        eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                        process::exit(1);
                    }
                }
            }
            "--kva" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --kva requires a numeric argument");
                    process::exit(1);
                }
                match args[i].parse::<f64>() {
                    Ok(v) => cli.rating_kva = Some(v),
                    Err(_) => {
                        eprintln!("error: --kva value \"{}\" is not a valid number", args[i]);
                        process::exit(1);
                    }
                }
            }
            "--pf" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --pf requires a numeric argument");
                    process::exit(1);
                }
                match args[i].parse::<f64>() {
                    Ok(v) => cli.power_factor = Some(v),
                    Err(_) => {
                        eprintln!("error: --pf value \"{}\" is not a valid number", args[i]);
                        process::exit(1);
                    }
                }
            }
            "--out-dir" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --out-dir requires a path argument");
                    process::exit(1);
                }
                cli.out_dir = Some(args[i].clone());
            }
            "--survey" => {
                cli.survey = true;
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn main() {
    let cli = parse_args();

    // Load config from file if given, then layer CLI overrides on top.
    let mut cfg = if let Some(ref path) = cli.config_path {
        match AnalysisConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        AnalysisConfig::default()
    };

    if let Some(ref dataset) = cli.dataset {
        cfg.dataset.root_dir = dataset.clone();
    }
    if let Some(n) = cli.n_buildings {
        cfg.selection.n_buildings = n;
    }
    if cli.randomized {
        cfg.selection.randomized = true;
    }
    if let Some(seed) = cli.seed {
        cfg.selection.seed = Some(seed);
    }
    if let Some(kva) = cli.rating_kva {
        cfg.transformer.rating_kva = kva;
    }
    if let Some(pf) = cli.power_factor {
        cfg.transformer.power_factor = pf;
    }

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let mode = if cfg.selection.randomized {
        SelectionMode::Randomized {
            seed: cfg.selection.seed,
        }
    } else {
        SelectionMode::FirstN
    };
    let cache = RosterCache::new(PathBuf::from(&cfg.dataset.cache_file));
    let mut analyzer = LoadAnalyzer::new(
        PathBuf::from(&cfg.dataset.root_dir),
        cfg.dataset.upgrades.clone(),
        cfg.selection.n_buildings,
        mode,
        cache,
    );

    if let Err(e) = analyzer.run() {
        eprintln!("error: {e}");
        process::exit(1);
    }

    // Per-customer-day summaries.
    for (id, day, summary) in analyzer.all_summaries() {
        println!("{id} {day}: {summary}");
    }

    let report = match analyzer.aggregate(
        None,
        cfg.transformer.rating_kva,
        cfg.transformer.power_factor,
    ) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    println!("\n{report}");

    if cli.survey {
        let points = survey_points(analyzer.all_summaries().map(|(_, _, s)| s));
        match fit_survey(&points) {
            Some(fit) => println!("\nLoad survey fit: {}", fit.equation()),
            None => eprintln!("notice: not enough distinct survey points for a fit"),
        }
        if let Some(ref out) = cli.out_dir {
            let fit = fit_survey(&points);
            if let Err(e) = export_survey(&points, fit.as_ref(), Path::new(out)) {
                eprintln!("error: failed to write survey CSV: {e}");
                process::exit(1);
            }
        }
    }

    if let Some(ref out) = cli.out_dir {
        if let Err(e) = export_aggregate(&report, Path::new(out)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Results written to {out}");
    }
}
