//! Desktop simulator for the fixed-wing rate-PID autotuner.
//!
//! Runs the end-to-end scenarios from the core's test suite against the
//! mock collaborators, without any flight hardware, so the gain law and
//! persistence scheduler can be eyeballed interactively.

mod scenarios;

use autotune_core::TunerConfig;
use clap::Parser;
use std::path::PathBuf;

/// Run autotuner scenarios against the in-memory mock collaborators.
#[derive(Parser, Debug)]
#[command(name = "autotune-sim", version, about)]
struct Cli {
    /// Run one scenario by name (S1..S6). Runs all of them if omitted.
    #[arg(short, long)]
    scenario: Option<String>,

    /// Load gain-law and scheduler constants from a TOML file instead of
    /// the built-in defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the scenario reports as JSON instead of plain text.
    #[arg(long)]
    json: bool,
}

fn load_config(path: &Option<PathBuf>) -> TunerConfig {
    let Some(path) = path else {
        return TunerConfig::default();
    };
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("failed to read config file {}: {err}", path.display());
            std::process::exit(2);
        }
    };
    match toml::from_str(&text) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to parse config file {}: {err}", path.display());
            std::process::exit(2);
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(&cli.config);

    let reports = match &cli.scenario {
        Some(name) => match scenarios::run_named(name, config) {
            Some(report) => vec![report],
            None => {
                eprintln!("unknown scenario '{name}', expected one of S1..S6");
                std::process::exit(2);
            }
        },
        None => scenarios::run_all(config),
    };

    let mut any_failed = false;
    for report in &reports {
        any_failed |= !report.passed;
    }

    if cli.json {
        match serde_json::to_string_pretty(&reports) {
            Ok(text) => println!("{text}"),
            Err(err) => {
                eprintln!("failed to serialize scenario reports: {err}");
                std::process::exit(2);
            }
        }
    } else {
        for report in &reports {
            println!("{} - {}", report.name, report.description);
            for note in &report.notes {
                println!("  {note}");
            }
            println!(
                "  => {}",
                if report.passed { "PASSED" } else { "FAILED" }
            );
        }
    }

    if any_failed {
        std::process::exit(1);
    }
}
