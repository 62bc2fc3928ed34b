//! Virtual Patient - Entry point
//!
//! Runs the closed-loop glucose simulation and writes the per-step time
//! series to CSV.
//!
//! CLI Usage:
//!   cargo run                              # 7 days, glucose_data.csv
//!   cargo run -- out.csv -d 1              # one simulated day
//!   cargo run -- out.csv -s 1000 --summary run.json

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use virtual_patient::{
    config::{Parameters, MINUTES_PER_DAY},
    export::{export_summary_json, CsvExporter, RunSummary},
    Simulation,
};

/// Parsed command-line options
struct Args {
    output: PathBuf,
    days: Option<f64>,
    config_dir: Option<PathBuf>,
    sample_every: u64,
    summary: Option<PathBuf>,
}

/// Parse CLI arguments
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        output: PathBuf::from("glucose_data.csv"),
        days: None,
        config_dir: None,
        sample_every: 1,
        summary: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-d" | "--days" => {
                i += 1;
                if i < args.len() {
                    parsed.days = args[i].parse().ok();
                }
            }
            "-c" | "--config" => {
                i += 1;
                if i < args.len() {
                    parsed.config_dir = Some(PathBuf::from(&args[i]));
                }
            }
            "-s" | "--sample-every" => {
                i += 1;
                if i < args.len() {
                    parsed.sample_every = args[i].parse().unwrap_or(1);
                }
            }
            "--summary" => {
                i += 1;
                if i < args.len() {
                    parsed.summary = Some(PathBuf::from(&args[i]));
                }
            }
            "--help" | "-h" => {
                println!("Virtual Patient");
                println!();
                println!("Usage: virtual-patient [OUTPUT.csv] [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --days D           Simulated days (default: 7)");
                println!("  -c, --config DIR       Parameter directory (default: data/parameters)");
                println!("  -s, --sample-every N   Write every N-th step to CSV (default: 1)");
                println!("  --summary PATH         Write a JSON run summary");
                println!("  --help, -h             Show this help");
                std::process::exit(0);
            }
            other if !other.starts_with('-') => parsed.output = PathBuf::from(other),
            other => log::warn!("Ignoring unknown option {}", other),
        }
        i += 1;
    }

    parsed
}

fn main() -> Result<()> {
    env_logger::init();

    let args = parse_args();

    let mut params = match &args.config_dir {
        Some(dir) => Parameters::load_from_dir(dir),
        None => Parameters::load_or_default(),
    };
    if let Some(days) = args.days {
        params.simulation.duration_min = days * MINUTES_PER_DAY;
    }

    log::info!("Virtual Patient starting...");
    let mut sim = Simulation::new(&params).context("invalid simulation parameters")?;
    let mut exporter = CsvExporter::new(&args.output, args.sample_every)?;

    let start_time = Instant::now();
    let metrics = sim.run(&mut exporter)?;
    let elapsed = start_time.elapsed();
    let csv_path = exporter.finish()?;

    println!("=== Virtual Patient - Results ===");
    println!("Elapsed time: {:.2?}", elapsed);
    println!("Steps: {} ({:.0} steps/s)", metrics.steps, metrics.steps as f64 / elapsed.as_secs_f64());
    println!("Simulated time: {:.1} min", metrics.simulated_min);
    println!("Meals: {}", metrics.meals_started);
    println!();
    println!("Mean glucose: {:.1} mg/dL", metrics.mean_glucose_mg_per_dL());
    println!(
        "Glucose range: {:.1} - {:.1} mg/dL",
        metrics.min_glucose_mg_per_dL, metrics.max_glucose_mg_per_dL
    );
    println!("Time in range (70-180): {:.1}%", metrics.time_in_range_fraction() * 100.0);
    println!(
        "Infusion clamps: {} low, {} high",
        metrics.infusion_clamped_low, metrics.infusion_clamped_high
    );
    println!(
        "Weight norm: {:.2} (max {:.2}, bound {:.0}), {} projected updates",
        sim.network().norm(),
        metrics.max_weight_norm,
        sim.network().bound(),
        metrics.projected_updates
    );
    println!("Time series: {}", csv_path.display());

    if let Some(path) = &args.summary {
        let summary = RunSummary::from_simulation(&sim, &params);
        export_summary_json(&summary, path)?;
        println!("Summary: {}", path.display());
    }

    Ok(())
}
