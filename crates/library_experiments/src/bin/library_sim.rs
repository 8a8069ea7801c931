//! Library simulation CLI
//!
//! `run` executes a single simulated day and prints the final metrics plus a window of
//! state rows. `sweep` runs a parameter grid in parallel and exports the results.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use library_core::{select_rows, LibraryConfig, LibrarySimulation, SimulationReport, SnapshotRow};
use library_experiments::{
    export_to_json, load_config, run_parallel_experiments_with_progress, write_report_json,
    write_results_json, ExperimentError, ParameterSpace,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "library-sim")]
#[command(about = "Discrete-event simulation of a library service counter")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single simulation and print its metrics
    Run {
        /// TOML config file; defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the closing time in minutes
        #[arg(long)]
        horizon: Option<f64>,

        /// First simulated minute of the printed row window
        #[arg(long, default_value = "0")]
        from_time: f64,

        /// Number of rows to print
        #[arg(long, default_value = "10")]
        rows: usize,

        /// Dump the full report as JSON to stdout instead
        #[arg(long)]
        json: bool,
    },

    /// Run a parameter grid in parallel and export the results
    Sweep {
        /// TOML config file used as the base of every run
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Capacities to try (comma-separated)
        #[arg(long, value_delimiter = ',')]
        capacity: Vec<usize>,

        /// Employee counts to try (comma-separated)
        #[arg(long, value_delimiter = ',')]
        employees: Vec<usize>,

        /// Seeds per combination
        #[arg(long, default_value = "5")]
        replications: usize,

        /// Seed of the first replication
        #[arg(long, default_value = "1")]
        first_seed: u64,

        /// Worker threads; rayon's default when omitted
        #[arg(long)]
        threads: Option<usize>,

        /// Output JSON file; results go to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },
}

fn base_config(path: Option<&PathBuf>) -> Result<LibraryConfig, ExperimentError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(LibraryConfig::default()),
    }
}

fn print_row(row: &SnapshotRow) {
    let employees: Vec<String> = row
        .library
        .employees
        .iter()
        .map(|employee| match employee.serving {
            Some(person) => format!("{}:{}", employee.id, person),
            None => format!("{}:free", employee.id),
        })
        .collect();
    println!(
        "{:>5}  t={:>8.3}  {:<16} inside={:>3}/{:<3} queue={:>3} reading={:>3} closed={:<5} [{}]",
        row.sequence,
        row.clock,
        row.event_label(),
        row.library.persons_inside,
        row.library.capacity,
        row.library.queue.len(),
        row.library.reading.len(),
        row.library.closed,
        employees.join(" "),
    );
}

fn print_report(simulation: &LibrarySimulation, report: &SimulationReport, from_time: f64, rows: usize) {
    let metrics = simulation.compute_final_metrics();

    println!("=== Rows from t={from_time} ===");
    for row in select_rows(&report.rows, from_time, rows) {
        print_row(row);
    }

    println!("\n=== Final Metrics ({:?}) ===", report.status);
    println!("Simulated time: {:.2} min", metrics.total_simulated_time);
    println!(
        "Arrivals: {} (requests {}, returns {}, inquiries {})",
        metrics.arrivals, metrics.requests, metrics.returns, metrics.inquiries
    );
    println!("Departures: {}", metrics.departures);
    println!("Rejections: {}", metrics.rejections);
    println!("Still inside: {}", metrics.still_inside);
    println!("Mean residence time: {:.3} min", metrics.mean_residence_time);
    println!(
        "Time closed: {:.3} min ({:.2}%)",
        metrics.closed_time, metrics.percent_time_closed
    );
}

fn run_command(
    config: Option<PathBuf>,
    seed: Option<u64>,
    horizon: Option<f64>,
    from_time: f64,
    rows: usize,
    json: bool,
) -> Result<(), ExperimentError> {
    let mut config = base_config(config.as_ref())?;
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    if let Some(horizon) = horizon {
        config = config.with_horizon(horizon);
    }

    let mut simulation = LibrarySimulation::initialize(config)?;
    let report = simulation.run();

    if json {
        write_report_json(&report, io::stdout().lock())
    } else {
        print_report(&simulation, &report, from_time, rows);
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn sweep_command(
    config: Option<PathBuf>,
    capacity: Vec<usize>,
    employees: Vec<usize>,
    replications: usize,
    first_seed: u64,
    threads: Option<usize>,
    output: Option<PathBuf>,
    no_progress: bool,
) -> Result<(), ExperimentError> {
    let base = base_config(config.as_ref())?;
    let parameter_sets = ParameterSpace::grid()
        .with_base(base)
        .capacity(capacity)
        .employees(employees)
        .replications(first_seed, replications)
        .generate();
    info!(runs = parameter_sets.len(), "starting sweep");

    let results = run_parallel_experiments_with_progress(parameter_sets, threads, !no_progress)?;
    match output {
        Some(path) => {
            export_to_json(&results, &path)?;
            info!(runs = results.len(), output = %path.display(), "sweep exported");
            Ok(())
        }
        None => write_results_json(&results, io::stdout().lock()),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            config,
            seed,
            horizon,
            from_time,
            rows,
            json,
        } => run_command(config, seed, horizon, from_time, rows, json),
        Commands::Sweep {
            config,
            capacity,
            employees,
            replications,
            first_seed,
            threads,
            output,
            no_progress,
        } => sweep_command(
            config,
            capacity,
            employees,
            replications,
            first_seed,
            threads,
            output,
            no_progress,
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "library-sim failed");
            ExitCode::FAILURE
        }
    }
}
