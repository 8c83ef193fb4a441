//! balance - Command-line runner for balance_core
//!
//! Loads a project TOML (or the bundled sample), runs one analysis or
//! simulation and prints the result as JSON on stdout. Logs go to stderr.

mod commands;
mod error;

use balance_core::analysis::GrowthTarget;
use balance_core::combat::MonteCarloConfig;
use balance_core::config::{default_project, parse_project, Project};
use balance_core::formula::evaluate;
use balance_core::types::{Metric, StatName};
use clap::{Parser, Subcommand};
use error::CliError;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "balance",
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None,
)]
struct Args {
    /// Project file; the bundled sample is used when omitted
    #[arg(long, short, global = true)]
    project: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a formula without evaluating it
    Check { formula: String },
    /// Evaluate a formula against name=value pairs
    Eval {
        formula: String,
        #[arg(long = "var")]
        vars: Vec<String>,
    },
    /// Print an entity's resolved stats at a level
    Resolve {
        entity: String,
        #[arg(long, short, default_value_t = 1)]
        level: u32,
    },
    /// Print every entity's metric value per level
    Series {
        #[arg(long, short, default_value = "cp")]
        metric: Metric,
        #[arg(long, default_value_t = 50)]
        max_level: u32,
    },
    /// List levels where two entities swap ranking
    Crossover {
        #[arg(long, short, default_value = "cp")]
        metric: Metric,
        #[arg(long, default_value_t = 50)]
        max_level: u32,
    },
    /// Run a battle batch and report the attacker's win rate
    Batch {
        attacker: String,
        defender: String,
        #[arg(long, short, default_value_t = 1)]
        level: u32,
        #[arg(long, short, default_value_t = 1000)]
        trials: u32,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run a Monte Carlo study of one matchup
    Montecarlo {
        attacker: String,
        defender: String,
        #[arg(long, short, default_value_t = 1)]
        level: u32,
        #[arg(long, short, default_value_t = 10_000)]
        trials: u32,
        /// Trials that keep a full event log
        #[arg(long, default_value_t = 5)]
        logs: u32,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Find the growth rate that hits a metric target at a level
    Solve {
        entity: String,
        #[arg(long, short)]
        stat: String,
        #[arg(long, short, default_value = "cp")]
        metric: Metric,
        #[arg(long, short)]
        level: u32,
        #[arg(long, short)]
        target: f64,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_project(path: Option<&Path>) -> Result<Project, CliError> {
    let Some(path) = path else {
        return Ok(default_project());
    };
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let project = parse_project(&content)?;
    info!(
        path = %path.display(),
        entities = project.entities.len(),
        items = project.items.len(),
        "loaded project"
    );
    Ok(project)
}

fn make_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn print<T: Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

fn run(args: Args) -> Result<(), CliError> {
    let pretty = args.pretty;

    match args.command {
        Command::Check { formula } => {
            let report = commands::check(&formula);
            print(&report, pretty)?;
            if let Some(e) = report.error {
                return Err(CliError::Argument(e));
            }
        }
        Command::Eval { formula, vars } => {
            balance_core::check_formula(&formula)?;
            let ctx = commands::parse_vars(&vars)?;
            print(&evaluate(&formula, &ctx), pretty)?;
        }
        Command::Resolve { entity, level } => {
            let project = load_project(args.project.as_deref())?;
            print(&commands::resolve_entity(&project, &entity, level)?, pretty)?;
        }
        Command::Series { metric, max_level } => {
            let project = load_project(args.project.as_deref())?;
            print(&commands::series(&project, metric, max_level), pretty)?;
        }
        Command::Crossover { metric, max_level } => {
            let project = load_project(args.project.as_deref())?;
            print(&commands::crossovers(&project, metric, max_level), pretty)?;
        }
        Command::Batch {
            attacker,
            defender,
            level,
            trials,
            seed,
        } => {
            let project = load_project(args.project.as_deref())?;
            let mut rng = make_rng(seed);
            let result = commands::batch(&project, &attacker, &defender, level, trials, &mut rng)?;
            print(&result, pretty)?;
        }
        Command::Montecarlo {
            attacker,
            defender,
            level,
            trials,
            logs,
            seed,
        } => {
            let project = load_project(args.project.as_deref())?;
            let mut rng = make_rng(seed);
            let config = MonteCarloConfig {
                trials,
                log_samples: logs,
            };
            let result = commands::monte_carlo(&project, &attacker, &defender, level, &config, &mut rng)?;
            print(&result, pretty)?;
        }
        Command::Solve {
            entity,
            stat,
            metric,
            level,
            target,
        } => {
            let project = load_project(args.project.as_deref())?;
            let goal = GrowthTarget {
                stat: StatName::new(&stat),
                metric,
                level,
                value: target,
            };
            print(&commands::solve(&project, &entity, goal)?, pretty)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
