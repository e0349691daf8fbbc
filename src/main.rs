mod aggregate;
mod config;
mod error;
mod pagereq;
mod pipeline;
mod report;
mod results_dir;
mod schema;
mod stats;
mod trial;

use aggregate::Query;
use clap::{Parser, Subcommand};
use config::BenchConfig;
use error::PipelineError;
use pipeline::{Pipeline, Sweep};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use trial::TrialType;

/// Parse repeated benchmark result logs and print per-trial CSV rows or
/// per-configuration TSV summaries.
#[derive(Parser, Debug)]
#[command(name = "benchsum", version, about)]
pub struct Cli {
    /// Config file path (default: benchsum.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the result files (overrides config)
    #[arg(short, long, global = true)]
    results_dir: Option<PathBuf>,

    /// Trials per configuration (overrides config)
    #[arg(long, global = true)]
    trials: Option<u32>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// One tab-separated summary row per (type, rate) over the whole sweep
    Summary {
        /// Query whose fields to summarize (1 or 3)
        #[arg(value_name = "QUERY")]
        query: Query,
    },
    /// Comma-separated rows for every trial of one configuration
    Trials {
        /// Trial type: t (threshold) or p (probabilistic)
        #[arg(value_name = "TYPE")]
        trial_type: TrialType,
        #[arg(value_name = "RATE")]
        rate: u32,
        /// Query whose fields to print (1 or 3)
        #[arg(short, long, default_value = "1")]
        query: Query,
    },
    /// Comma-separated rows for every trial of the whole sweep
    Sweep {
        /// Query whose fields to print (1 or 3)
        #[arg(short, long, default_value = "1")]
        query: Query,
    },
    /// Print the resolved settings and the files a run would read, don't parse
    Plan,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

fn resolve_config(cli: &Cli) -> Result<BenchConfig, PipelineError> {
    let mut cfg = BenchConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.results_dir {
        cfg.input.results_dir = dir.clone();
    }
    if let Some(trials) = cli.trials {
        cfg.sweep.trials = trials;
    }
    Ok(cfg)
}

fn plan(cfg: &BenchConfig, pipeline: &Pipeline) {
    let sweep = Sweep::from_config(&cfg.sweep);
    let dir = pipeline.results_dir();
    println!("Results dir: {}", dir.root().display());
    println!(
        "Types: {}",
        sweep
            .types
            .iter()
            .map(|t| t.token())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Rates: {:?}", sweep.rates);
    println!("Trials per configuration: {}", sweep.trials.len());
    println!(
        "Log counters: {} (threshold), {} (probabilistic)",
        cfg.log.threshold_counter, cfg.log.probabilistic_counter
    );
    println!("Primary layout:");
    for lr in pipeline.schema().rules() {
        println!("  line {:>3}: {:?}", lr.offset, lr.rule);
    }

    let mut missing = 0usize;
    for config in sweep.configurations() {
        for key in sweep.keys(config) {
            for path in [dir.trial_file(&key), dir.log_file(&key)] {
                let mark = if path.exists() {
                    "ok"
                } else {
                    missing += 1;
                    "missing"
                };
                println!("  {mark:<7} {}", path.display());
            }
        }
    }
    println!("Dry run: {missing} missing file(s), nothing parsed.");
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    let cfg = resolve_config(&cli)?;
    let pipeline = Pipeline::new(&cfg)?;
    let stdout = std::io::stdout().lock();

    let rows = match cli.command {
        Command::Summary { query } => {
            let sweep = Sweep::from_config(&cfg.sweep);
            tracing::info!(
                query = %query,
                configurations = sweep.configurations().len(),
                "summarizing sweep"
            );
            pipeline.report_summary(&sweep, query, stdout)?
        }
        Command::Trials {
            trial_type,
            rate,
            query,
        } => {
            let sweep = Sweep::single(trial_type, rate, cfg.sweep.trials);
            tracing::info!(%trial_type, rate, query = %query, "printing trials");
            pipeline.report_trials(&sweep, query, stdout)?
        }
        Command::Sweep { query } => {
            let sweep = Sweep::from_config(&cfg.sweep);
            tracing::info!(query = %query, "printing trials for sweep");
            pipeline.report_trials(&sweep, query, stdout)?
        }
        Command::Plan => {
            plan(&cfg, &pipeline);
            return Ok(());
        }
    };

    tracing::info!(rows, "done");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!(?cli, "parsed CLI arguments");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "run failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
