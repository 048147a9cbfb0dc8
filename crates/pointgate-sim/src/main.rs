//! Pointgate simulation harness CLI.
//!
//! Generates synthetic object arrivals, services them through the policy
//! engine, and reports queueing/service statistics via the regenerative
//! method.
//!
//! ```bash
//! # Free run: Gaussian arrivals, random policy batches
//! pointgate-sim --mean 5 --sigma 2 --lambda 0.05 --epochs 2000
//!
//! # Sensitivity run: fixed arrival rate, fixed rule count, 1 KB queries
//! pointgate-sim -f 8 -n 4 -q 3 --epochs 500
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use pointgate_config::PointgateConfig;
use pointgate_policy::RuleStore;
use pointgate_sim::arrival::{self, ArrivalPlan, Gaussian};
use pointgate_sim::report::CsvSink;
use pointgate_sim::service::{self, ServiceFactory, ServicePlan};
use pointgate_sim::{Estimator, SimContext};

/// Discrete-event simulator for the Pointgate policy/query service path.
#[derive(Parser)]
#[command(name = "pointgate-sim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Mean of the per-epoch arrival count distribution.
    #[arg(short, long)]
    mean: Option<f64>,

    /// Standard deviation of the arrival count distribution.
    #[arg(short, long)]
    sigma: Option<f64>,

    /// Inter-arrival interval in seconds.
    #[arg(short, long)]
    lambda: Option<f64>,

    /// Number of arrival epochs to simulate.
    #[arg(short = 'E', long)]
    epochs: Option<usize>,

    /// Sensitivity: fix the arrival burst size instead of drawing it.
    #[arg(short = 'f', long)]
    rate: Option<usize>,

    /// Sensitivity: fix the policy-file code (rules = code x 8).
    #[arg(short = 'n', long)]
    rules: Option<usize>,

    /// Sensitivity: query size code 1..=11 (200 B up to 5 KB).
    #[arg(short = 'q', long, default_value_t = 0)]
    query_size: u16,

    /// Where to write the steady-state performance CSV.
    #[arg(short = 'p', long)]
    steady_state_path: Option<PathBuf>,

    /// Number of synthetic data points to register.
    #[arg(long, default_value_t = 96)]
    fleet: usize,

    /// Seed for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Directory holding pointgate.toml (defaults to the working directory).
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Log the data points each query lets through.
    #[arg(short = 'o', long)]
    show_output: bool,

    /// Verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .init();

    let config_dir = cli
        .config_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let mut config = PointgateConfig::load(&config_dir)?;

    // CLI flags override the file-loaded configuration.
    if let Some(mean) = cli.mean {
        config.sim.mean = mean;
    }
    if let Some(sigma) = cli.sigma {
        config.sim.sigma = sigma;
    }
    if let Some(lambda) = cli.lambda {
        config.sim.lambda = lambda;
    }
    if let Some(epochs) = cli.epochs {
        config.sim.epochs = epochs;
    }
    if let Some(path) = cli.steady_state_path {
        config.sim.steady_state_csv = path;
    }
    config.validate()?;

    let plan = ArrivalPlan {
        mean: config.sim.mean,
        sigma: config.sim.sigma,
        interval: Duration::from_secs_f64(config.sim.lambda),
        rate_override: cli.rate,
        epochs: config.sim.epochs,
        max_objects: config.sim.max_objects,
    };

    tracing::info!(
        mean = plan.mean,
        sigma = plan.sigma,
        interval_secs = config.sim.lambda,
        epochs = plan.epochs,
        "starting simulation"
    );

    // Shared context: the queue plus the run-wide counters.
    let ctx = Arc::new(SimContext::new());

    // Service side: seeded store, factory, estimator with its CSV streams.
    let mut store = RuleStore::new(
        config.policy.estimated_data_points,
        config.policy.max_rules,
    );
    service::seed_data_points(&mut store, cli.fleet);
    let mut factory = ServiceFactory::new(
        store,
        ServicePlan {
            rule_files: cli.rules,
            query_size_code: cli.query_size,
            show_output: cli.show_output,
        },
        cli.seed,
    );
    let estimator_sink = CsvSink::estimator_streams(
        &config.sim.cycle_sums_csv,
        &config.sim.steady_state_csv,
    )?;
    let mut estimator = Estimator::new(Box::new(estimator_sink));

    // Arrival side on its own thread.
    let mut arrivals_sink = CsvSink::arrivals(&config.sim.arrivals_csv)?;
    let mut gaussian = match cli.seed {
        Some(seed) => Gaussian::seeded(seed),
        None => Gaussian::from_entropy(),
    };
    let producer_ctx = Arc::clone(&ctx);
    let producer_plan = plan.clone();
    let producer = std::thread::spawn(move || {
        arrival::run_arrival_loop(
            &producer_ctx,
            &producer_plan,
            &mut gaussian,
            &mut arrivals_sink,
        );
    });

    service::run_service_loop(&ctx, &mut factory, &mut estimator);

    if producer.join().is_err() {
        tracing::error!("arrival thread panicked");
    }

    tracing::info!(
        epochs = estimator.epochs_completed(),
        objects = ctx.objects_created(),
        overall_mean_ms = estimator.overall_mean(),
        confidence_interval = estimator.confidence_interval().unwrap_or(0.0),
        "simulation complete"
    );

    Ok(())
}
