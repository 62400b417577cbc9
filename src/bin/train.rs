//! `qtract-train` binary: train a Q-table from a graph archive.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin qtract-train -- --graph hcpl_graph.npz
//! cargo run --release --bin qtract-train -- \
//!     --graph hcpl_graph.npz --qtable out/qtable.npz --trace out/conv_sum.npz \
//!     --iterations 50000000 --seed 7
//! ```

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use qtract_train::archive;
use qtract_train::config::TrainingConfig;
use qtract_train::cost::CostModel;
use qtract_train::error::TrainResult;
use qtract_train::lattice::OffsetCatalog;
use qtract_train::metrics::QTableStats;
use qtract_train::trainer::Trainer;

/// Command-line arguments for the training binary.
#[derive(Parser, Debug)]
#[command(
    name = "qtract-train",
    version,
    about = "Q-routing tractography Q-table trainer",
    long_about = None
)]
struct Args {
    /// Path to the graph archive holding `nbh_pdf` and `nbh`.
    #[arg(long, value_name = "FILE")]
    graph: PathBuf,

    /// Output path for the trained Q-table archive.
    #[arg(long, value_name = "FILE", default_value = "qtable.npz")]
    qtable: PathBuf,

    /// Output path for the convergence trace archive.
    #[arg(long, value_name = "FILE", default_value = "conv_sum.npz")]
    trace: PathBuf,

    /// Path to a JSON configuration file.
    ///
    /// If not provided, the default `TrainingConfig` is used.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the iteration budget from the config.
    #[arg(long, value_name = "N")]
    iterations: Option<u64>,

    /// Override the learning rate from the config.
    #[arg(long, value_name = "RATE")]
    learning_rate: Option<f32>,

    /// Override the discount factor from the config.
    #[arg(long, value_name = "FACTOR")]
    discount: Option<f32>,

    /// Override the snapshot interval from the config.
    #[arg(long, value_name = "N")]
    snapshot_interval: Option<u64>,

    /// Override the RNG seed from the config.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Write the effective configuration as pretty JSON to this path.
    #[arg(long, value_name = "FILE")]
    save_config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(
            args.log_level
                .parse::<tracing_subscriber::filter::LevelFilter>()
                .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO),
        )
        .with_target(false)
        .with_thread_ids(false)
        .init();

    info!("Q-routing trainer v{}", qtract_train::VERSION);

    if let Err(e) = run(args) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> TrainResult<()> {
    // Load or construct the training configuration, then apply CLI overrides.
    let mut config = match args.config.as_deref() {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            TrainingConfig::from_json(path)?
        }
        None => TrainingConfig::default(),
    };
    if let Some(n) = args.iterations {
        config.iterations = n;
    }
    if let Some(lr) = args.learning_rate {
        config.learning_rate = lr;
    }
    if let Some(d) = args.discount {
        config.discount = d;
    }
    if let Some(n) = args.snapshot_interval {
        config.snapshot_interval = n;
    }
    if let Some(s) = args.seed {
        config.seed = s;
    }
    config.validate()?;

    info!("Configuration validated");
    info!("  iterations       : {}", config.iterations);
    info!("  learning rate    : {}", config.learning_rate);
    info!("  discount         : {}", config.discount);
    info!("  snapshot interval: {}", config.snapshot_interval);
    info!("  seed             : {}", config.seed);
    if let Some(delta) = config.stop_delta {
        info!(
            "  early stop       : delta <= {delta:e} for {} snapshots",
            config.stop_patience
        );
    }

    if let Some(path) = &args.save_config {
        config.to_json(path)?;
        info!("Effective configuration written to {}", path.display());
    }

    // Build the cost model from the graph archive.
    info!("Loading graph archive from {}", args.graph.display());
    let graph = archive::load_graph(&args.graph)?;
    let (nx, ny, nz, na) = graph.likelihoods.dim();
    info!("  volume: {nx}x{ny}x{nz} voxels, {na} actions");

    let catalog = OffsetCatalog::from_rows(graph.offsets.view())?;
    let model = CostModel::from_likelihoods(graph.likelihoods, catalog)?;
    info!(
        "  costs : {}",
        QTableStats::from_values(model.costs()).summary()
    );

    // Train.
    let trainer = Trainer::new(model, config)?;
    let outcome = trainer.run();
    info!(
        "Q-table: {}",
        QTableStats::from_values(outcome.qtable.values()).summary()
    );

    // Persist the artifacts.
    archive::save_qtable(&args.qtable, outcome.qtable.values())?;
    info!("Q-table written to {}", args.qtable.display());

    archive::save_trace(&args.trace, outcome.trace.samples())?;
    info!(
        "Trace written to {} ({} samples)",
        args.trace.display(),
        outcome.trace.len()
    );

    Ok(())
}
