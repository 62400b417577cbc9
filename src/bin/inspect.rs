//! `qtract-inspect` binary: summarize trained Q-routing artifacts.
//!
//! Prints entry counts and the feasible value range of a Q-table archive,
//! and the head and tail of a convergence trace, without loading anything
//! into a trainer. Useful for checking a long run from another terminal or
//! comparing two finished runs.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin qtract-inspect -- --qtable qtable.npz
//! cargo run --bin qtract-inspect -- --trace conv_sum.npz --tail 20
//! cargo run --bin qtract-inspect -- --qtable qtable.npz --trace conv_sum.npz
//! ```

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};

use qtract_train::archive;
use qtract_train::error::TrainResult;
use qtract_train::lattice::NUM_ACTIONS;
use qtract_train::metrics::QTableStats;

/// Command-line arguments for the inspect binary.
#[derive(Parser, Debug)]
#[command(
    name = "qtract-inspect",
    version,
    about = "Summarize Q-table and convergence-trace archives",
    long_about = None
)]
struct Args {
    /// Path to a Q-table archive to summarize.
    #[arg(long, value_name = "FILE")]
    qtable: Option<PathBuf>,

    /// Path to a convergence trace archive to summarize.
    #[arg(long, value_name = "FILE")]
    trace: Option<PathBuf>,

    /// Number of trace samples to print from each end.
    #[arg(long, value_name = "N", default_value_t = 5)]
    tail: usize,

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

    if args.qtable.is_none() && args.trace.is_none() {
        error!("Nothing to inspect; pass --qtable and/or --trace");
        std::process::exit(1);
    }

    if let Err(e) = run(args) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> TrainResult<()> {
    if let Some(path) = &args.qtable {
        info!("Loading Q-table from {}", path.display());
        let values = archive::load_qtable(path)?;
        let (nx, ny, nz, na) = values.dim();

        println!("Q-table {}", path.display());
        println!("  shape : {nx} x {ny} x {nz} x {na}");
        println!("  {}", QTableStats::from_values(&values).summary());
        if na != NUM_ACTIONS {
            warn!("Action axis is {na}, expected {NUM_ACTIONS}");
        }
    }

    if let Some(path) = &args.trace {
        info!("Loading trace from {}", path.display());
        let samples = archive::load_trace(path)?;
        let n = samples.len();

        println!("Trace {}", path.display());
        println!("  samples: {n}");
        if n > 0 {
            println!("  first  : {:.6e}", samples[0]);
            println!("  last   : {:.6e}", samples[n - 1]);
        }
        if n >= 2 {
            let delta = (samples[n - 1] - samples[n - 2]).abs();
            println!("  latest delta: {delta:.3e}");
        }

        let show = args.tail.min(n);
        for (i, &s) in samples.iter().take(show).enumerate() {
            println!("  [{i:>6}] {s:.6e}");
        }
        if n > 2 * show {
            println!("  ...");
        }
        for (i, &s) in samples
            .iter()
            .enumerate()
            .skip(n.saturating_sub(show).max(show))
        {
            println!("  [{i:>6}] {s:.6e}");
        }
    }

    Ok(())
}
