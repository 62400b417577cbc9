//! The Q-learning training loop.
//!
//! One iteration relaxes a single Q entry: draw a voxel uniformly at random,
//! draw one of its feasible actions uniformly, walk to the successor voxel,
//! and pull the entry toward `cost + discount * best successor value`. With
//! strictly positive costs the feasible entries only ever grow toward the
//! fixed point, so the feasible sum recorded every `snapshot_interval`
//! iterations is a monotone convergence signal.
//!
//! [`Trainer`] owns the cost model, the Q-table, the RNG, and the trace;
//! [`Trainer::run`] consumes it and returns a [`TrainingOutcome`] with the
//! trained table. There is no shared or global state, so independent runs
//! can live side by side in one process.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::TrainingConfig;
use crate::cost::CostModel;
use crate::error::ConfigError;
use crate::lattice::{Lattice, NUM_ACTIONS};
use crate::metrics::ConvergenceTrace;
use crate::qtable::QTable;

// ---------------------------------------------------------------------------
// Trainer
// ---------------------------------------------------------------------------

/// Owns one training session: cost model, Q-table, RNG, and trace.
pub struct Trainer {
    costs: CostModel,
    qtable: QTable,
    lattice: Lattice,
    rng: StdRng,
    config: TrainingConfig,
    trace: ConvergenceTrace,
    completed: u64,
    feasible_scratch: Vec<usize>,
    tie_scratch: Vec<usize>,
}

/// What a single update step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    /// One feasible entry was relaxed toward its target.
    Updated,
    /// The sampled voxel had no feasible action. Cannot occur for a cost
    /// model that passed construction, but the step refuses rather than
    /// trusting that.
    NoFeasibleAction,
    /// The sampled action would step outside the lattice. Feasible actions
    /// are in-bounds by construction; this is the second, independent guard.
    SuccessorOutOfBounds,
}

/// Result of a completed training run.
#[derive(Debug)]
pub struct TrainingOutcome {
    /// The trained Q-table.
    pub qtable: QTable,
    /// Feasible-sum snapshots taken during the run.
    pub trace: ConvergenceTrace,
    /// Iterations actually executed.
    pub iterations_completed: u64,
    /// `true` when the plateau rule ended the run before the full budget.
    pub early_stopped: bool,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl Trainer {
    /// Build a trainer for `costs` with the given configuration.
    ///
    /// The Q-table starts at zero with the blocked entries copied from the
    /// cost tensor, and the RNG is seeded from `config.seed` so runs are
    /// reproducible.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the configuration fails
    /// [`TrainingConfig::validate`].
    pub fn new(costs: CostModel, config: TrainingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let qtable = QTable::from_costs(&costs);
        let lattice = costs.lattice();
        let trace = ConvergenceTrace::new(config.snapshot_interval);
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Trainer {
            costs,
            qtable,
            lattice,
            rng,
            trace,
            completed: 0,
            feasible_scratch: Vec::with_capacity(NUM_ACTIONS),
            tie_scratch: Vec::with_capacity(NUM_ACTIONS),
            config,
        })
    }

    /// The active training configuration.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// The Q-table in its current state.
    pub fn qtable(&self) -> &QTable {
        &self.qtable
    }

    /// Snapshots recorded so far.
    pub fn trace(&self) -> &ConvergenceTrace {
        &self.trace
    }

    /// Iterations executed so far.
    pub fn iterations_completed(&self) -> u64 {
        self.completed
    }

    /// Run the remaining iteration budget and return the trained table.
    ///
    /// Every `snapshot_interval` iterations the feasible sum is appended to
    /// the trace; every `log_interval` iterations a progress line is logged.
    /// When `stop_delta` is set and the trace plateaus for `stop_patience`
    /// consecutive snapshots, the run ends early.
    pub fn run(mut self) -> TrainingOutcome {
        let extent = self.lattice.extent();
        info!(
            "Training {} iterations over a {}x{}x{} lattice (lr {}, discount {}, seed {})",
            self.config.iterations,
            extent[0],
            extent[1],
            extent[2],
            self.config.learning_rate,
            self.config.discount,
            self.config.seed
        );

        let started = Instant::now();
        let mut early_stopped = false;

        while self.completed < self.config.iterations {
            self.step();
            self.completed += 1;

            if self.completed % self.config.snapshot_interval == 0 {
                let sum = self.qtable.feasible_sum();
                self.trace.record(sum);

                if let Some(delta) = self.config.stop_delta {
                    if self.trace.plateaued(delta, self.config.stop_patience) {
                        info!(
                            "Feasible sum plateaued after {} iterations; stopping early ({})",
                            self.completed,
                            self.trace.summary()
                        );
                        early_stopped = true;
                        break;
                    }
                }
            }

            if self.completed % self.config.log_interval == 0 {
                let rate = self.completed as f64 / started.elapsed().as_secs_f64().max(1e-9);
                match self.trace.last() {
                    Some(sum) => info!(
                        "Iteration {}/{} ({:.0} it/s, feasible sum {:.6e})",
                        self.completed, self.config.iterations, rate, sum
                    ),
                    None => info!(
                        "Iteration {}/{} ({:.0} it/s)",
                        self.completed, self.config.iterations, rate
                    ),
                }
            }
        }

        let elapsed = started.elapsed();
        info!(
            "Training finished: {} iterations in {:.2?} ({})",
            self.completed,
            elapsed,
            self.trace.summary()
        );

        TrainingOutcome {
            qtable: self.qtable,
            trace: self.trace,
            iterations_completed: self.completed,
            early_stopped,
            elapsed,
        }
    }

    /// Execute one update step.
    pub(crate) fn step(&mut self) -> StepOutcome {
        let extent = self.lattice.extent();
        let voxel = [
            self.rng.gen_range(0..extent[0]),
            self.rng.gen_range(0..extent[1]),
            self.rng.gen_range(0..extent[2]),
        ];

        self.costs
            .feasible_actions(voxel, &mut self.feasible_scratch);
        let action = match self.feasible_scratch.choose(&mut self.rng) {
            Some(&a) => a,
            None => return StepOutcome::NoFeasibleAction,
        };

        let offset = self.costs.catalog().offset(action);
        let successor = match self.lattice.successor(voxel, offset) {
            Some(s) => s,
            None => return StepOutcome::SuccessorOutOfBounds,
        };

        let (_, best) = self.best_successor(successor);
        let current = self.qtable.value(voxel, action);
        let cost = self.costs.cost(voxel, action);
        let lr = self.config.learning_rate;
        let updated = (1.0 - lr) * current + lr * (cost + self.config.discount * best);
        self.qtable.set_value(voxel, action, updated);
        StepOutcome::Updated
    }

    /// Greedy lookahead: the minimum Q value at `successor` and one action
    /// attaining it, chosen uniformly at random when several tie.
    fn best_successor(&mut self, successor: [usize; 3]) -> (usize, f32) {
        let row = self.qtable.action_values(successor);
        self.tie_scratch.clear();
        let mut best = f32::INFINITY;
        for (a, &q) in row.iter().enumerate() {
            if q < best {
                best = q;
                self.tie_scratch.clear();
                self.tie_scratch.push(a);
            } else if q == best {
                self.tie_scratch.push(a);
            }
        }
        // The RNG is consulted only when there is an actual tie.
        let chosen = match self.tie_scratch.as_slice() {
            [] => unreachable!("a 26-entry row always has a minimum"),
            [only] => *only,
            ties => ties[self.rng.gen_range(0..ties.len())],
        };
        (chosen, best)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
