//! Convergence diagnostics for Q-table training.
//!
//! Training progress is observed through a single scalar: the sum of every
//! feasible Q entry. With strictly positive costs that sum only grows, and
//! it flattens out as the table approaches the fixed point, so its trace
//! over time is the convergence signal the trainer snapshots and the
//! inspect tool plots.
//!
//! This module provides:
//!
//! - [`ConvergenceTrace`]: the snapshot series, recorded every
//!   `snapshot_interval` iterations and persisted alongside the Q-table.
//! - [`QTableStats`]: a one-shot summary of a value tensor (entry counts,
//!   feasible range, mean) for log lines and offline inspection.

use ndarray::Array4;

use crate::cost::INFEASIBLE_COST;

// ---------------------------------------------------------------------------
// ConvergenceTrace
// ---------------------------------------------------------------------------

/// Feasible-sum samples taken at a fixed iteration interval.
///
/// Sample `k` (zero-based) is the feasible sum observed after
/// `(k + 1) * interval` iterations. The series is push-only; nothing in the
/// trainer ever rewrites history.
#[derive(Debug, Clone)]
pub struct ConvergenceTrace {
    /// Iterations between consecutive samples.
    interval: u64,
    /// Recorded feasible sums, oldest first.
    samples: Vec<f64>,
}

impl ConvergenceTrace {
    /// Empty trace with the given snapshot interval.
    pub fn new(interval: u64) -> Self {
        ConvergenceTrace {
            interval,
            samples: Vec::new(),
        }
    }

    /// Iterations between consecutive samples.
    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Append one feasible-sum sample.
    pub fn record(&mut self, feasible_sum: f64) {
        self.samples.push(feasible_sum);
    }

    /// Number of samples recorded so far.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// `true` when no sample has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All samples, oldest first.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// The most recent sample, if any.
    pub fn last(&self) -> Option<f64> {
        self.samples.last().copied()
    }

    /// Absolute change between the two most recent samples.
    ///
    /// Returns `None` until two samples exist.
    pub fn latest_delta(&self) -> Option<f64> {
        let n = self.samples.len();
        if n < 2 {
            return None;
        }
        Some((self.samples[n - 1] - self.samples[n - 2]).abs())
    }

    /// `true` when the last `patience` consecutive sample-to-sample changes
    /// are all at most `min_delta`.
    ///
    /// Needs `patience + 1` samples before it can ever fire; `patience == 0`
    /// never fires.
    pub fn plateaued(&self, min_delta: f64, patience: usize) -> bool {
        if patience == 0 || self.samples.len() <= patience {
            return false;
        }
        let tail = &self.samples[self.samples.len() - patience - 1..];
        tail.windows(2)
            .all(|w| (w[1] - w[0]).abs() <= min_delta)
    }

    /// Total iterations covered by the recorded samples.
    pub fn iterations_covered(&self) -> u64 {
        self.samples.len() as u64 * self.interval
    }

    /// A human-readable summary line suitable for logging.
    pub fn summary(&self) -> String {
        match self.samples.len() {
            0 => "no samples".to_string(),
            1 => format!(
                "1 sample at iteration {}: feasible sum {:.6e}",
                self.interval, self.samples[0]
            ),
            n => format!(
                "{} samples over {} iterations: feasible sum {:.6e} -> {:.6e}, latest delta {:.3e}",
                n,
                self.iterations_covered(),
                self.samples[0],
                self.samples[n - 1],
                (self.samples[n - 1] - self.samples[n - 2]).abs()
            ),
        }
    }

    /// Consume the trace, yielding the raw samples for persistence.
    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}

// ---------------------------------------------------------------------------
// QTableStats
// ---------------------------------------------------------------------------

/// One-shot summary of a Q (or cost) value tensor.
///
/// Entries at or above [`INFEASIBLE_COST`] count as blocked; everything else
/// is feasible. When no entry is feasible the range and mean fields are all
/// zero and [`QTableStats::summary`] says so.
#[derive(Debug, Clone, PartialEq)]
pub struct QTableStats {
    /// Total number of entries in the tensor.
    pub total: usize,
    /// Entries strictly below the sentinel.
    pub feasible: usize,
    /// Entries at or above the sentinel.
    pub blocked: usize,
    /// Sum of feasible entries, accumulated in `f64`.
    pub feasible_sum: f64,
    /// Smallest feasible entry.
    pub feasible_min: f32,
    /// Largest feasible entry.
    pub feasible_max: f32,
    /// Mean of feasible entries.
    pub feasible_mean: f64,
}

impl QTableStats {
    /// Compute stats over a `(Nx, Ny, Nz, 26)` value tensor.
    pub fn from_values(values: &Array4<f32>) -> Self {
        let mut feasible = 0usize;
        let mut sum = 0.0f64;
        let mut min = f32::MAX;
        let mut max = f32::MIN;

        for &v in values.iter() {
            if v < INFEASIBLE_COST {
                feasible += 1;
                sum += v as f64;
                min = min.min(v);
                max = max.max(v);
            }
        }

        let total = values.len();
        if feasible == 0 {
            QTableStats {
                total,
                feasible: 0,
                blocked: total,
                feasible_sum: 0.0,
                feasible_min: 0.0,
                feasible_max: 0.0,
                feasible_mean: 0.0,
            }
        } else {
            QTableStats {
                total,
                feasible,
                blocked: total - feasible,
                feasible_sum: sum,
                feasible_min: min,
                feasible_max: max,
                feasible_mean: sum / feasible as f64,
            }
        }
    }

    /// A human-readable summary line suitable for logging.
    pub fn summary(&self) -> String {
        if self.feasible == 0 {
            return format!("{} entries, all blocked", self.total);
        }
        format!(
            "{} entries: {} feasible / {} blocked; sum={:.6e} min={:.4} max={:.4} mean={:.4}",
            self.total,
            self.feasible,
            self.blocked,
            self.feasible_sum,
            self.feasible_min,
            self.feasible_max,
            self.feasible_mean
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
