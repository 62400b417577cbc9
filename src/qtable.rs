//! The Q-table: per-voxel, per-action estimates of expected cumulative
//! traversal cost.
//!
//! Same `(Nx, Ny, Nz, 26)` indexing as the cost tensor. Feasible entries
//! start at zero and are pulled toward `cost + discount * best_successor` by
//! training; sentinel entries are copied from the cost tensor at
//! construction and never written again, so blocked directions stay
//! permanently unattractive. The downstream tracer reads `exp(-Q)` as a
//! direction pmf, which is why the sign convention here is a hard contract.

use ndarray::{s, Array4, ArrayView1};

use crate::cost::{CostModel, INFEASIBLE_COST};
use crate::lattice::Lattice;

/// Mutable learned-value table over a [`Lattice`].
#[derive(Debug, Clone)]
pub struct QTable {
    values: Array4<f32>,
    lattice: Lattice,
}

impl QTable {
    /// Fresh table for a cost model: zeros everywhere, sentinel entries
    /// copied verbatim.
    pub fn from_costs(costs: &CostModel) -> Self {
        let values = costs
            .costs()
            .mapv(|r| if r == INFEASIBLE_COST { r } else { 0.0 });
        QTable {
            values,
            lattice: costs.lattice(),
        }
    }

    /// The lattice the table is defined over.
    pub fn lattice(&self) -> Lattice {
        self.lattice
    }

    /// Current value for `(voxel, action)`.
    pub fn value(&self, voxel: [usize; 3], action: usize) -> f32 {
        self.values[[voxel[0], voxel[1], voxel[2], action]]
    }

    /// Overwrite the value for `(voxel, action)`.
    pub fn set_value(&mut self, voxel: [usize; 3], action: usize, value: f32) {
        self.values[[voxel[0], voxel[1], voxel[2], action]] = value;
    }

    /// All 26 action values at one voxel, in catalog order.
    pub fn action_values(&self, voxel: [usize; 3]) -> ArrayView1<'_, f32> {
        self.values.slice(s![voxel[0], voxel[1], voxel[2], ..])
    }

    /// Sum of every feasible entry (strictly below the sentinel), accumulated
    /// in `f64` so large lattices do not lose low bits.
    pub fn feasible_sum(&self) -> f64 {
        self.values
            .iter()
            .filter(|&&q| q < INFEASIBLE_COST)
            .map(|&q| q as f64)
            .sum()
    }

    /// The full value tensor, shape `(Nx, Ny, Nz, 26)`.
    pub fn values(&self) -> &Array4<f32> {
        &self.values
    }

    /// Consume the table, yielding the value tensor for persistence.
    pub fn into_values(self) -> Array4<f32> {
        self.values
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
