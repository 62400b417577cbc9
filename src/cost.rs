//! Cost model: turns a per-voxel orientation-likelihood volume into the
//! traversal-cost tensor that drives Q-routing.
//!
//! Costs are `-ln(likelihood)`, so minimizing a path's cost sum maximizes the
//! product of likelihoods along it (the shortest-paths trick). Actions that
//! would step outside the lattice are priced at [`INFEASIBLE_COST`], a
//! sentinel no weighted sum of finite costs can reach: the largest cost a
//! positive `f32` likelihood can produce is `-ln(min subnormal) ~ 103`, three
//! orders of magnitude below the sentinel.
//!
//! Boundary masking is derived from the offset signs instead of being keyed
//! per action index: a `+1` component marks the last slice of its axis, a
//! `-1` component the first slice, a `0` component nothing.

use ndarray::Array4;

use crate::error::CostError;
use crate::lattice::{Lattice, OffsetCatalog, NUM_ACTIONS};

/// Sentinel cost for actions that would exit the lattice.
///
/// Strictly greater than any cost derivable from a positive finite
/// likelihood, and copied verbatim into fresh Q-tables so blocked directions
/// stay permanently unattractive.
pub const INFEASIBLE_COST: f32 = 100_000.0;

// ---------------------------------------------------------------------------
// CostModel
// ---------------------------------------------------------------------------

/// Immutable per-voxel, per-action traversal costs over a [`Lattice`].
///
/// Built once from a likelihood volume; read-only for the entire training
/// run.
#[derive(Debug, Clone)]
pub struct CostModel {
    costs: Array4<f32>,
    catalog: OffsetCatalog,
    lattice: Lattice,
}

impl CostModel {
    /// Build the cost tensor from a likelihood volume and an offset catalog.
    ///
    /// The volume must have shape `(Nx, Ny, Nz, 26)` with positive extents
    /// and every entry finite and strictly positive. Entries become
    /// `-ln(likelihood)`; entries whose action would exit the lattice are
    /// overridden with [`INFEASIBLE_COST`].
    ///
    /// # Errors
    ///
    /// - [`CostError::ShapeMismatch`] for a wrong rank-4 extent or an action
    ///   dimension other than 26.
    /// - [`CostError::NonPositiveLikelihood`] for the first entry that is
    ///   zero, negative, or non-finite (rejected rather than clamped, so a
    ///   corrupt input never trains silently).
    /// - [`CostError::IsolatedVoxel`] if boundary masking leaves any voxel
    ///   with an empty feasible-action set (a 1x1x1 volume is the degenerate
    ///   case).
    pub fn from_likelihoods(
        likelihoods: Array4<f32>,
        catalog: OffsetCatalog,
    ) -> Result<Self, CostError> {
        let (nx, ny, nz, na) = likelihoods.dim();
        if na != NUM_ACTIONS || nx == 0 || ny == 0 || nz == 0 {
            return Err(CostError::ShapeMismatch {
                expected: format!("(Nx > 0, Ny > 0, Nz > 0, {NUM_ACTIONS})"),
                actual: format!("({nx}, {ny}, {nz}, {na})"),
            });
        }

        for ((x, y, z, a), &v) in likelihoods.indexed_iter() {
            if !v.is_finite() || v <= 0.0 {
                return Err(CostError::NonPositiveLikelihood {
                    voxel: [x, y, z],
                    action: a,
                    value: v,
                });
            }
        }

        let mut costs = likelihoods;
        costs.mapv_inplace(|p| -p.ln());

        // Derived boundary rule: +1 on an axis blocks the last slice of that
        // axis, -1 blocks the first, 0 blocks nothing.
        let extent = [nx, ny, nz];
        for (action, offset) in catalog.iter() {
            for axis in 0..3 {
                let blocked = match offset[axis] {
                    1 => Some(extent[axis] - 1),
                    -1 => Some(0),
                    _ => None,
                };
                if let Some(idx) = blocked {
                    mask_axis_slice(&mut costs, axis, idx, action);
                }
            }
        }

        let lattice = Lattice::new(nx, ny, nz);
        for x in 0..nx {
            for y in 0..ny {
                for z in 0..nz {
                    let feasible =
                        (0..NUM_ACTIONS).any(|a| costs[[x, y, z, a]] < INFEASIBLE_COST);
                    if !feasible {
                        return Err(CostError::IsolatedVoxel { voxel: [x, y, z] });
                    }
                }
            }
        }

        Ok(CostModel {
            costs,
            catalog,
            lattice,
        })
    }

    /// The lattice the costs are defined over.
    pub fn lattice(&self) -> Lattice {
        self.lattice
    }

    /// The displacement catalog shared with the Q-table and the tracer.
    pub fn catalog(&self) -> &OffsetCatalog {
        &self.catalog
    }

    /// Cost of taking `action` at `voxel`.
    pub fn cost(&self, voxel: [usize; 3], action: usize) -> f32 {
        self.costs[[voxel[0], voxel[1], voxel[2], action]]
    }

    /// The full cost tensor, shape `(Nx, Ny, Nz, 26)`.
    pub fn costs(&self) -> &Array4<f32> {
        &self.costs
    }

    /// Whether `action` at `voxel` carries a finite (non-sentinel) cost.
    pub fn is_feasible(&self, voxel: [usize; 3], action: usize) -> bool {
        self.cost(voxel, action) < INFEASIBLE_COST
    }

    /// Fill `out` with all feasible action indices at `voxel`, in catalog
    /// order. Clears `out` first; never allocates beyond the first call's 26
    /// slots when the buffer is reused.
    pub fn feasible_actions(&self, voxel: [usize; 3], out: &mut Vec<usize>) {
        out.clear();
        for a in 0..NUM_ACTIONS {
            if self.is_feasible(voxel, a) {
                out.push(a);
            }
        }
    }
}

/// Set `costs[.., action]` to the sentinel on one fixed slice of one axis.
fn mask_axis_slice(costs: &mut Array4<f32>, axis: usize, index: usize, action: usize) {
    let (nx, ny, nz, _) = costs.dim();
    match axis {
        0 => {
            for y in 0..ny {
                for z in 0..nz {
                    costs[[index, y, z, action]] = INFEASIBLE_COST;
                }
            }
        }
        1 => {
            for x in 0..nx {
                for z in 0..nz {
                    costs[[x, index, z, action]] = INFEASIBLE_COST;
                }
            }
        }
        2 => {
            for x in 0..nx {
                for y in 0..ny {
                    costs[[x, y, index, action]] = INFEASIBLE_COST;
                }
            }
        }
        _ => unreachable!("axis index is always 0, 1, or 2"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
