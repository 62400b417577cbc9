//! Lattice geometry: voxel extents, successor math, and the 26-neighbor
//! displacement catalog.
//!
//! The catalog order is load-bearing. The same 26 directions index the
//! upstream likelihood volume, the cost tensor, the Q-table, and the sphere
//! the downstream tracer samples from; permuting it silently attributes
//! learned costs to the wrong directions.

use ndarray::ArrayView2;

use crate::error::CostError;

/// Number of discrete actions: all of `{-1,0,1}^3` except the zero vector.
pub const NUM_ACTIONS: usize = 26;

/// Canonical catalog order used by the reference pipeline (graph builder and
/// tracer sphere alike).
const REFERENCE_OFFSETS: [[i32; 3]; NUM_ACTIONS] = [
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [1, -1, 0],
    [-1, 1, 0],
    [-1, 0, 0],
    [0, -1, 0],
    [-1, -1, 0],
    [-1, 0, -1],
    [0, 0, 1],
    [0, -1, -1],
    [0, 0, -1],
    [-1, -1, -1],
    [-1, 0, 1],
    [0, 1, -1],
    [0, -1, 1],
    [1, 1, -1],
    [-1, 1, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
    [1, -1, 1],
    [1, 0, -1],
    [-1, -1, 1],
    [-1, 1, -1],
    [1, -1, -1],
];

// ---------------------------------------------------------------------------
// Lattice
// ---------------------------------------------------------------------------

/// Fixed 3D voxel extent `(nx, ny, nz)`; states are integer coordinates in
/// `[0, nx) x [0, ny) x [0, nz)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lattice {
    /// Extent along x.
    pub nx: usize,
    /// Extent along y.
    pub ny: usize,
    /// Extent along z.
    pub nz: usize,
}

impl Lattice {
    /// Create a lattice with the given extents.
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Lattice { nx, ny, nz }
    }

    /// Extents as `[nx, ny, nz]`.
    pub fn extent(&self) -> [usize; 3] {
        [self.nx, self.ny, self.nz]
    }

    /// Total number of voxels.
    pub fn num_voxels(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Whether a signed coordinate triple lies inside the lattice.
    pub fn contains(&self, p: [i64; 3]) -> bool {
        p[0] >= 0
            && p[1] >= 0
            && p[2] >= 0
            && (p[0] as usize) < self.nx
            && (p[1] as usize) < self.ny
            && (p[2] as usize) < self.nz
    }

    /// Apply a displacement to a voxel; `None` when the successor would fall
    /// outside the lattice on any axis.
    pub fn successor(&self, voxel: [usize; 3], offset: [i32; 3]) -> Option<[usize; 3]> {
        let p = [
            voxel[0] as i64 + offset[0] as i64,
            voxel[1] as i64 + offset[1] as i64,
            voxel[2] as i64 + offset[2] as i64,
        ];
        if self.contains(p) {
            Some([p[0] as usize, p[1] as usize, p[2] as usize])
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// OffsetCatalog
// ---------------------------------------------------------------------------

/// The ordered table of 26 unit-step displacements.
///
/// Constructed either from the canonical reference order
/// ([`OffsetCatalog::reference`]) or from the `nbh` array stored in the input
/// archive ([`OffsetCatalog::from_rows`]), which is validated but otherwise
/// trusted to carry whatever order the upstream graph builder used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetCatalog {
    offsets: [[i32; 3]; NUM_ACTIONS],
}

impl OffsetCatalog {
    /// The canonical reference order (see module docs).
    pub fn reference() -> Self {
        OffsetCatalog {
            offsets: REFERENCE_OFFSETS,
        }
    }

    /// Build a catalog from a `(26, 3)` integer table.
    ///
    /// Rejects wrong shapes, components outside `{-1, 0, 1}`, the zero
    /// displacement, and duplicate rows. Since exactly 26 such displacements
    /// exist, a table passing all checks is a permutation of the full
    /// 26-neighborhood.
    pub fn from_rows(rows: ArrayView2<'_, i64>) -> Result<Self, CostError> {
        let (r, c) = rows.dim();
        if r != NUM_ACTIONS || c != 3 {
            return Err(CostError::CatalogShape { rows: r, cols: c });
        }

        let mut offsets = [[0i32; 3]; NUM_ACTIONS];
        for (i, row) in rows.outer_iter().enumerate() {
            let raw = [row[0], row[1], row[2]];
            if raw.iter().any(|v| !(-1..=1).contains(v)) || raw == [0, 0, 0] {
                return Err(CostError::InvalidOffset {
                    index: i,
                    offset: raw,
                });
            }
            offsets[i] = [raw[0] as i32, raw[1] as i32, raw[2] as i32];
        }

        for i in 0..NUM_ACTIONS {
            for j in (i + 1)..NUM_ACTIONS {
                if offsets[i] == offsets[j] {
                    return Err(CostError::DuplicateOffset { first: i, second: j });
                }
            }
        }

        Ok(OffsetCatalog { offsets })
    }

    /// Displacement vector for an action index.
    pub fn offset(&self, action: usize) -> [i32; 3] {
        self.offsets[action]
    }

    /// All displacements in catalog order.
    pub fn offsets(&self) -> &[[i32; 3]; NUM_ACTIONS] {
        &self.offsets
    }

    /// Iterator over `(action, displacement)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, [i32; 3])> + '_ {
        self.offsets.iter().copied().enumerate()
    }

    /// Action index for a displacement, if present.
    pub fn index_of(&self, offset: [i32; 3]) -> Option<usize> {
        self.offsets.iter().position(|&o| o == offset)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn reference_rows() -> Array2<i64> {
        let cat = OffsetCatalog::reference();
        let mut rows = Array2::zeros((NUM_ACTIONS, 3));
        for (a, off) in cat.iter() {
            for axis in 0..3 {
                rows[[a, axis]] = off[axis] as i64;
            }
        }
        rows
    }

    #[test]
    fn reference_catalog_covers_full_neighborhood() {
        let cat = OffsetCatalog::reference();
        // 26 distinct nonzero vectors with components in {-1,0,1} is exactly
        // the full 26-neighborhood.
        for dx in -1..=1_i32 {
            for dy in -1..=1_i32 {
                for dz in -1..=1_i32 {
                    let off = [dx, dy, dz];
                    if off == [0, 0, 0] {
                        assert_eq!(cat.index_of(off), None);
                    } else {
                        assert!(
                            cat.index_of(off).is_some(),
                            "missing displacement {off:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn reference_catalog_has_stable_first_rows() {
        let cat = OffsetCatalog::reference();
        assert_eq!(cat.offset(0), [1, 0, 0]);
        assert_eq!(cat.offset(1), [0, 1, 0]);
        assert_eq!(cat.offset(9), [0, 0, 1]);
        assert_eq!(cat.offset(20), [1, 1, 1]);
        assert_eq!(cat.offset(25), [1, -1, -1]);
    }

    #[test]
    fn from_rows_round_trips_reference_order() {
        let rows = reference_rows();
        let cat = OffsetCatalog::from_rows(rows.view()).expect("reference rows must validate");
        assert_eq!(cat, OffsetCatalog::reference());
    }

    #[test]
    fn from_rows_rejects_wrong_shape() {
        let rows = Array2::<i64>::zeros((25, 3));
        match OffsetCatalog::from_rows(rows.view()) {
            Err(CostError::CatalogShape { rows: 25, cols: 3 }) => {}
            other => panic!("expected CatalogShape, got {other:?}"),
        }
    }

    #[test]
    fn from_rows_rejects_zero_displacement() {
        let mut rows = reference_rows();
        for axis in 0..3 {
            rows[[4, axis]] = 0;
        }
        match OffsetCatalog::from_rows(rows.view()) {
            Err(CostError::InvalidOffset { index: 4, .. }) => {}
            other => panic!("expected InvalidOffset, got {other:?}"),
        }
    }

    #[test]
    fn from_rows_rejects_out_of_range_component() {
        let mut rows = reference_rows();
        rows[[7, 1]] = 2;
        assert!(matches!(
            OffsetCatalog::from_rows(rows.view()),
            Err(CostError::InvalidOffset { index: 7, .. })
        ));
    }

    #[test]
    fn from_rows_rejects_duplicates() {
        let mut rows = reference_rows();
        // Copy row 0 over row 5.
        for axis in 0..3 {
            rows[[5, axis]] = rows[[0, axis]];
        }
        assert!(matches!(
            OffsetCatalog::from_rows(rows.view()),
            Err(CostError::DuplicateOffset { first: 0, second: 5 })
        ));
    }

    #[test]
    fn lattice_contains_and_extent() {
        let lat = Lattice::new(4, 3, 2);
        assert_eq!(lat.extent(), [4, 3, 2]);
        assert_eq!(lat.num_voxels(), 24);
        assert!(lat.contains([0, 0, 0]));
        assert!(lat.contains([3, 2, 1]));
        assert!(!lat.contains([4, 0, 0]));
        assert!(!lat.contains([0, 3, 0]));
        assert!(!lat.contains([0, 0, 2]));
        assert!(!lat.contains([-1, 0, 0]));
    }

    #[test]
    fn successor_inside_and_outside() {
        let lat = Lattice::new(2, 2, 2);
        assert_eq!(lat.successor([0, 0, 0], [1, 1, 1]), Some([1, 1, 1]));
        assert_eq!(lat.successor([0, 0, 0], [-1, 0, 0]), None);
        assert_eq!(lat.successor([1, 1, 1], [0, 0, 1]), None);
        assert_eq!(lat.successor([1, 0, 1], [-1, 1, -1]), Some([0, 1, 0]));
    }
}
