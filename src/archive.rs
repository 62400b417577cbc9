//! NPZ artifact I/O for the training pipeline.
//!
//! Three artifact kinds flow through a run, all NumPy-compatible NPZ
//! archives so the surrounding tooling (graph builder upstream, tracer
//! downstream) can stay in NumPy land:
//!
//! - **graph input**: the likelihood volume under [`LIKELIHOOD_KEY`] and the
//!   26-row offset catalog under [`OFFSETS_KEY`];
//! - **Q-table output**: the trained value tensor under [`QTABLE_KEY`];
//! - **trace output**: the convergence samples under [`TRACE_KEY`].
//!
//! Readers tolerate the dtypes NumPy writes by default: float arrays may be
//! stored as `f4` or `f8` (cast to `f32`/`f64` as needed) and the offset
//! catalog as `i8`, `i4`, or an integral `f8`. Entry names are matched with
//! or without the `.npy` suffix that `numpy.savez` appends. Outputs are
//! written compressed, matching `numpy.savez_compressed`.

use std::fs::File;
use std::path::Path;

use ndarray::{Array1, Array2, Array4, ArrayD, Ix1, Ix2, Ix4};
use ndarray_npy::{NpzReader, NpzWriter, ReadNpzError};

use crate::error::ArchiveError;

/// Entry name of the likelihood volume in a graph archive.
pub const LIKELIHOOD_KEY: &str = "nbh_pdf";
/// Entry name of the offset catalog in a graph archive.
pub const OFFSETS_KEY: &str = "nbh";
/// Entry name of the trained value tensor in a Q-table archive.
pub const QTABLE_KEY: &str = "Q";
/// Entry name of the convergence samples in a trace archive.
pub const TRACE_KEY: &str = "conv_sum";

// ---------------------------------------------------------------------------
// Graph input
// ---------------------------------------------------------------------------

/// Contents of a graph archive, as stored.
///
/// The offset rows are raw at this point; build an
/// [`OffsetCatalog`](crate::lattice::OffsetCatalog) from them to validate.
#[derive(Debug, Clone)]
pub struct GraphArchive {
    /// Likelihood volume, shape `(Nx, Ny, Nz, 26)`.
    pub likelihoods: Array4<f32>,
    /// Offset catalog rows, shape `(26, 3)`.
    pub offsets: Array2<i64>,
}

/// Load a graph archive (likelihood volume + offset catalog) from `path`.
///
/// # Errors
///
/// Returns [`ArchiveError`] when the file cannot be opened, either entry is
/// missing, an entry has an unsupported dtype, or an entry has the wrong
/// rank. Shape and value validation beyond rank happens downstream in the
/// catalog and cost-model constructors.
pub fn load_graph(path: &Path) -> Result<GraphArchive, ArchiveError> {
    let mut npz = open_reader(path)?;
    let names = npz.names()?;

    let pdf_entry = resolve_entry(&names, LIKELIHOOD_KEY)?;
    let nbh_entry = resolve_entry(&names, OFFSETS_KEY)?;

    let likelihoods = read_f32_dyn(&mut npz, &pdf_entry, LIKELIHOOD_KEY)?;
    let likelihoods = into_rank4(likelihoods, LIKELIHOOD_KEY)?;

    let offsets = read_i64_dyn(&mut npz, &nbh_entry, OFFSETS_KEY)?;
    let offsets = into_rank2(offsets, OFFSETS_KEY)?;

    Ok(GraphArchive {
        likelihoods,
        offsets,
    })
}

// ---------------------------------------------------------------------------
// Q-table and trace outputs
// ---------------------------------------------------------------------------

/// Write a trained value tensor to a compressed NPZ archive at `path` under
/// [`QTABLE_KEY`].
pub fn save_qtable(path: &Path, values: &Array4<f32>) -> Result<(), ArchiveError> {
    let file = File::create(path)?;
    let mut npz = NpzWriter::new_compressed(file);
    npz.add_array(QTABLE_KEY, values)?;
    npz.finish()?;
    Ok(())
}

/// Read a value tensor back from a Q-table archive.
pub fn load_qtable(path: &Path) -> Result<Array4<f32>, ArchiveError> {
    let mut npz = open_reader(path)?;
    let names = npz.names()?;
    let entry = resolve_entry(&names, QTABLE_KEY)?;
    let values = read_f32_dyn(&mut npz, &entry, QTABLE_KEY)?;
    into_rank4(values, QTABLE_KEY)
}

/// Write convergence samples to a compressed NPZ archive at `path` under
/// [`TRACE_KEY`].
pub fn save_trace(path: &Path, samples: &[f64]) -> Result<(), ArchiveError> {
    let file = File::create(path)?;
    let mut npz = NpzWriter::new_compressed(file);
    let arr = Array1::from(samples.to_vec());
    npz.add_array(TRACE_KEY, &arr)?;
    npz.finish()?;
    Ok(())
}

/// Read convergence samples back from a trace archive.
pub fn load_trace(path: &Path) -> Result<Array1<f64>, ArchiveError> {
    let mut npz = open_reader(path)?;
    let names = npz.names()?;
    let entry = resolve_entry(&names, TRACE_KEY)?;
    let samples = read_f64_dyn(&mut npz, &entry, TRACE_KEY)?;
    let nd = samples.ndim();
    samples
        .into_dimensionality::<Ix1>()
        .map_err(|_| ArchiveError::BadRank {
            name: TRACE_KEY.to_string(),
            expected: 1,
            actual: nd,
        })
}

// ---------------------------------------------------------------------------
// Entry resolution and dtype-tolerant readers
// ---------------------------------------------------------------------------

fn open_reader(path: &Path) -> Result<NpzReader<File>, ArchiveError> {
    let file = File::open(path)?;
    Ok(NpzReader::new(file)?)
}

/// Find the stored entry name for `key`, accepting an optional `.npy` suffix.
fn resolve_entry(names: &[String], key: &str) -> Result<String, ArchiveError> {
    names
        .iter()
        .find(|n| n.as_str() == key || n.strip_suffix(".npy") == Some(key))
        .cloned()
        .ok_or_else(|| ArchiveError::missing(key))
}

/// Read a float array stored as either `f4` or `f8`, yielding `f32`.
fn read_f32_dyn(
    npz: &mut NpzReader<File>,
    entry: &str,
    key: &str,
) -> Result<ArrayD<f32>, ArchiveError> {
    let as_f32: Result<ArrayD<f32>, ReadNpzError> = npz.by_name(entry);
    let first_err = match as_f32 {
        Ok(arr) => return Ok(arr),
        Err(e) => e,
    };
    let as_f64: Result<ArrayD<f64>, ReadNpzError> = npz.by_name(entry);
    match as_f64 {
        Ok(arr) => Ok(arr.mapv(|v| v as f32)),
        Err(e) => Err(ArchiveError::dtype(
            key,
            format!("not readable as f4 ({first_err}) or f8 ({e})"),
        )),
    }
}

/// Read a float array stored as either `f8` or `f4`, yielding `f64`.
fn read_f64_dyn(
    npz: &mut NpzReader<File>,
    entry: &str,
    key: &str,
) -> Result<ArrayD<f64>, ArchiveError> {
    let as_f64: Result<ArrayD<f64>, ReadNpzError> = npz.by_name(entry);
    let first_err = match as_f64 {
        Ok(arr) => return Ok(arr),
        Err(e) => e,
    };
    let as_f32: Result<ArrayD<f32>, ReadNpzError> = npz.by_name(entry);
    match as_f32 {
        Ok(arr) => Ok(arr.mapv(f64::from)),
        Err(e) => Err(ArchiveError::dtype(
            key,
            format!("not readable as f8 ({first_err}) or f4 ({e})"),
        )),
    }
}

/// Read an integer array stored as `i8`, `i4`, or an integral `f8`,
/// yielding `i64`.
fn read_i64_dyn(
    npz: &mut NpzReader<File>,
    entry: &str,
    key: &str,
) -> Result<ArrayD<i64>, ArchiveError> {
    let as_i64: Result<ArrayD<i64>, ReadNpzError> = npz.by_name(entry);
    let first_err = match as_i64 {
        Ok(arr) => return Ok(arr),
        Err(e) => e,
    };
    let as_i32: Result<ArrayD<i32>, ReadNpzError> = npz.by_name(entry);
    if let Ok(arr) = as_i32 {
        return Ok(arr.mapv(i64::from));
    }
    let as_f64: Result<ArrayD<f64>, ReadNpzError> = npz.by_name(entry);
    match as_f64 {
        Ok(arr) => {
            if arr.iter().any(|v| !v.is_finite() || v.fract() != 0.0) {
                return Err(ArchiveError::dtype(
                    key,
                    "float-typed entry holds non-integral values".to_string(),
                ));
            }
            Ok(arr.mapv(|v| v as i64))
        }
        Err(e) => Err(ArchiveError::dtype(
            key,
            format!("not readable as i8/i4 ({first_err}) or integral f8 ({e})"),
        )),
    }
}

fn into_rank4(arr: ArrayD<f32>, key: &str) -> Result<Array4<f32>, ArchiveError> {
    let nd = arr.ndim();
    arr.into_dimensionality::<Ix4>()
        .map_err(|_| ArchiveError::BadRank {
            name: key.to_string(),
            expected: 4,
            actual: nd,
        })
}

fn into_rank2(arr: ArrayD<i64>, key: &str) -> Result<Array2<i64>, ArchiveError> {
    let nd = arr.ndim();
    arr.into_dimensionality::<Ix2>()
        .map_err(|_| ArchiveError::BadRank {
            name: key.to_string(),
            expected: 2,
            actual: nd,
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
