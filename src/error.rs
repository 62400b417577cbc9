//! Error types for the Q-routing training pipeline.
//!
//! Every fallible stage has its own enum ([`ConfigError`], [`CostError`],
//! [`ArchiveError`]) and the umbrella [`TrainError`] collects them so binaries
//! can report a single error chain. All preconditions fail fast, before any
//! Q-table is produced; there is no retry or partial-progress recovery.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type TrainResult<T> = Result<T, TrainError>;

// ---------------------------------------------------------------------------
// TrainError (umbrella)
// ---------------------------------------------------------------------------

/// Top-level error for the training pipeline.
#[derive(Debug, Error)]
pub enum TrainError {
    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Cost model construction rejected its inputs.
    #[error("Cost model error: {0}")]
    Cost(#[from] CostError),

    /// Reading or writing an NPZ artifact failed.
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors produced while loading or validating a [`TrainingConfig`].
///
/// [`TrainingConfig`]: crate::config::TrainingConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds a value outside its documented range.
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A configuration file could not be read from or written to disk.
    #[error("Cannot access config file `{path}`: {source}")]
    FileAccess {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file contains malformed JSON.
    #[error("Cannot parse config file `{path}`: {source}")]
    Parse {
        /// Path that was being parsed.
        path: PathBuf,
        /// Underlying JSON parse error.
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Construct a [`ConfigError::InvalidValue`].
    pub fn invalid_value<S: Into<String>>(field: &'static str, reason: S) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// CostError
// ---------------------------------------------------------------------------

/// Errors produced while building the cost tensor from a likelihood volume
/// and an offset catalog.
///
/// Every variant is a hard input-data error: the run aborts before any
/// training step executes.
#[derive(Debug, Error)]
pub enum CostError {
    /// Likelihood tensor has the wrong rank or extents.
    #[error("Likelihood tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Human-readable expected shape.
        expected: String,
        /// Shape actually supplied.
        actual: String,
    },

    /// Offset catalog is not a 26-row table of 3-vectors.
    #[error("Offset catalog must be 26x3, got {rows}x{cols}")]
    CatalogShape {
        /// Rows supplied.
        rows: usize,
        /// Columns supplied.
        cols: usize,
    },

    /// A catalog row is not a nonzero displacement with components in
    /// `{-1, 0, 1}`.
    #[error("Offset {index} is not a unit-step displacement: [{}, {}, {}]", offset[0], offset[1], offset[2])]
    InvalidOffset {
        /// Row index in the catalog.
        index: usize,
        /// The rejected displacement.
        offset: [i64; 3],
    },

    /// Two catalog rows encode the same displacement, so costs would be
    /// attributed to an ambiguous direction.
    #[error("Offsets {first} and {second} are duplicates")]
    DuplicateOffset {
        /// First row with the displacement.
        first: usize,
        /// Later row repeating it.
        second: usize,
    },

    /// A likelihood entry is zero, negative, or non-finite; its logarithm
    /// would poison the Q-table with `inf`/`NaN`.
    #[error("Non-positive likelihood {value} at voxel ({}, {}, {}) action {action}", voxel[0], voxel[1], voxel[2])]
    NonPositiveLikelihood {
        /// Voxel index of the offending entry.
        voxel: [usize; 3],
        /// Action index of the offending entry.
        action: usize,
        /// The rejected value.
        value: f32,
    },

    /// After boundary masking a voxel has no feasible action left, so the
    /// trainer could never leave it. Rejected at construction time.
    #[error("Voxel ({}, {}, {}) has no feasible action after boundary masking", voxel[0], voxel[1], voxel[2])]
    IsolatedVoxel {
        /// The voxel with an empty feasible set.
        voxel: [usize; 3],
    },
}

// ---------------------------------------------------------------------------
// ArchiveError
// ---------------------------------------------------------------------------

/// Errors produced while reading or writing NPZ artifacts.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Underlying file I/O failed.
    #[error("Archive I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The NPZ container itself could not be parsed.
    #[error("Cannot read archive: {0}")]
    Read(#[from] ndarray_npy::ReadNpzError),

    /// Writing the NPZ container failed.
    #[error("Cannot write archive: {0}")]
    Write(#[from] ndarray_npy::WriteNpzError),

    /// The archive does not contain the requested array.
    #[error("Archive has no array named `{name}`")]
    MissingArray {
        /// The entry that was looked up.
        name: String,
    },

    /// The array exists but its element type is none of the accepted ones.
    #[error("Array `{name}` has unsupported dtype: {detail}")]
    UnsupportedDtype {
        /// The entry that was read.
        name: String,
        /// What was tried and what failed.
        detail: String,
    },

    /// The array exists but has the wrong number of dimensions.
    #[error("Array `{name}` must have rank {expected}, got {actual}")]
    BadRank {
        /// The entry that was read.
        name: String,
        /// Required rank.
        expected: usize,
        /// Rank actually stored.
        actual: usize,
    },
}

impl ArchiveError {
    /// Shorthand for [`ArchiveError::MissingArray`].
    pub fn missing(name: impl Into<String>) -> Self {
        ArchiveError::MissingArray { name: name.into() }
    }

    /// Shorthand for [`ArchiveError::UnsupportedDtype`].
    pub fn dtype(name: impl Into<String>, detail: impl Into<String>) -> Self {
        ArchiveError::UnsupportedDtype {
            name: name.into(),
            detail: detail.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_message_names_field() {
        let err = ConfigError::invalid_value("learning_rate", "must be in (0, 1]");
        let msg = err.to_string();
        assert!(msg.contains("learning_rate"), "message was: {msg}");
        assert!(msg.contains("(0, 1]"), "message was: {msg}");
    }

    #[test]
    fn cost_error_reports_voxel_and_action() {
        let err = CostError::NonPositiveLikelihood {
            voxel: [3, 0, 7],
            action: 12,
            value: -0.5,
        };
        let msg = err.to_string();
        assert!(msg.contains("(3, 0, 7)"), "message was: {msg}");
        assert!(msg.contains("action 12"), "message was: {msg}");
    }

    #[test]
    fn isolated_voxel_message() {
        let msg = CostError::IsolatedVoxel { voxel: [0, 0, 0] }.to_string();
        assert!(msg.contains("no feasible action"), "message was: {msg}");
    }

    #[test]
    fn train_error_wraps_config_error() {
        let inner = ConfigError::invalid_value("iterations", "must be > 0");
        let outer: TrainError = inner.into();
        assert!(matches!(outer, TrainError::Config(_)));
        assert!(outer.to_string().contains("Configuration error"));
    }

    #[test]
    fn train_error_wraps_cost_error() {
        let inner = CostError::CatalogShape { rows: 13, cols: 3 };
        let outer: TrainError = inner.into();
        assert!(matches!(outer, TrainError::Cost(_)));
        assert!(outer.to_string().contains("26x3"));
    }

    #[test]
    fn archive_missing_array_names_entry() {
        let err = ArchiveError::missing("nbh_pdf");
        assert!(err.to_string().contains("`nbh_pdf`"));
    }
}
