//! Training configuration for the Q-routing trainer.
//!
//! [`TrainingConfig`] is the single source of truth for the iteration budget,
//! update-rule hyper-parameters, snapshot cadence, and RNG seed used
//! throughout the training pipeline. It is serializable via [`serde`] so a
//! run can be stored to / restored from a JSON file and archived next to its
//! outputs.
//!
//! # Example
//!
//! ```rust
//! use qtract_train::config::TrainingConfig;
//!
//! let cfg = TrainingConfig::default();
//! cfg.validate().expect("default config is valid");
//!
//! assert_eq!(cfg.snapshot_interval, 10_000);
//! assert_eq!(cfg.seed, 42);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// TrainingConfig
// ---------------------------------------------------------------------------

/// Complete configuration for one Q-table training run.
///
/// All fields have documented defaults matching the reference tractography
/// setup. Use [`TrainingConfig::default()`] as a starting point, then
/// override individual fields as needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    // -----------------------------------------------------------------------
    // Budget
    // -----------------------------------------------------------------------
    /// Total number of single-entry Q updates to perform.
    ///
    /// One iteration samples one voxel and one action. Default:
    /// **200_000_000**.
    pub iterations: u64,

    // -----------------------------------------------------------------------
    // Update rule
    // -----------------------------------------------------------------------
    /// Step size for each update, in `(0, 1]`.
    ///
    /// At `1.0` every update fully overwrites the entry with its target.
    /// Default: **0.7**.
    pub learning_rate: f32,

    /// Weight on the best successor value, in `[0, 1]`.
    ///
    /// At `1.0` (the default) future costs are undiscounted, which matches
    /// shortest-path semantics on the voxel graph. Default: **1.0**.
    pub discount: f32,

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------
    /// Iterations between feasible-sum snapshots in the convergence trace.
    /// Default: **10_000**.
    pub snapshot_interval: u64,

    /// Iterations between progress log lines. Default: **1_000_000**.
    pub log_interval: u64,

    // -----------------------------------------------------------------------
    // Early stopping
    // -----------------------------------------------------------------------
    /// Optional plateau threshold on the snapshot-to-snapshot change of the
    /// feasible sum.
    ///
    /// `None` disables early stopping and the full iteration budget always
    /// runs. Default: **None**.
    pub stop_delta: Option<f64>,

    /// Consecutive snapshot deltas that must stay at or below `stop_delta`
    /// before training stops early. Ignored when `stop_delta` is `None`.
    /// Default: **3**.
    pub stop_patience: usize,

    // -----------------------------------------------------------------------
    // Reproducibility
    // -----------------------------------------------------------------------
    /// Seed for the voxel, action, and tie-break RNG.
    ///
    /// Two runs with the same seed, config, and input volume produce
    /// bit-identical Q-tables. Default: **42**.
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            // Budget
            iterations: 200_000_000,
            // Update rule
            learning_rate: 0.7,
            discount: 1.0,
            // Diagnostics
            snapshot_interval: 10_000,
            log_interval: 1_000_000,
            // Early stopping
            stop_delta: None,
            stop_patience: 3,
            // Reproducibility
            seed: 42,
        }
    }
}

impl TrainingConfig {
    /// Load a [`TrainingConfig`] from a JSON file at `path`.
    ///
    /// The loaded configuration is validated before being returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileAccess`] if the file cannot be opened,
    /// [`ConfigError::Parse`] if the JSON is malformed, and
    /// [`ConfigError::InvalidValue`] if a field is out of range.
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: TrainingConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Serialize this configuration to pretty-printed JSON and write it to
    /// `path`, creating parent directories if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileAccess`] if the directory cannot be created
    /// or the file cannot be written.
    pub fn to_json(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::FileAccess {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::invalid_value("(serialization)", e.to_string()))?;
        std::fs::write(path, json).map_err(|source| ConfigError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// Validate all fields and return an error describing the first problem
    /// found, or `Ok(())` if the configuration is coherent.
    ///
    /// # Validated invariants
    ///
    /// - `iterations` must be at least 1.
    /// - `learning_rate` must be finite and in `(0, 1]`.
    /// - `discount` must be finite and in `[0, 1]`.
    /// - `snapshot_interval` and `log_interval` must be at least 1.
    /// - `stop_delta`, when set, must be finite and non-negative, and
    ///   `stop_patience` must then be at least 1.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::invalid_value("iterations", "must be > 0"));
        }

        if !self.learning_rate.is_finite()
            || self.learning_rate <= 0.0
            || self.learning_rate > 1.0
        {
            return Err(ConfigError::invalid_value(
                "learning_rate",
                "must be in (0.0, 1.0]",
            ));
        }

        if !self.discount.is_finite() || self.discount < 0.0 || self.discount > 1.0 {
            return Err(ConfigError::invalid_value(
                "discount",
                "must be in [0.0, 1.0]",
            ));
        }

        if self.snapshot_interval == 0 {
            return Err(ConfigError::invalid_value(
                "snapshot_interval",
                "must be > 0",
            ));
        }
        if self.log_interval == 0 {
            return Err(ConfigError::invalid_value("log_interval", "must be > 0"));
        }

        if let Some(delta) = self.stop_delta {
            if !delta.is_finite() || delta < 0.0 {
                return Err(ConfigError::invalid_value(
                    "stop_delta",
                    "must be finite and >= 0.0",
                ));
            }
            if self.stop_patience == 0 {
                return Err(ConfigError::invalid_value(
                    "stop_patience",
                    "must be > 0 when stop_delta is set",
                ));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_is_valid() {
        let cfg = TrainingConfig::default();
        cfg.validate().expect("default config should be valid");
    }

    #[test]
    fn config_fields_have_expected_defaults() {
        let cfg = TrainingConfig::default();
        assert_eq!(cfg.iterations, 200_000_000);
        assert!((cfg.learning_rate - 0.7).abs() < 1e-10);
        assert!((cfg.discount - 1.0).abs() < 1e-10);
        assert_eq!(cfg.snapshot_interval, 10_000);
        assert_eq!(cfg.log_interval, 1_000_000);
        assert_eq!(cfg.stop_delta, None);
        assert_eq!(cfg.stop_patience, 3);
        assert_eq!(cfg.seed, 42);
    }

    #[test]
    fn json_round_trip() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.json");

        let mut original = TrainingConfig::default();
        original.iterations = 5_000;
        original.stop_delta = Some(1e-6);
        original.to_json(&path).expect("serialization should succeed");

        let loaded = TrainingConfig::from_json(&path).expect("deserialization should succeed");
        assert_eq!(loaded, original);
    }

    #[test]
    fn zero_iterations_is_invalid() {
        let mut cfg = TrainingConfig::default();
        cfg.iterations = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn learning_rate_outside_unit_interval_is_invalid() {
        let mut cfg = TrainingConfig::default();
        cfg.learning_rate = 0.0;
        assert!(cfg.validate().is_err());
        cfg.learning_rate = 1.5;
        assert!(cfg.validate().is_err());
        cfg.learning_rate = f32::NAN;
        assert!(cfg.validate().is_err());
        cfg.learning_rate = 1.0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn discount_outside_unit_interval_is_invalid() {
        let mut cfg = TrainingConfig::default();
        cfg.discount = -0.1;
        assert!(cfg.validate().is_err());
        cfg.discount = 1.1;
        assert!(cfg.validate().is_err());
        cfg.discount = 0.0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_intervals_are_invalid() {
        let mut cfg = TrainingConfig::default();
        cfg.snapshot_interval = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = TrainingConfig::default();
        cfg.log_interval = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn stop_delta_must_be_finite_and_non_negative() {
        let mut cfg = TrainingConfig::default();
        cfg.stop_delta = Some(-1.0);
        assert!(cfg.validate().is_err());
        cfg.stop_delta = Some(f64::INFINITY);
        assert!(cfg.validate().is_err());
        cfg.stop_delta = Some(0.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_patience_only_invalid_with_stop_delta() {
        let mut cfg = TrainingConfig::default();
        cfg.stop_patience = 0;
        assert!(cfg.validate().is_ok(), "patience unused without stop_delta");
        cfg.stop_delta = Some(1e-6);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = TrainingConfig::from_json(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn out_of_range_file_is_rejected_on_load() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.json");

        let mut cfg = TrainingConfig::default();
        cfg.to_json(&path).unwrap();
        // Rewrite with a bad learning rate but valid JSON.
        cfg.learning_rate = 2.0;
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        std::fs::write(&path, json).unwrap();

        let err = TrainingConfig::from_json(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
