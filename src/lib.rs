//! # Q-routing Tractography Training
//!
//! This crate trains the tabular Q-table used for Q-routing tractography on
//! diffusion MRI volumes. The white-matter volume is a 3D voxel lattice; at
//! every voxel the 26 neighbor displacements are scored by a streamline
//! likelihood, and training relaxes per-(voxel, action) traversal costs
//! until the table encodes cheapest continuations. The downstream tracer
//! reads `exp(-Q)` as a direction distribution while walking streamlines.
//!
//! ## Architecture
//!
//! ```text
//! graph archive (nbh_pdf, nbh)
//!        │ archive::load_graph
//!        ▼
//! OffsetCatalog + likelihood volume
//!        │ CostModel::from_likelihoods      (-ln, boundary masking)
//!        ▼
//!    CostModel ──► Trainer ──► TrainingOutcome { QTable, ConvergenceTrace }
//!        │             │                │
//!   TrainingConfig  StdRng       archive::save_qtable / save_trace
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use ndarray::Array4;
//! use qtract_train::{CostModel, OffsetCatalog, Trainer, TrainingConfig};
//!
//! // A uniform toy volume: every neighbor is equally likely.
//! let likelihoods = Array4::from_elem((2, 2, 2, 26), 0.5_f32);
//! let model = CostModel::from_likelihoods(likelihoods, OffsetCatalog::reference())
//!     .expect("volume is valid");
//!
//! let mut config = TrainingConfig::default();
//! config.iterations = 1_000;
//! config.snapshot_interval = 100;
//!
//! let trainer = Trainer::new(model, config).expect("config is valid");
//! let outcome = trainer.run();
//! assert_eq!(outcome.trace.len(), 10);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod archive;
pub mod config;
pub mod cost;
pub mod error;
pub mod lattice;
pub mod metrics;
pub mod qtable;
pub mod trainer;

// Convenient re-exports at the crate root.
pub use archive::GraphArchive;
pub use config::TrainingConfig;
pub use cost::{CostModel, INFEASIBLE_COST};
pub use error::{ArchiveError, ConfigError, CostError, TrainError, TrainResult};
pub use lattice::{Lattice, OffsetCatalog, NUM_ACTIONS};
pub use metrics::{ConvergenceTrace, QTableStats};
pub use qtable::QTable;
pub use trainer::{Trainer, TrainingOutcome};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
