//! letranche - Slice orchestration
//!
//! *La Tranche* (The Slice) - Drives an external slicer through a fixed sequence of
//! trial rotations until one orientation slices without stability warnings.
//!
//! The pieces, leaves first:
//! - [`classify`] turns slicer output into a tagged verdict
//! - [`process`] runs one child process with a timeout
//! - [`executor`] performs a single slice attempt for one orientation
//! - [`cleanup`] removes artifacts of rejected attempts
//! - [`search`] enumerates orientations and applies the termination policy

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Slicer output classification.
pub mod classify;
/// Removal of rejected artifacts.
pub mod cleanup;
/// Slicer configuration.
pub mod config;
/// Error types.
pub mod error;
/// Single slice attempts.
pub mod executor;
/// Candidate orientations and the fixed search order.
pub mod orientation;
/// Child-process execution with a timeout.
pub mod process;
/// Rotation search controller.
pub mod search;

pub use classify::{classify, Verdict, STABILITY_MARKER};
pub use cleanup::{remove_artifacts, CleanupSummary};
pub use config::{ConfigError, SlicerConfig};
pub use error::{format_error, Result, SearchError};
pub use executor::{
    canonical_gcode_path, interim_gcode_path, SliceAttemptResult, SliceExecutor, SliceOutcome,
    SliceRequest, SlicerSession,
};
pub use orientation::{Axis, Orientation, SEARCH_ORDER};
pub use search::{resolve_output_dir, RotationSearch, SearchReport, SearchState, SearchStatus};
