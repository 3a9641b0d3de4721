//! legcode - GCode heuristic analysis
//!
//! *Le G-code* - Recovers the print profile (nozzle diameter, layer height) and a
//! support / non-support volume breakdown from a finished gcode artifact.
//!
//! Everything is computed in a single streaming pass: extruded filament length is
//! integrated per region while the profile comments are collected, and lengths are
//! converted to volume once the nozzle diameter is known. Slicers usually write
//! their configuration block at the *end* of the file.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Single-pass analyzer and file-level entry points.
pub mod analysis;
/// Error types.
pub mod error;
/// Nozzle / layer-height comment recovery.
pub mod profile;
/// `;TYPE:` region markers.
pub mod region;
/// Extrusion tracking and volume conversion.
pub mod volume;

pub use analysis::{
    analyze_file, estimate_region_volume, extract_profile, fraction_of_support, GCodeAnalysis,
    GCodeAnalyzer,
};
pub use error::{GCodeError, Result};
pub use profile::GCodeProfile;
pub use region::Region;
pub use volume::{filament_area_mm2, ExtrusionLengths, VolumeEstimate};
