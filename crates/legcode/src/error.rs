//! Errors raised while analyzing gcode

use std::path::PathBuf;
use thiserror::Error;

/// Result type for gcode analysis
pub type Result<T> = std::result::Result<T, GCodeError>;

/// Gcode analysis errors
///
/// None of these affect whether an orientation is accepted; they only stop the
/// estimate they were raised from.
#[derive(Debug, Error)]
pub enum GCodeError {
    /// The gcode file could not be opened
    #[error("failed to open gcode {path:?}: {source}")]
    Open {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Reading the stream failed part way through
    #[error("I/O error while reading gcode: {0}")]
    Io(#[from] std::io::Error),

    /// A built-in line pattern failed to compile
    #[error("invalid gcode pattern: {0}")]
    InvalidPattern(String),

    /// The nozzle-diameter and/or layer-height comments were not found
    #[error("gcode profile incomplete, missing: {}", .missing.join(", "))]
    ProfileIncomplete {
        /// Names of the settings that were never seen
        missing: Vec<&'static str>,
    },

    /// No filament was extruded at all, so a fraction is undefined
    #[error("total extruded volume is zero; support fraction is undefined")]
    ZeroVolume,

    /// An extrusion move was issued while the extruder was in relative mode
    #[error("relative extrusion (M83) in effect at line {line}; only absolute E values are supported")]
    RelativeExtrusion {
        /// 1-based line number of the offending move
        line: usize,
    },

    /// A numeric field could not be parsed
    #[error("invalid number '{value}' at line {line}")]
    InvalidNumber {
        /// 1-based line number
        line: usize,
        /// Raw text that failed to parse
        value: String,
    },
}
