// Error Handling
//
// *La Gestion des Erreurs* (The Error Management) - Terminal errors of a rotation search

use crate::config::ConfigError;
use crate::executor::{SliceAttemptResult, SliceOutcome};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for slice orchestration
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that escape the rotation search
///
/// Single-attempt failures (launch errors, non-zero exits, timeouts) never show
/// up here; they are folded into [`SliceOutcome::Failed`] and the search moves on.
#[derive(Debug, Error)]
pub enum SearchError {
    /// No usable slicer profile was supplied
    #[error("Configuration error: {message}")]
    Configuration {
        /// What was wrong
        message: String,
    },

    /// Slicer settings file could not be loaded or validated
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The part to slice does not exist
    #[error("Part not found: {0:?}")]
    MissingPart(PathBuf),

    /// An orientation outside the supported set was requested
    #[error("Invalid orientation: axis {axis}, {degrees} degrees (expected X or Y, a multiple of 90 in [0, 360))")]
    InvalidOrientation {
        /// Requested axis
        axis: String,
        /// Requested rotation
        degrees: i32,
    },

    /// Every candidate orientation was warned or failed
    #[error("No orientation of {part:?} sliced without stability warnings ({} attempts)", .attempts.len())]
    ExhaustedSearch {
        /// The part that was searched
        part: PathBuf,
        /// Per-orientation outcomes, in search order
        attempts: Vec<SliceAttemptResult>,
    },

    /// I/O errors with context
    #[error("I/O error: {context} (path: {path:?})")]
    Io {
        /// Operation being performed
        context: String,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The gcode analyzer could not be constructed
    #[error(transparent)]
    Analysis(#[from] legcode::GCodeError),
}

impl SearchError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        SearchError::Configuration {
            message: message.into(),
        }
    }

    /// Create an I/O error with context
    pub fn io(context: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SearchError::Io {
            context: context.into(),
            path: path.into(),
            source,
        }
    }

    /// Attempts recorded by an exhausted search, if this is one
    pub fn attempts(&self) -> Option<&[SliceAttemptResult]> {
        match self {
            SearchError::ExhaustedSearch { attempts, .. } => Some(attempts),
            _ => None,
        }
    }

    /// Get user-friendly suggestion for recovery
    pub fn suggestion(&self) -> Option<String> {
        match self {
            SearchError::Configuration { .. } => {
                Some("Pass --profile with an existing slicer .ini profile.".to_string())
            }
            SearchError::Config(_) => {
                Some("Check the slicer settings file (binary, timeout_secs).".to_string())
            }
            SearchError::ExhaustedSearch { attempts, .. } => {
                if attempts.iter().all(|a| a.outcome == SliceOutcome::Failed) {
                    Some("Every attempt failed to run; check that the slicer binary is installed.".to_string())
                } else {
                    Some("Re-slice with support material enabled; see the estimated support fractions.".to_string())
                }
            }
            _ => None,
        }
    }
}

/// Format error for user display
pub fn format_error(error: &SearchError) -> String {
    let mut message = format!("Error: {}", error);

    if let Some(suggestion) = error.suggestion() {
        message.push_str(&format!("\n\nSuggestion: {}", suggestion));
    }

    message
}
