// Candidate Orientations
//
// *L'Orientation* - Quarter-turn rotations and the order they are tried in

use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rotation axis understood by the slicer's `--rotate-<axis>` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Rotate about X.
    X,
    /// Rotate about Y.
    Y,
}

impl Axis {
    /// Parse an axis name (`x`/`y`, any case).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            _ => None,
        }
    }

    /// Lower-case name used in flags and file names.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
        }
    }

    /// Slicer flag applying a rotation about this axis.
    pub const fn rotate_flag(&self) -> &'static str {
        match self {
            Self::X => "--rotate-x",
            Self::Y => "--rotate-y",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "X"),
            Self::Y => write!(f, "Y"),
        }
    }
}

/// A single-axis, quarter-turn rotation applied before slicing.
///
/// Only constructible through [`Orientation::new`], so every value held by the
/// executor already satisfies `degrees % 90 == 0` and `0 <= degrees < 360`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Orientation {
    axis: Axis,
    degrees: u16,
}

impl Orientation {
    /// Validate and build an orientation.
    pub fn new(axis: Axis, degrees: i32) -> Result<Self> {
        if !(0..360).contains(&degrees) || degrees % 90 != 0 {
            return Err(SearchError::InvalidOrientation {
                axis: axis.to_string(),
                degrees,
            });
        }
        Ok(Self {
            axis,
            degrees: degrees as u16,
        })
    }

    /// Parse an axis name and validate the pair.
    pub fn parse(axis: &str, degrees: i32) -> Result<Self> {
        let parsed = Axis::parse(axis).ok_or_else(|| SearchError::InvalidOrientation {
            axis: axis.to_string(),
            degrees,
        })?;
        Self::new(parsed, degrees)
    }

    /// Rotation axis.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Rotation in degrees.
    pub fn degrees(&self) -> u16 {
        self.degrees
    }

    /// Short tag used in interim file names, e.g. `y270`.
    pub fn tag(&self) -> String {
        format!("{}{}", self.axis.as_str(), self.degrees)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}°", self.axis, self.degrees)
    }
}

/// Fixed search order.
///
/// All four Y rotations first, then the two X rotations that are not
/// equivalent to an already-tried Y case (X 0° is Y 0°, X 180° mirrors Y 180°).
pub const SEARCH_ORDER: [Orientation; 6] = [
    Orientation { axis: Axis::Y, degrees: 0 },
    Orientation { axis: Axis::Y, degrees: 90 },
    Orientation { axis: Axis::Y, degrees: 180 },
    Orientation { axis: Axis::Y, degrees: 270 },
    Orientation { axis: Axis::X, degrees: 90 },
    Orientation { axis: Axis::X, degrees: 270 },
];
