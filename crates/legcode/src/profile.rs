// Print Profile Recovery
//
// *Le Profil* (The Profile) - Nozzle diameter and layer height from slicer comments

use crate::error::{GCodeError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Setting name of the nozzle-diameter comment
pub const NOZZLE_DIAMETER_KEY: &str = "nozzle_diameter";

/// Setting name of the layer-height comment
pub const LAYER_HEIGHT_KEY: &str = "layer_height";

/// Print parameters recovered from a gcode artifact
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GCodeProfile {
    /// Nozzle diameter in millimetres
    pub nozzle_diameter_mm: f64,

    /// Layer height in millimetres
    pub layer_height_mm: f64,
}

/// Compiled patterns for the profile comments
///
/// Matches `; nozzle_diameter = 0.4` and `; layer_height = 0.2`, case-insensitive
/// and tolerant of whitespace around the `=`. Multi-extruder lists such as
/// `0.4,0.6` resolve to the first value.
#[derive(Debug, Clone)]
pub struct ProfilePatterns {
    nozzle_diameter: Regex,
    layer_height: Regex,
}

impl ProfilePatterns {
    /// Compile the profile patterns
    pub fn new() -> Result<Self> {
        Ok(Self {
            nozzle_diameter: setting_pattern(NOZZLE_DIAMETER_KEY)?,
            layer_height: setting_pattern(LAYER_HEIGHT_KEY)?,
        })
    }
}

fn setting_pattern(key: &str) -> Result<Regex> {
    Regex::new(&format!(r"(?i);\s*{key}\s*=\s*([\d.]+)"))
        .map_err(|e| GCodeError::InvalidPattern(e.to_string()))
}

/// Collects profile values while lines stream past
///
/// A repeated comment replaces the earlier value until both settings have been
/// seen; from then on the profile is frozen and later lines are ignored.
#[derive(Debug, Clone, Default)]
pub struct ProfileCollector {
    nozzle_diameter_mm: Option<f64>,
    layer_height_mm: Option<f64>,
}

impl ProfileCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect one line for either profile comment
    pub fn observe(&mut self, patterns: &ProfilePatterns, line_no: usize, line: &str) -> Result<()> {
        if self.is_complete() {
            return Ok(());
        }
        if let Some(value) = capture(&patterns.nozzle_diameter, line_no, line)? {
            self.nozzle_diameter_mm = Some(value);
        }
        if let Some(value) = capture(&patterns.layer_height, line_no, line)? {
            self.layer_height_mm = Some(value);
        }
        Ok(())
    }

    /// True once both settings have been seen
    pub fn is_complete(&self) -> bool {
        self.nozzle_diameter_mm.is_some() && self.layer_height_mm.is_some()
    }

    /// Resolve the profile, failing if anything is still missing
    pub fn finish(self) -> Result<GCodeProfile> {
        match (self.nozzle_diameter_mm, self.layer_height_mm) {
            (Some(nozzle_diameter_mm), Some(layer_height_mm)) => Ok(GCodeProfile {
                nozzle_diameter_mm,
                layer_height_mm,
            }),
            (nozzle, layer) => {
                let mut missing = Vec::new();
                if nozzle.is_none() {
                    missing.push(NOZZLE_DIAMETER_KEY);
                }
                if layer.is_none() {
                    missing.push(LAYER_HEIGHT_KEY);
                }
                Err(GCodeError::ProfileIncomplete { missing })
            }
        }
    }
}

fn capture(pattern: &Regex, line_no: usize, line: &str) -> Result<Option<f64>> {
    let Some(raw) = pattern.captures(line).and_then(|c| c.get(1)) else {
        return Ok(None);
    };

    raw.as_str()
        .parse::<f64>()
        .map(Some)
        .map_err(|_| GCodeError::InvalidNumber {
            line: line_no,
            value: raw.as_str().to_string(),
        })
}
