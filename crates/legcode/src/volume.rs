// Extrusion Tracking
//
// *Le Volume* - Per-region extruded length and its conversion to volume

use crate::error::{GCodeError, Result};
use crate::region::Region;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Cross-sectional area (mm²) of a strand extruded through a nozzle of the given diameter
///
/// This is the cylindrical approximation: `π × (d/2)²`.
pub fn filament_area_mm2(nozzle_diameter_mm: f64) -> f64 {
    let radius = nozzle_diameter_mm / 2.0;
    PI * radius * radius
}

/// Extruded length per region, in millimetres of filament
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtrusionLengths {
    /// Length extruded inside support regions
    pub support_mm: f64,

    /// Length extruded everywhere else
    pub non_support_mm: f64,
}

impl ExtrusionLengths {
    /// Add length to a region's running total
    pub fn add(&mut self, region: Region, length_mm: f64) {
        match region {
            Region::Support => self.support_mm += length_mm,
            Region::NonSupport => self.non_support_mm += length_mm,
        }
    }

    /// Length for one region
    pub fn region(&self, region: Region) -> f64 {
        match region {
            Region::Support => self.support_mm,
            Region::NonSupport => self.non_support_mm,
        }
    }

    /// Convert both totals to volume for the given nozzle diameter
    pub fn to_volumes(&self, nozzle_diameter_mm: f64) -> VolumeEstimate {
        let area = filament_area_mm2(nozzle_diameter_mm);
        VolumeEstimate {
            support_volume_mm3: area * self.support_mm,
            non_support_volume_mm3: area * self.non_support_mm,
        }
    }
}

/// Support / non-support volume breakdown
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VolumeEstimate {
    /// Support material volume (mm³)
    pub support_volume_mm3: f64,

    /// Non-support material volume (mm³)
    pub non_support_volume_mm3: f64,
}

impl VolumeEstimate {
    /// Volume for one region
    pub fn region(&self, region: Region) -> f64 {
        match region {
            Region::Support => self.support_volume_mm3,
            Region::NonSupport => self.non_support_volume_mm3,
        }
    }

    /// Combined volume (mm³)
    pub fn total_mm3(&self) -> f64 {
        self.support_volume_mm3 + self.non_support_volume_mm3
    }

    /// Support volume as a fraction of the total
    ///
    /// Fails with [`GCodeError::ZeroVolume`] instead of returning NaN when
    /// nothing was extruded.
    pub fn support_fraction(&self) -> Result<f64> {
        let total = self.total_mm3();
        if total == 0.0 {
            return Err(GCodeError::ZeroVolume);
        }
        Ok(self.support_volume_mm3 / total)
    }
}

/// Extruder coordinate mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtrusionMode {
    /// `M82`: E values are cumulative
    #[default]
    Absolute,
    /// `M83`: E values are per-move deltas
    Relative,
}

/// Streaming state for region-attributed extrusion
///
/// E values are cumulative (absolute mode). Each move contributes
/// `current - previous` to the active region. Retractions lower the position
/// without subtracting anything, and the matching unretract is not counted
/// again: only progress past the highest E reached since the last `G92` reset
/// is new material.
#[derive(Debug, Clone, Default)]
pub struct ExtrusionTracker {
    region: Region,
    mode: ExtrusionMode,
    position: f64,
    high_water: f64,
    lengths: ExtrusionLengths,
    retractions: usize,
}

impl ExtrusionTracker {
    /// Create a tracker starting outside any support region at E=0
    pub fn new() -> Self {
        Self::default()
    }

    /// Region currently receiving extrusion
    pub fn region(&self) -> Region {
        self.region
    }

    /// Lengths accumulated so far
    pub fn lengths(&self) -> ExtrusionLengths {
        self.lengths
    }

    /// Number of retraction moves seen
    pub fn retractions(&self) -> usize {
        self.retractions
    }

    /// Feed one line of gcode
    pub fn observe(&mut self, line_no: usize, line: &str) -> Result<()> {
        if let Some(region) = Region::from_marker(line) {
            self.region = region;
            return Ok(());
        }

        let code = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let mut words = code.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(());
        };

        match command.to_ascii_uppercase().as_str() {
            "M82" => self.mode = ExtrusionMode::Absolute,
            "M83" => self.mode = ExtrusionMode::Relative,
            "G92" => {
                if let Some(e) = e_word(words, line_no)? {
                    self.position = e;
                    self.high_water = e;
                }
            }
            "G1" | "G01" | "G2" | "G02" | "G3" | "G03" => {
                if let Some(e) = e_word(words, line_no)? {
                    self.extrude(line_no, e)?;
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn extrude(&mut self, line_no: usize, e: f64) -> Result<()> {
        if self.mode == ExtrusionMode::Relative {
            return Err(GCodeError::RelativeExtrusion { line: line_no });
        }

        if e < self.position {
            self.retractions += 1;
        }
        self.position = e;

        if e > self.high_water {
            self.lengths.add(self.region, e - self.high_water);
            self.high_water = e;
        }
        Ok(())
    }
}

fn e_word<'a>(mut words: impl Iterator<Item = &'a str>, line_no: usize) -> Result<Option<f64>> {
    let Some(word) = words.find(|w| w.starts_with('E') || w.starts_with('e')) else {
        return Ok(None);
    };

    let raw = &word[1..];
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| GCodeError::InvalidNumber {
            line: line_no,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(lines: &[&str]) -> Result<ExtrusionTracker> {
        let mut tracker = ExtrusionTracker::new();
        for (idx, line) in lines.iter().enumerate() {
            tracker.observe(idx + 1, line)?;
        }
        Ok(tracker)
    }

    #[test]
    fn area_of_point_four_nozzle() {
        let area = filament_area_mm2(0.4);
        assert!((area - PI * 0.04).abs() < 1e-12);
    }

    #[test]
    fn accumulates_deltas_into_active_region() {
        let tracker = feed(&[
            ";TYPE:Perimeter",
            "G1 X1 Y1 E1.0",
            "G1 X2 Y1 E2.0",
            ";TYPE:Support material",
            "G1 X3 Y1 E2.5",
            ";TYPE:Solid infill",
            "G1 X4 Y1 E3.0",
        ])
        .expect("tracker");

        let lengths = tracker.lengths();
        assert!((lengths.non_support_mm - 2.5).abs() < 1e-9);
        assert!((lengths.support_mm - 0.5).abs() < 1e-9);
    }

    #[test]
    fn retraction_and_unretract_add_nothing() {
        let tracker = feed(&[
            "G1 X1 E5.0",
            "G1 E4.2 F2100",
            "G1 E5.0",
            "G1 X2 E6.0",
        ])
        .expect("tracker");

        assert!((tracker.lengths().non_support_mm - 6.0).abs() < 1e-9);
        assert_eq!(tracker.retractions(), 1);
    }

    #[test]
    fn g92_resets_baseline() {
        let tracker = feed(&["G1 X1 E3.0", "G92 E0", "G1 X2 E1.5"]).expect("tracker");
        assert!((tracker.lengths().non_support_mm - 4.5).abs() < 1e-9);
    }

    #[test]
    fn relative_mode_extrusion_is_rejected() {
        let err = feed(&["M83", "G1 X1 E0.5"]).expect_err("must fail");
        assert!(matches!(err, GCodeError::RelativeExtrusion { line: 2 }));
    }

    #[test]
    fn returning_to_absolute_mode_is_accepted() {
        let tracker = feed(&["M83", "G1 X0 Y0 F3000", "M82", "G1 X1 E1.0"]).expect("tracker");
        assert!((tracker.lengths().non_support_mm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn travel_moves_and_comments_are_ignored() {
        let tracker = feed(&[
            "G0 X10 Y10",
            "G1 X5 Y5 F9000 ; move to start E99",
            "; E5.0",
            "M104 S210",
        ])
        .expect("tracker");
        assert_eq!(tracker.lengths(), ExtrusionLengths::default());
    }

    #[test]
    fn zero_volume_fraction_is_an_error() {
        let estimate = VolumeEstimate::default();
        assert!(matches!(
            estimate.support_fraction(),
            Err(GCodeError::ZeroVolume)
        ));
    }

    #[test]
    fn fraction_is_support_over_total() {
        let estimate = VolumeEstimate {
            support_volume_mm3: 1.0,
            non_support_volume_mm3: 3.0,
        };
        assert!((estimate.support_fraction().expect("fraction") - 0.25).abs() < 1e-12);
        assert_eq!(estimate.region(Region::Support), 1.0);
    }
}
