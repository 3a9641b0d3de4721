// Single-Pass GCode Analysis
//
// *L'Analyse* (The Analysis) - Profile and volume breakdown from one read of the file

use crate::error::{GCodeError, Result};
use crate::profile::{GCodeProfile, ProfileCollector, ProfilePatterns};
use crate::region::Region;
use crate::volume::{ExtrusionLengths, ExtrusionTracker, VolumeEstimate};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::ControlFlow;
use std::path::Path;
use tracing::debug;

/// Everything recovered from one pass over a gcode artifact
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GCodeAnalysis {
    /// Resolved print profile
    pub profile: GCodeProfile,

    /// Extruded filament length per region
    pub lengths: ExtrusionLengths,

    /// Volume per region, using the profile's nozzle diameter
    pub volumes: VolumeEstimate,

    /// Number of retraction moves encountered
    pub retractions: usize,

    /// Number of lines scanned
    pub lines: usize,
}

impl GCodeAnalysis {
    /// Support volume as a fraction of all extruded volume
    pub fn support_fraction(&self) -> Result<f64> {
        self.volumes.support_fraction()
    }
}

/// Reusable gcode analyzer
///
/// Holds the compiled comment patterns; construct once and call any number of
/// times. All methods accept any [`BufRead`], so they work on files, in-memory
/// buffers and pipes alike.
#[derive(Debug, Clone)]
pub struct GCodeAnalyzer {
    patterns: ProfilePatterns,
}

impl GCodeAnalyzer {
    /// Create an analyzer
    pub fn new() -> Result<Self> {
        Ok(Self {
            patterns: ProfilePatterns::new()?,
        })
    }

    /// Recover the print profile, stopping as soon as both settings are found
    pub fn profile<R: BufRead>(&self, reader: R) -> Result<GCodeProfile> {
        let mut collector = ProfileCollector::new();

        for_each_line(reader, |line_no, line| {
            collector.observe(&self.patterns, line_no, line)?;
            Ok(if collector.is_complete() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            })
        })?;

        collector.finish()
    }

    /// Volume (mm³) extruded inside one region, for a known nozzle diameter
    pub fn region_volume<R: BufRead>(
        &self,
        reader: R,
        nozzle_diameter_mm: f64,
        region: Region,
    ) -> Result<f64> {
        let mut tracker = ExtrusionTracker::new();

        for_each_line(reader, |line_no, line| {
            tracker.observe(line_no, line)?;
            Ok(ControlFlow::Continue(()))
        })?;

        Ok(tracker.lengths().to_volumes(nozzle_diameter_mm).region(region))
    }

    /// Full analysis in a single streaming pass
    ///
    /// The profile comments may appear anywhere (PrusaSlicer writes them after
    /// the moves), so lengths are integrated first and converted to volume at
    /// the end.
    pub fn analyze<R: BufRead>(&self, reader: R) -> Result<GCodeAnalysis> {
        let mut collector = ProfileCollector::new();
        let mut tracker = ExtrusionTracker::new();
        let mut lines = 0;

        for_each_line(reader, |line_no, line| {
            lines = line_no;
            if !collector.is_complete() {
                collector.observe(&self.patterns, line_no, line)?;
            }
            tracker.observe(line_no, line)?;
            Ok(ControlFlow::Continue(()))
        })?;

        let profile = collector.finish()?;
        let lengths = tracker.lengths();
        let volumes = lengths.to_volumes(profile.nozzle_diameter_mm);

        debug!(
            nozzle_diameter_mm = profile.nozzle_diameter_mm,
            layer_height_mm = profile.layer_height_mm,
            support_mm3 = volumes.support_volume_mm3,
            non_support_mm3 = volumes.non_support_volume_mm3,
            lines,
            "gcode analysis complete"
        );

        Ok(GCodeAnalysis {
            profile,
            lengths,
            volumes,
            retractions: tracker.retractions(),
            lines,
        })
    }
}

/// Iterate over lines with 1-based numbering, tolerating non-UTF-8 bytes
fn for_each_line<R, F>(mut reader: R, mut visit: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(usize, &str) -> Result<ControlFlow<()>>,
{
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        line_no += 1;

        let text = String::from_utf8_lossy(&buf);
        if visit(line_no, text.trim())?.is_break() {
            return Ok(());
        }
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| GCodeError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Recover nozzle diameter and layer height from a gcode file
pub fn extract_profile<P: AsRef<Path>>(gcode: P) -> Result<GCodeProfile> {
    GCodeAnalyzer::new()?.profile(open(gcode.as_ref())?)
}

/// Volume (mm³) extruded inside `region` of a gcode file
pub fn estimate_region_volume<P: AsRef<Path>>(
    gcode: P,
    nozzle_diameter_mm: f64,
    region: Region,
) -> Result<f64> {
    GCodeAnalyzer::new()?.region_volume(open(gcode.as_ref())?, nozzle_diameter_mm, region)
}

/// Analyze a gcode file in a single pass
pub fn analyze_file<P: AsRef<Path>>(gcode: P) -> Result<GCodeAnalysis> {
    GCodeAnalyzer::new()?.analyze(open(gcode.as_ref())?)
}

/// Fraction of extruded volume that is support material
///
/// # Errors
///
/// * [`GCodeError::ProfileIncomplete`] if the profile comments are missing
/// * [`GCodeError::ZeroVolume`] if nothing was extruded
pub fn fraction_of_support<P: AsRef<Path>>(gcode: P) -> Result<f64> {
    analyze_file(gcode)?.support_fraction()
}
