// Output Classification
//
// *Le Verdict* - The single place that knows what slicer output means

use crate::executor::SliceOutcome;

/// Substring the slicer prints when the sliced object may topple without support
pub const STABILITY_MARKER: &str = "Detected print stability issues";

/// Verdict on one slicer run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Zero exit, no stability marker, gcode written
    Clean,

    /// Zero exit with a stability warning; carries the warning detail
    Warned(String),

    /// Non-zero exit; carries the exit code when the process was not killed by a signal
    Failed(Option<i32>),

    /// Output did not have any shape we recognize
    Unparseable(String),
}

impl Verdict {
    /// Outcome recorded for the search
    ///
    /// Unparseable output is never accepted; it counts as a failed attempt.
    pub fn outcome(&self) -> SliceOutcome {
        match self {
            Verdict::Clean => SliceOutcome::Clean,
            Verdict::Warned(_) => SliceOutcome::Warned,
            Verdict::Failed(_) | Verdict::Unparseable(_) => SliceOutcome::Failed,
        }
    }
}

/// Classify a finished slicer run
///
/// # Arguments
///
/// * `success` - Whether the process exited with status zero
/// * `code` - Exit code, if any
/// * `output` - Captured stdout followed by stderr
/// * `artifact_present` - Whether the requested gcode file exists
pub fn classify(success: bool, code: Option<i32>, output: &str, artifact_present: bool) -> Verdict {
    if !success {
        return Verdict::Failed(code);
    }

    if output.contains(STABILITY_MARKER) {
        return match warning_detail(output) {
            Some(detail) => Verdict::Warned(detail),
            None => Verdict::Unparseable(format!(
                "'{}' reported without any detail",
                STABILITY_MARKER
            )),
        };
    }

    if !artifact_present {
        return Verdict::Unparseable(
            "slicer exited successfully but wrote no gcode".to_string(),
        );
    }

    Verdict::Clean
}

/// Text following the stability marker
///
/// Skips a `:` and any whitespace (including the line break PrusaSlicer prints
/// after the marker), then takes everything up to the next newline.
pub fn warning_detail(output: &str) -> Option<String> {
    let start = output.find(STABILITY_MARKER)? + STABILITY_MARKER.len();
    let rest = output[start..].trim_start_matches(':').trim_start();
    let detail = rest.lines().next()?.trim();

    if detail.is_empty() {
        None
    } else {
        Some(detail.to_string())
    }
}
