// Slice Attempt Executor
//
// *L'Exécutant* (The Executor) - One slicer run for one candidate orientation

use crate::classify::{classify, Verdict};
use crate::config::SlicerConfig;
use crate::error::Result;
use crate::orientation::Orientation;
use crate::process::run_with_timeout;
use legcode::GCodeAnalyzer;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Classified outcome of one slice attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SliceOutcome {
    /// Sliced without stability warnings
    Clean,
    /// Sliced, but the slicer flagged stability issues
    Warned,
    /// The slicer could not be run or did not succeed
    Failed,
}

/// Everything needed for one attempt
#[derive(Debug, Clone)]
pub struct SliceRequest {
    /// Part to slice (STL, 3MF, OBJ, ...)
    pub part: PathBuf,
    /// Slicer profile (`.ini`) to load
    pub profile: PathBuf,
    /// Folder the gcode is written to
    pub output_dir: PathBuf,
    /// Rotation applied before slicing
    pub orientation: Orientation,
}

impl SliceRequest {
    /// Where this attempt writes its gcode
    pub fn output_path(&self) -> PathBuf {
        interim_gcode_path(&self.output_dir, &self.part, self.orientation)
    }
}

/// Result of one slice attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceAttemptResult {
    /// Orientation that was tried
    pub orientation: Orientation,
    /// Gcode written by the attempt, if any
    pub output_path: Option<PathBuf>,
    /// Classified outcome
    pub outcome: SliceOutcome,
    /// Warning detail or failure reason
    pub diagnostic: Option<String>,
    /// Estimated support fraction (warned attempts only)
    pub support_fraction: Option<f64>,
}

impl SliceAttemptResult {
    /// A clean attempt that produced `path`
    pub fn clean(orientation: Orientation, path: PathBuf) -> Self {
        Self {
            orientation,
            output_path: Some(path),
            outcome: SliceOutcome::Clean,
            diagnostic: None,
            support_fraction: None,
        }
    }

    /// A warned attempt
    pub fn warned(orientation: Orientation, path: Option<PathBuf>, detail: impl Into<String>) -> Self {
        Self {
            orientation,
            output_path: path,
            outcome: SliceOutcome::Warned,
            diagnostic: Some(detail.into()),
            support_fraction: None,
        }
    }

    /// A failed attempt
    pub fn failed(orientation: Orientation, path: Option<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            orientation,
            output_path: path,
            outcome: SliceOutcome::Failed,
            diagnostic: Some(reason.into()),
            support_fraction: None,
        }
    }

    /// Attach a support-fraction estimate
    pub fn with_support_fraction(mut self, fraction: Option<f64>) -> Self {
        self.support_fraction = fraction;
        self
    }
}

/// Abstraction for slice execution, enabling test doubles.
pub trait SliceExecutor {
    /// Perform one attempt. Never fails: problems are reported in the outcome.
    fn slice(&self, request: &SliceRequest) -> SliceAttemptResult;
}

impl<T: SliceExecutor + ?Sized> SliceExecutor for &T {
    fn slice(&self, request: &SliceRequest) -> SliceAttemptResult {
        (**self).slice(request)
    }
}

/// Canonical gcode path for a part: `<output_dir>/<stem>.gcode`
pub fn canonical_gcode_path(output_dir: &Path, part: &Path) -> PathBuf {
    output_dir.join(format!("{}.gcode", part_stem(part)))
}

/// Rotation-unique gcode path for one attempt: `<output_dir>/<stem>.<tag>.gcode`
///
/// Keeping interim names distinct per orientation means two searches over the
/// same part never overwrite each other's in-flight output.
pub fn interim_gcode_path(output_dir: &Path, part: &Path, orientation: Orientation) -> PathBuf {
    output_dir.join(format!("{}.{}.gcode", part_stem(part), orientation.tag()))
}

fn part_stem(part: &Path) -> String {
    part.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "part".to_string())
}

/// Explicitly constructed slicer session
///
/// Built once from a [`SlicerConfig`] and passed by reference to the search;
/// owns the compiled gcode analyzer used for warned attempts.
#[derive(Debug, Clone)]
pub struct SlicerSession {
    config: SlicerConfig,
    analyzer: Option<GCodeAnalyzer>,
}

impl SlicerSession {
    /// Create a session after validating the configuration
    pub fn new(config: SlicerConfig) -> Result<Self> {
        config.validate()?;
        let analyzer = if config.analyze_warnings {
            Some(GCodeAnalyzer::new()?)
        } else {
            None
        };

        info!(
            binary = %config.binary.display(),
            timeout_secs = config.timeout_secs,
            "Slicer session ready"
        );
        Ok(Self { config, analyzer })
    }

    /// Session configuration
    pub fn config(&self) -> &SlicerConfig {
        &self.config
    }

    /// Arguments passed to the slicer binary for `request`
    ///
    /// `[prefix..] --load <profile> --rotate-<axis> <deg> [extra..] --slice
    /// --export-gcode --output <path> <part>`
    pub fn slicer_args(&self, request: &SliceRequest, output_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.config.prefix_args.iter().map(OsString::from).collect();

        args.push("--load".into());
        args.push(request.profile.clone().into_os_string());
        args.push(request.orientation.axis().rotate_flag().into());
        args.push(request.orientation.degrees().to_string().into());
        args.extend(self.config.extra_args.iter().map(OsString::from));
        args.push("--slice".into());
        args.push("--export-gcode".into());
        args.push("--output".into());
        args.push(output_path.as_os_str().to_os_string());
        args.push(request.part.clone().into_os_string());

        args
    }

    fn support_fraction(&self, gcode: &Path) -> Option<f64> {
        let analyzer = self.analyzer.as_ref()?;

        let estimate = File::open(gcode)
            .map_err(legcode::GCodeError::from)
            .and_then(|file| analyzer.analyze(BufReader::new(file)))
            .and_then(|analysis| analysis.support_fraction());

        match estimate {
            Ok(fraction) => {
                info!(
                    path = %gcode.display(),
                    "Estimated support fraction: {:.2}",
                    fraction
                );
                Some(fraction)
            }
            Err(e) => {
                warn!(path = %gcode.display(), "Support estimate unavailable: {}", e);
                None
            }
        }
    }
}

impl SliceExecutor for SlicerSession {
    fn slice(&self, request: &SliceRequest) -> SliceAttemptResult {
        let orientation = request.orientation;
        let output_path = request.output_path();
        let args = self.slicer_args(request, &output_path);

        debug!(
            axis = %orientation.axis(),
            degrees = orientation.degrees(),
            "Slicing with rotation..."
        );

        let existing = |path: &Path| path.is_file().then(|| path.to_path_buf());

        let output = match run_with_timeout(&self.config.binary, &args, self.config.timeout()) {
            Ok(output) => output,
            Err(e) => {
                error!(%orientation, "Slicer run failed: {}", e);
                return SliceAttemptResult::failed(orientation, existing(&output_path), e.to_string());
            }
        };

        debug!(%orientation, stdout = %output.stdout, "Slicer output");

        let artifact_present = output_path.is_file();
        match classify(output.success(), output.code(), &output.combined(), artifact_present) {
            Verdict::Clean => {
                info!(%orientation, "Slicing successful with no warnings");
                SliceAttemptResult::clean(orientation, output_path)
            }
            Verdict::Warned(detail) => {
                info!(%orientation, "Detected warnings: {}", detail);
                let fraction = if artifact_present {
                    self.support_fraction(&output_path)
                } else {
                    None
                };
                SliceAttemptResult::warned(orientation, existing(&output_path), detail)
                    .with_support_fraction(fraction)
            }
            Verdict::Failed(code) => {
                error!(%orientation, ?code, stderr = %output.stderr.trim(), "Error during slicing");
                let reason = match code {
                    Some(code) => format!("slicer exited with status {}", code),
                    None => "slicer terminated by signal".to_string(),
                };
                SliceAttemptResult::failed(orientation, existing(&output_path), reason)
            }
            Verdict::Unparseable(reason) => {
                warn!(%orientation, "Unrecognized slicer output: {}", reason);
                SliceAttemptResult::failed(
                    orientation,
                    existing(&output_path),
                    format!("unparseable diagnostic: {}", reason),
                )
            }
        }
    }
}
