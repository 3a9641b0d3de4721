// Rotation Search Controller
//
// *La Recherche* (The Search) - Try each orientation in turn until one slices cleanly

use crate::cleanup::{remove_artifacts, CleanupSummary};
use crate::error::{Result, SearchError};
use crate::executor::{
    canonical_gcode_path, SliceAttemptResult, SliceExecutor, SliceOutcome, SliceRequest,
};
use crate::orientation::{Orientation, SEARCH_ORDER};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Lifecycle status of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchStatus {
    /// No search has run yet, or the last one was rejected before any attempt
    #[default]
    Idle,
    /// Attempts are in progress
    Running,
    /// An orientation sliced cleanly
    Succeeded,
    /// Every orientation was warned or failed
    Exhausted,
}

/// Mutable lifecycle state of a [`RotationSearch`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    /// Current status
    pub status: SearchStatus,
    /// Attempts made by the current (or last) search
    pub attempts: usize,
    /// Accepted orientation of the last successful search
    pub winner: Option<Orientation>,
    /// Error message of the last unsuccessful search
    pub last_error: Option<String>,
}

/// Output of a successful search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    /// Part that was sliced
    pub part: PathBuf,
    /// The one gcode artifact left on disk
    pub accepted: PathBuf,
    /// Orientation that produced it
    pub winner: Orientation,
    /// Every attempt, in search order, ending with the winner
    pub attempts: Vec<SliceAttemptResult>,
    /// Deletion of rejected artifacts
    pub cleanup: CleanupSummary,
}

/// Controller that walks [`SEARCH_ORDER`] until the executor reports Clean.
pub struct RotationSearch<E: SliceExecutor> {
    /// Mutable lifecycle state.
    pub state: SearchState,
    executor: E,
}

impl<E: SliceExecutor> RotationSearch<E> {
    /// Create a search driving `executor`.
    pub fn new(executor: E) -> Self {
        Self {
            state: SearchState::default(),
            executor,
        }
    }

    /// The executor attempts are delegated to.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Search for an orientation that slices without stability warnings.
    ///
    /// Attempts run strictly in sequence. The first Clean attempt wins and its
    /// gcode is renamed to `<output_dir>/<stem>.gcode`; the artifact of every
    /// rejected attempt is deleted right after that attempt. When `output_dir`
    /// is `None` the part's own folder is used.
    ///
    /// # Errors
    ///
    /// * [`SearchError::Configuration`] if `profile` is empty or missing
    /// * [`SearchError::MissingPart`] if `part` does not exist
    /// * [`SearchError::ExhaustedSearch`] if no orientation sliced cleanly
    pub fn run(
        &mut self,
        part: &Path,
        profile: &Path,
        output_dir: Option<&Path>,
    ) -> Result<SearchReport> {
        self.run_as(part, profile, output_dir, None)
    }

    /// Like [`run`](Self::run), but the accepted gcode is saved as
    /// `<output_dir>/<accepted_name>` when a name is given.
    pub fn run_as(
        &mut self,
        part: &Path,
        profile: &Path,
        output_dir: Option<&Path>,
        accepted_name: Option<&str>,
    ) -> Result<SearchReport> {
        self.state = SearchState::default();

        let output_dir = match prepare(part, profile, output_dir) {
            Ok(dir) => dir,
            Err(e) => {
                self.state.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        self.state.status = SearchStatus::Running;
        info!(part = %part.display(), "Starting rotation search");

        let mut attempts = Vec::with_capacity(SEARCH_ORDER.len());
        let mut cleanup = CleanupSummary::default();

        for orientation in SEARCH_ORDER {
            let request = SliceRequest {
                part: part.to_path_buf(),
                profile: profile.to_path_buf(),
                output_dir: output_dir.clone(),
                orientation,
            };

            self.state.attempts += 1;
            let result = self.executor.slice(&request);

            if result.outcome == SliceOutcome::Clean {
                let interim = result
                    .output_path
                    .clone()
                    .unwrap_or_else(|| request.output_path());
                let canonical = match accepted_name {
                    Some(name) => output_dir.join(name),
                    None => canonical_gcode_path(&output_dir, part),
                };
                let accepted = promote(&interim, &canonical);

                info!(
                    %orientation,
                    path = %accepted.display(),
                    "Accepted orientation"
                );
                attempts.push(result);

                self.state.status = SearchStatus::Succeeded;
                self.state.winner = Some(orientation);
                return Ok(SearchReport {
                    part: part.to_path_buf(),
                    accepted,
                    winner: orientation,
                    attempts,
                    cleanup,
                });
            }

            cleanup.merge(remove_artifacts(rejected_artifacts(&request, &result)));
            attempts.push(result);
        }

        let error = SearchError::ExhaustedSearch {
            part: part.to_path_buf(),
            attempts,
        };
        warn!(part = %part.display(), "{}", error);

        self.state.status = SearchStatus::Exhausted;
        self.state.last_error = Some(error.to_string());
        Err(error)
    }
}

/// Check inputs and resolve the output folder before any process is launched
fn prepare(part: &Path, profile: &Path, output_dir: Option<&Path>) -> Result<PathBuf> {
    if profile.as_os_str().is_empty() {
        return Err(SearchError::configuration("no slicer profile supplied"));
    }
    if !profile.is_file() {
        return Err(SearchError::configuration(format!(
            "slicer profile not found: {}",
            profile.display()
        )));
    }
    if !part.is_file() {
        return Err(SearchError::MissingPart(part.to_path_buf()));
    }

    let dir = resolve_output_dir(part, output_dir);
    fs::create_dir_all(&dir)
        .map_err(|e| SearchError::io("Failed to create output folder", &dir, e))?;

    Ok(dir)
}

/// Folder a part's gcode goes to: `output_dir` when given, else the part's folder
pub fn resolve_output_dir(part: &Path, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => match part.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    }
}

/// Every path a rejected attempt may have left behind
fn rejected_artifacts(request: &SliceRequest, result: &SliceAttemptResult) -> Vec<PathBuf> {
    let interim = request.output_path();
    let mut paths = vec![interim.clone()];
    if let Some(reported) = &result.output_path {
        if *reported != interim {
            paths.push(reported.clone());
        }
    }
    paths
}

/// Rename the winning artifact to its canonical name, keeping it in place on failure
fn promote(interim: &Path, canonical: &Path) -> PathBuf {
    if interim == canonical {
        return interim.to_path_buf();
    }

    match fs::rename(interim, canonical) {
        Ok(()) => canonical.to_path_buf(),
        Err(e) => {
            warn!(
                from = %interim.display(),
                to = %canonical.display(),
                "Could not rename accepted gcode, keeping interim name: {}",
                e
            );
            interim.to_path_buf()
        }
    }
}
