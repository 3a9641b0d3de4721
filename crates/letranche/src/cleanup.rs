// Artifact Cleanup
//
// *Le Nettoyage* (The Cleanup) - Remove gcode left behind by rejected orientations

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What a cleanup pass did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupSummary {
    /// Files that were deleted
    pub removed: Vec<PathBuf>,

    /// Files that could not be deleted
    pub failed: Vec<PathBuf>,

    /// Files that were already gone
    pub already_absent: Vec<PathBuf>,
}

impl CleanupSummary {
    /// Whether every artifact is gone
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Fold another summary into this one
    pub fn merge(&mut self, other: CleanupSummary) {
        self.removed.extend(other.removed);
        self.failed.extend(other.failed);
        self.already_absent.extend(other.already_absent);
    }
}

/// Delete each artifact, continuing past individual failures
///
/// A missing file is not an error. Any other failure is logged and recorded in
/// [`CleanupSummary::failed`]; the remaining paths are still processed.
pub fn remove_artifacts<I, P>(paths: I) -> CleanupSummary
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut summary = CleanupSummary::default();

    for path in paths {
        let path = path.as_ref();
        match fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "Removed rejected artifact");
                summary.removed.push(path.to_path_buf());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                summary.already_absent.push(path.to_path_buf());
            }
            Err(e) => {
                warn!(path = %path.display(), "Failed to remove artifact: {}", e);
                summary.failed.push(path.to_path_buf());
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn removes_existing_and_tolerates_missing() {
        let dir = TempDir::new().expect("tempdir");
        let first = dir.path().join("part.y0.gcode");
        let second = dir.path().join("part.y90.gcode");
        let missing = dir.path().join("part.y180.gcode");
        fs::write(&first, "G1 E1\n").expect("write");
        fs::write(&second, "G1 E1\n").expect("write");

        let summary = remove_artifacts([&first, &missing, &second]);

        assert_eq!(summary.removed, vec![first.clone(), second.clone()]);
        assert_eq!(summary.already_absent, vec![missing]);
        assert!(summary.is_complete());
        assert!(!first.exists());
        assert!(!second.exists());
    }

    #[test]
    fn failure_does_not_stop_the_pass() {
        let dir = TempDir::new().expect("tempdir");
        // A directory cannot be removed with remove_file.
        let stubborn = dir.path().join("stubborn.gcode");
        fs::create_dir(&stubborn).expect("mkdir");
        let after = dir.path().join("after.gcode");
        fs::write(&after, "").expect("write");

        let summary = remove_artifacts([&stubborn, &after]);

        assert_eq!(summary.failed, vec![stubborn]);
        assert_eq!(summary.removed, vec![after.clone()]);
        assert!(!summary.is_complete());
        assert!(!after.exists());
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let summary = remove_artifacts(Vec::<PathBuf>::new());
        assert_eq!(summary, CleanupSummary::default());
    }

    #[test]
    fn merge_accumulates() {
        let mut total = CleanupSummary::default();
        total.merge(CleanupSummary {
            removed: vec![PathBuf::from("a")],
            ..Default::default()
        });
        total.merge(CleanupSummary {
            failed: vec![PathBuf::from("b")],
            ..Default::default()
        });
        assert_eq!(total.removed.len(), 1);
        assert_eq!(total.failed.len(), 1);
    }
}
