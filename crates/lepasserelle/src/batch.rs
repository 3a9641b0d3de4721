// Batch Slicing
//
// *Le Lot* (The Batch) - Run the rotation search over every part in a folder

use letranche::{canonical_gcode_path, resolve_output_dir, RotationSearch, SliceExecutor};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// File extensions the slicer accepts as parts
pub const PART_EXTENSIONS: &[&str] = &["stl", "3mf", "obj"];

/// Whether `path` looks like a sliceable part
pub fn is_part(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            PART_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Collect the parts under `dir`, sorted by path
///
/// Only the folder itself is scanned unless `recursive` is set. Unreadable
/// entries are logged and skipped.
pub fn discover_parts(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let walker = WalkDir::new(dir)
        .follow_links(false)
        .max_depth(if recursive { usize::MAX } else { 1 });

    let mut parts: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_part(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    parts.sort();
    parts
}

/// A part that sliced cleanly
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlicedPart {
    /// Source part
    pub part: PathBuf,
    /// Accepted gcode
    pub gcode: PathBuf,
    /// Winning orientation, e.g. `Y 90°`
    pub orientation: String,
}

/// A part with no accepted gcode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedPart {
    /// Source part
    pub part: PathBuf,
    /// Why it failed
    pub reason: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Parts with an accepted gcode
    pub sliced: Vec<SlicedPart>,
    /// Parts that could not be sliced cleanly
    pub failed: Vec<FailedPart>,
}

impl BatchSummary {
    /// Whether every part sliced cleanly
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of parts processed
    pub fn total(&self) -> usize {
        self.sliced.len() + self.failed.len()
    }
}

/// Gcode file name for each part, or the earlier part it would overwrite
///
/// Parts normally keep `<stem>.gcode`. When several parts share a stem in the
/// same output folder (`bracket.stl` and `bracket.3mf`), each of them keeps its
/// extension instead (`bracket.stl.gcode`). A part whose name is still taken
/// is refused rather than overwriting another part's gcode.
pub fn plan_gcode_names(
    parts: &[PathBuf],
    output_dir: Option<&Path>,
) -> Vec<Result<String, PathBuf>> {
    let canonical = |part: &PathBuf| {
        let dir = resolve_output_dir(part, output_dir);
        let name = canonical_gcode_path(&dir, part)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (dir, name)
    };

    let mut stems: HashMap<(PathBuf, String), usize> = HashMap::new();
    for part in parts {
        *stems.entry(canonical(part)).or_default() += 1;
    }

    let mut taken: HashMap<(PathBuf, String), PathBuf> = HashMap::new();
    parts
        .iter()
        .map(|part| {
            let (dir, mut name) = canonical(part);
            if stems.get(&(dir.clone(), name.clone())).copied().unwrap_or(0) > 1 {
                if let Some(file_name) = part.file_name() {
                    name = format!("{}.gcode", file_name.to_string_lossy());
                }
            }

            let key = (dir, name.clone());
            if let Some(other) = taken.get(&key) {
                return Err(other.clone());
            }
            taken.insert(key, part.clone());
            Ok(name)
        })
        .collect()
}

/// Search every part in turn, continuing past per-part failures
pub fn run_batch<E: SliceExecutor>(
    search: &mut RotationSearch<E>,
    parts: &[PathBuf],
    profile: &Path,
    output_dir: Option<&Path>,
) -> BatchSummary {
    let mut summary = BatchSummary::default();
    let names = plan_gcode_names(parts, output_dir);

    for (index, (part, name)) in parts.iter().zip(names).enumerate() {
        info!("[{}/{}] {}", index + 1, parts.len(), part.display());

        let name = match name {
            Ok(name) => name,
            Err(other) => {
                let reason = format!(
                    "gcode name collides with {}; slice it separately or use another output folder",
                    other.display()
                );
                warn!(part = %part.display(), "{}", reason);
                summary.failed.push(FailedPart {
                    part: part.clone(),
                    reason,
                });
                continue;
            }
        };

        match search.run_as(part, profile, output_dir, Some(&name)) {
            Ok(report) => summary.sliced.push(SlicedPart {
                part: part.clone(),
                gcode: report.accepted,
                orientation: report.winner.to_string(),
            }),
            Err(e) => {
                warn!(part = %part.display(), "{}", e);
                summary.failed.push(FailedPart {
                    part: part.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    summary
}
