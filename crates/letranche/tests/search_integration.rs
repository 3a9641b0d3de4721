//! End-to-end rotation search against a scripted stand-in for the slicer.
//!
//! The stand-in is a POSIX shell script launched as `sh <script> <slicer args>`
//! through `prefix_args`, so it sees exactly the flags the real slicer would.

#![cfg(unix)]

use letranche::{
    RotationSearch, SearchError, SliceExecutor, SliceOutcome, SliceRequest, SlicerConfig,
    SlicerSession, SEARCH_ORDER,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SCRIPT: &str = r#"
tag=""
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    --rotate-x) tag="x$2"; shift ;;
    --rotate-y) tag="y$2"; shift ;;
    --output) out="$2"; shift ;;
  esac
  shift
done
echo "$tag" >> '@LOG@'
@BEFORE@
cat > "$out" <<'GCODE'
M82
G92 E0
;TYPE:Perimeter
G1 X1 Y1 E3
;TYPE:Support material
G1 X2 Y2 E4
; nozzle_diameter = 0.4
; layer_height = 0.2
GCODE
if [ "$tag" != "@CLEAN@" ]; then
  echo "Detected print stability issues:"
  echo "Low bed adhesion"
fi
echo "Slicing result exported to $out"
"#;

struct Workspace {
    dir: TempDir,
    part: PathBuf,
    profile: PathBuf,
    log: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let part = dir.path().join("part.stl");
        let profile = dir.path().join("default.ini");
        let log = dir.path().join("invocations.log");
        fs::write(&part, "solid part\nendsolid part\n").expect("write part");
        fs::write(&profile, "nozzle_diameter = 0.4\n").expect("write profile");
        Self {
            dir,
            part,
            profile,
            log,
        }
    }

    /// Session running the stand-in, clean only for `clean_tag`.
    fn session(&self, clean_tag: &str, before: &str, timeout_secs: u64) -> SlicerSession {
        let script = self.dir.path().join("fake-slicer.sh");
        let body = SCRIPT
            .replace("@LOG@", &self.log.to_string_lossy())
            .replace("@CLEAN@", clean_tag)
            .replace("@BEFORE@", before);
        fs::write(&script, body).expect("write script");

        SlicerSession::new(SlicerConfig {
            binary: PathBuf::from("sh"),
            prefix_args: vec![script.to_string_lossy().into_owned()],
            timeout_secs,
            ..SlicerConfig::default()
        })
        .expect("session")
    }

    fn invocations(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn gcode_files(&self, dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .expect("read dir")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".gcode"))
            .collect();
        names.sort();
        names
    }
}

#[test]
fn clean_at_y270_leaves_one_canonical_artifact() {
    let ws = Workspace::new();
    let session = ws.session("y270", "", 30);
    let out = ws.dir.path().join("gcode");
    let mut search = RotationSearch::new(&session);

    let report = search
        .run(&ws.part, &ws.profile, Some(&out))
        .expect("search succeeds");

    assert_eq!(report.accepted, out.join("part.gcode"));
    assert_eq!(ws.invocations(), vec!["y0", "y90", "y180", "y270"]);
    assert_eq!(report.cleanup.removed.len(), 3);
    assert_eq!(ws.gcode_files(&out), vec!["part.gcode"]);

    let warned = &report.attempts[..3];
    assert!(warned.iter().all(|a| a.outcome == SliceOutcome::Warned));
    assert!(warned
        .iter()
        .all(|a| a.diagnostic.as_deref() == Some("Low bed adhesion")));
    for attempt in warned {
        let fraction = attempt.support_fraction.expect("support estimate");
        assert!((fraction - 0.25).abs() < 1e-9);
    }
    assert_eq!(report.attempts[3].outcome, SliceOutcome::Clean);
}

#[test]
fn no_clean_orientation_exhausts_the_search() {
    let ws = Workspace::new();
    let session = ws.session("never", "", 30);
    let mut search = RotationSearch::new(&session);

    let err = search
        .run(&ws.part, &ws.profile, None)
        .expect_err("search must fail");

    assert!(matches!(err, SearchError::ExhaustedSearch { .. }));
    let expected: Vec<String> = SEARCH_ORDER.iter().map(|o| o.tag()).collect();
    assert_eq!(ws.invocations(), expected);
    assert!(ws.gcode_files(ws.dir.path()).is_empty());
}

#[test]
fn non_zero_exit_is_failed_and_search_moves_on() {
    let ws = Workspace::new();
    let session = ws.session("y90", "[ \"$tag\" = \"y0\" ] && exit 2", 30);
    let mut search = RotationSearch::new(&session);

    let report = search.run(&ws.part, &ws.profile, None).expect("search succeeds");

    assert_eq!(report.attempts[0].outcome, SliceOutcome::Failed);
    assert_eq!(
        report.attempts[0].diagnostic.as_deref(),
        Some("slicer exited with status 2")
    );
    assert_eq!(report.accepted, ws.dir.path().join("part.gcode"));
}

#[test]
fn hung_slicer_is_killed_and_classified_failed() {
    let ws = Workspace::new();
    let session = ws.session("y0", "sleep 30", 1);
    let request = SliceRequest {
        part: ws.part.clone(),
        profile: ws.profile.clone(),
        output_dir: ws.dir.path().to_path_buf(),
        orientation: SEARCH_ORDER[0],
    };

    let started = std::time::Instant::now();
    let result = session.slice(&request);

    assert_eq!(result.outcome, SliceOutcome::Failed);
    assert!(result
        .diagnostic
        .as_deref()
        .unwrap_or_default()
        .contains("did not finish"));
    assert!(started.elapsed() < std::time::Duration::from_secs(20));
}

#[test]
fn report_serializes_to_json() {
    let ws = Workspace::new();
    let session = ws.session("y0", "", 30);
    let mut search = RotationSearch::new(&session);

    let report = search.run(&ws.part, &ws.profile, None).expect("search succeeds");
    let json = serde_json::to_value(&report).expect("json");

    assert_eq!(json["winner"]["axis"], "Y");
    assert_eq!(json["attempts"][0]["outcome"], "Clean");
    assert!(json["accepted"]
        .as_str()
        .unwrap_or_default()
        .ends_with("part.gcode"));
}
