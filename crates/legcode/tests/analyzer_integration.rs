// Integration Tests for LeGcode
//
// These tests run the file-level entry points against gcode written to disk:
// - Profile recovery
// - Region volume integration
// - Support fraction and its degenerate cases

use legcode::{
    analyze_file, estimate_region_volume, extract_profile, filament_area_mm2,
    fraction_of_support, GCodeError, Region,
};
use std::f64::consts::PI;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_gcode(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write gcode");
    path
}

const PROFILE_FOOTER: &str = "; nozzle_diameter = 0.4\n; layer_height = 0.2\n";

#[test]
fn extract_profile_returns_exact_values() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_gcode(
        &dir,
        "profile.gcode",
        "\n; Generated by PrusaSlicer\n; nozzle_diameter = 0.4\n; layer_height = 0.2\n",
    );

    let profile = extract_profile(&path).expect("profile");
    assert_eq!(profile.nozzle_diameter_mm, 0.4);
    assert_eq!(profile.layer_height_mm, 0.2);
}

#[test]
fn extract_profile_without_layer_height_fails() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_gcode(&dir, "partial.gcode", "; nozzle_diameter = 0.4\nG1 X1 E1\n");

    let err = extract_profile(&path).expect_err("must fail");
    assert!(matches!(err, GCodeError::ProfileIncomplete { .. }));
}

#[test]
fn non_support_only_volume_is_cylinder_of_total_length() {
    let dir = TempDir::new().expect("tempdir");
    // Total extruded length L = 7.5 mm
    let content = format!(
        ";TYPE:Perimeter\nG1 X1 Y0 E2.5\nG1 X2 Y0 E5.0\n;TYPE:Internal infill\nG1 X3 Y0 E7.5\n{PROFILE_FOOTER}"
    );
    let path = write_gcode(&dir, "plain.gcode", &content);

    let non_support = estimate_region_volume(&path, 0.4, Region::NonSupport).expect("volume");
    let support = estimate_region_volume(&path, 0.4, Region::Support).expect("volume");

    let expected = PI * (0.4_f64 / 2.0).powi(2) * 7.5;
    assert!((non_support - expected).abs() < 1e-9);
    assert_eq!(support, 0.0);
}

#[test]
fn fraction_of_support_splits_by_region() {
    let dir = TempDir::new().expect("tempdir");
    let content = format!(
        "M82\n;TYPE:Perimeter\nG1 X1 E3.0\n;TYPE:Support material\nG1 X2 E4.0\n;TYPE:Support material interface\nG1 X3 E5.0\n;TYPE:Top solid infill\nG1 X4 E8.0\n{PROFILE_FOOTER}"
    );
    let path = write_gcode(&dir, "mixed.gcode", &content);

    let fraction = fraction_of_support(&path).expect("fraction");
    assert!((fraction - 2.0 / 8.0).abs() < 1e-9);

    let analysis = analyze_file(&path).expect("analysis");
    let area = filament_area_mm2(0.4);
    assert!((analysis.volumes.support_volume_mm3 - area * 2.0).abs() < 1e-9);
    assert!((analysis.volumes.non_support_volume_mm3 - area * 6.0).abs() < 1e-9);
}

#[test]
fn zero_extrusion_is_zero_volume_error_not_nan() {
    let dir = TempDir::new().expect("tempdir");
    let content = format!("G28\nG0 X10 Y10\n{PROFILE_FOOTER}");
    let path = write_gcode(&dir, "empty.gcode", &content);

    match fraction_of_support(&path) {
        Err(GCodeError::ZeroVolume) => {}
        other => panic!("expected ZeroVolume, got {other:?}"),
    }
}

#[test]
fn repeated_analysis_is_identical() {
    let dir = TempDir::new().expect("tempdir");
    let content = format!(
        ";TYPE:Support material\nG1 X1 E1.25\n;TYPE:Perimeter\nG1 X2 E3.5\n{PROFILE_FOOTER}"
    );
    let path = write_gcode(&dir, "stable.gcode", &content);

    let first = analyze_file(&path).expect("first");
    let second = analyze_file(&path).expect("second");
    assert_eq!(first, second);
    assert_eq!(
        extract_profile(&path).expect("profile"),
        extract_profile(&path).expect("profile again")
    );
}

#[test]
fn relative_extrusion_fails_clearly() {
    let dir = TempDir::new().expect("tempdir");
    let content = format!("M83\nG1 X1 E0.4\nG1 X2 E0.4\n{PROFILE_FOOTER}");
    let path = write_gcode(&dir, "relative.gcode", &content);

    let err = fraction_of_support(&path).expect_err("must fail");
    assert!(matches!(err, GCodeError::RelativeExtrusion { line: 2 }));
}
