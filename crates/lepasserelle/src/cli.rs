// CLI Interface
//
// This module provides the command-line interface for AutoSlice.

use crate::batch::{discover_parts, run_batch};
use anyhow::{anyhow, bail, Context, Result as AnyhowResult};
use clap::{Parser, Subcommand};
use legcode::{analyze_file, GCodeAnalysis};
use letranche::{format_error, RotationSearch, SliceAttemptResult, SlicerConfig, SlicerSession};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// AutoSlice - Find an orientation that slices without stability warnings
#[derive(Parser, Debug)]
#[command(name = "autoslice")]
#[command(author = "AutoSlice Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Slice parts in the first orientation that needs no support", long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(global = true, long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Slice one part, trying rotations until the slicer reports no stability issues
    Slice {
        /// Part to slice
        #[arg(value_name = "PART")]
        part: PathBuf,

        /// Slicer profile (.ini)
        #[arg(long = "profile", value_name = "INI")]
        profile: PathBuf,

        /// Output folder (defaults to the part's folder)
        #[arg(long = "output", short = 'o', value_name = "DIR")]
        output: Option<PathBuf>,

        /// Slicer settings file (TOML)
        #[arg(long = "config", short = 'c', value_name = "TOML")]
        config: Option<PathBuf>,

        /// Print the search report as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// Slice every part in a folder
    Batch {
        /// Folder containing .stl/.3mf/.obj parts
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Slicer profile (.ini)
        #[arg(long = "profile", value_name = "INI")]
        profile: PathBuf,

        /// Output folder (defaults to each part's folder)
        #[arg(long = "output", short = 'o', value_name = "DIR")]
        output: Option<PathBuf>,

        /// Slicer settings file (TOML)
        #[arg(long = "config", short = 'c', value_name = "TOML")]
        config: Option<PathBuf>,

        /// Descend into sub-folders
        #[arg(long = "recursive", short = 'r')]
        recursive: bool,
    },

    /// Report profile, volumes and support fraction of an existing gcode file
    Analyze {
        /// Gcode file
        #[arg(value_name = "GCODE")]
        gcode: PathBuf,

        /// Print the analysis as JSON
        #[arg(long = "json")]
        json: bool,
    },
}

impl Cli {
    /// Run the CLI
    pub fn run(self) -> AnyhowResult<()> {
        init_logging(self.verbose);

        match self.command {
            Commands::Slice {
                part,
                profile,
                output,
                config,
                json,
            } => cmd_slice(&part, &profile, output, config.as_deref(), json),
            Commands::Batch {
                dir,
                profile,
                output,
                config,
                recursive,
            } => cmd_batch(&dir, &profile, output, config.as_deref(), recursive),
            Commands::Analyze { gcode, json } => cmd_analyze(&gcode, json),
        }
    }
}

/// Initialize logging
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects DEBUG over INFO.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    // Fails only if a subscriber is already installed; that one stays in effect.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Slicer settings from an optional TOML file, with environment overrides on top
pub fn resolve_config(path: Option<&Path>) -> AnyhowResult<SlicerConfig> {
    let config = match path {
        Some(path) => SlicerConfig::load(path)
            .with_context(|| format!("Failed to load slicer settings from {}", path.display()))?
            .with_env_overrides(),
        None => SlicerConfig::from_env(),
    };

    config.validate().context("Invalid slicer settings")?;
    Ok(config)
}

/// Output folder: command line, then settings, then the part's folder
fn output_dir(cli: Option<PathBuf>, config: &SlicerConfig) -> Option<PathBuf> {
    cli.or_else(|| config.output_dir.clone())
}

/// Slice command implementation
fn cmd_slice(
    part: &Path,
    profile: &Path,
    output: Option<PathBuf>,
    config: Option<&Path>,
    json: bool,
) -> AnyhowResult<()> {
    let config = resolve_config(config)?;
    let output = output_dir(output, &config);
    let session = SlicerSession::new(config).context("Failed to start slicer session")?;
    let mut search = RotationSearch::new(&session);

    info!("Slicing {}", part.display());

    let report = match search.run(part, profile, output.as_deref()) {
        Ok(report) => report,
        Err(e) => {
            if let Some(attempts) = e.attempts() {
                print_attempts(attempts);
            }
            return Err(anyhow!(format_error(&e)));
        }
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
        return Ok(());
    }

    print_attempts(&report.attempts);
    println!("\n✓ Sliced {} at {}", part.display(), report.winner);
    println!("  GCode: {}", report.accepted.display());
    if !report.cleanup.is_complete() {
        println!(
            "  Left behind: {} rejected artifact(s) could not be removed",
            report.cleanup.failed.len()
        );
    }

    Ok(())
}

/// Batch command implementation
fn cmd_batch(
    dir: &Path,
    profile: &Path,
    output: Option<PathBuf>,
    config: Option<&Path>,
    recursive: bool,
) -> AnyhowResult<()> {
    if !dir.is_dir() {
        bail!("Not a folder: {}", dir.display());
    }

    let config = resolve_config(config)?;
    let output = output_dir(output, &config);
    let session = SlicerSession::new(config).context("Failed to start slicer session")?;
    let mut search = RotationSearch::new(&session);

    let parts = discover_parts(dir, recursive);
    if parts.is_empty() {
        println!("No parts found in {}", dir.display());
        return Ok(());
    }

    info!("Found {} part(s) in {}", parts.len(), dir.display());
    let summary = run_batch(&mut search, &parts, profile, output.as_deref());

    println!("\nBatch Summary\n");
    for sliced in &summary.sliced {
        println!(
            "  ✓ {} ({}) -> {}",
            sliced.part.display(),
            sliced.orientation,
            sliced.gcode.display()
        );
    }
    for failed in &summary.failed {
        println!("  ✗ {}: {}", failed.part.display(), failed.reason);
    }
    println!(
        "\n{} sliced, {} failed",
        summary.sliced.len(),
        summary.failed.len()
    );

    if !summary.all_succeeded() {
        bail!("{} of {} part(s) failed", summary.failed.len(), summary.total());
    }
    Ok(())
}

#[derive(Serialize)]
struct AnalyzeOutput<'a> {
    gcode: &'a Path,
    #[serde(flatten)]
    analysis: GCodeAnalysis,
    support_fraction: Option<f64>,
}

/// Analyze command implementation
fn cmd_analyze(gcode: &Path, json: bool) -> AnyhowResult<()> {
    let analysis = analyze_file(gcode)
        .with_context(|| format!("Failed to analyze {}", gcode.display()))?;
    let support_fraction = analysis.support_fraction().ok();

    if json {
        let output = AnalyzeOutput {
            gcode,
            analysis,
            support_fraction,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialize analysis")?
        );
        return Ok(());
    }

    println!("\nGCode Analysis: {}\n", gcode.display());
    println!("  Nozzle diameter: {} mm", analysis.profile.nozzle_diameter_mm);
    println!("  Layer height: {} mm", analysis.profile.layer_height_mm);
    println!("  Support volume: {:.2} mm³", analysis.volumes.support_volume_mm3);
    println!(
        "  Non-support volume: {:.2} mm³",
        analysis.volumes.non_support_volume_mm3
    );
    println!("  Retractions: {}", analysis.retractions);
    match support_fraction {
        Some(fraction) => println!("  Support fraction: {:.1}%", fraction * 100.0),
        None => println!("  Support fraction: n/a (nothing extruded)"),
    }

    Ok(())
}

/// Print one line per attempt
fn print_attempts(attempts: &[SliceAttemptResult]) {
    println!("\nAttempts:");
    for attempt in attempts {
        let mut line = format!("  {:<8} {:?}", attempt.orientation.to_string(), attempt.outcome);
        if let Some(diagnostic) = &attempt.diagnostic {
            line.push_str(&format!(" - {}", diagnostic));
        }
        if let Some(fraction) = attempt.support_fraction {
            line.push_str(&format!(" (support {:.1}%)", fraction * 100.0));
        }
        println!("{}", line);
    }
}
