// Slicer Configuration
//
// *La Configuration* (The Configuration) - How to launch the external slicer

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default slicer executable
pub const DEFAULT_SLICER_BINARY: &str = "prusa-slicer-console";

/// Default per-attempt timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Settings for launching the external slicer
///
/// Loaded from TOML; every field is optional in the file:
///
/// ```toml
/// binary = "flatpak"
/// prefix_args = ["run", "com.prusa3d.PrusaSlicer"]
/// extra_args = ["--center", "125,105"]
/// timeout_secs = 300
/// output_dir = "gcode"
/// analyze_warnings = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicerConfig {
    /// Slicer executable (name on `PATH` or absolute path)
    pub binary: PathBuf,

    /// Arguments placed before any slicer flag (launcher wrappers such as flatpak)
    pub prefix_args: Vec<String>,

    /// Additional slicer flags inserted before `--slice`
    pub extra_args: Vec<String>,

    /// Wall-clock limit for a single slicer run
    pub timeout_secs: u64,

    /// Output folder; defaults to the part's own folder
    pub output_dir: Option<PathBuf>,

    /// Estimate support fraction for warned attempts
    pub analyze_warnings: bool,
}

impl Default for SlicerConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_SLICER_BINARY),
            prefix_args: Vec::new(),
            extra_args: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            output_dir: None,
            analyze_warnings: true,
        }
    }
}

impl SlicerConfig {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the settings file
    ///
    /// # Returns
    ///
    /// `Result<SlicerConfig, ConfigError>` - Parsed and validated configuration
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SlicerConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied
    ///
    /// Environment variables:
    /// - `AUTOSLICE_SLICER` - Slicer executable
    /// - `AUTOSLICE_TIMEOUT_SECS` - Per-attempt timeout
    /// - `AUTOSLICE_OUTPUT_DIR` - Output folder
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of this configuration
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(binary) = std::env::var("AUTOSLICE_SLICER") {
            if !binary.is_empty() {
                self.binary = PathBuf::from(binary);
            }
        }

        if let Ok(timeout) = std::env::var("AUTOSLICE_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse::<u64>() {
                self.timeout_secs = secs;
            }
        }

        if let Ok(dir) = std::env::var("AUTOSLICE_OUTPUT_DIR") {
            if !dir.is_empty() {
                self.output_dir = Some(PathBuf::from(dir));
            }
        }

        self
    }

    /// Timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.binary.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("slicer binary cannot be empty".to_string()));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Input/Output error while reading the settings file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid TOML for this schema
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configuration contains invalid values
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SlicerConfig::default();
        assert_eq!(config.binary, PathBuf::from(DEFAULT_SLICER_BINARY));
        assert_eq!(config.timeout(), Duration::from_secs(600));
        assert!(config.analyze_warnings);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("autoslice.toml");
        fs::write(
            &path,
            "binary = \"flatpak\"\nprefix_args = [\"run\", \"com.prusa3d.PrusaSlicer\"]\ntimeout_secs = 30\n",
        )
        .expect("write");

        let config = SlicerConfig::load(&path).expect("load");
        assert_eq!(config.binary, PathBuf::from("flatpak"));
        assert_eq!(config.prefix_args.len(), 2);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.extra_args.is_empty());
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = SlicerConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_empty_binary_rejected() {
        let config = SlicerConfig {
            binary: PathBuf::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("bad.toml");
        fs::write(&path, "timeout_secs = \"soon\"\n").expect("write");

        assert!(matches!(
            SlicerConfig::load(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            SlicerConfig::load("/no/such/autoslice.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = SlicerConfig {
            extra_args: vec!["--center".to_string(), "125,105".to_string()],
            ..Default::default()
        };
        let toml_string = toml::to_string(&config).expect("serialize");
        let deserialized: SlicerConfig = toml::from_str(&toml_string).expect("deserialize");
        assert_eq!(deserialized, config);
    }
}
