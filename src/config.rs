// THEORY:
// Every tunable of the tracker lives in one immutable `Settings` value built once
// at startup. The detector never reads globals; it receives its `DetectorConfig`
// by value at construction and keeps it for its whole lifetime.
//
// Settings come from three layers, later layers winning:
// 1.  Built-in defaults (`Default` impls below).
// 2.  An optional TOML file. Every table and key is optional.
// 3.  Command line flags (applied in `cli.rs`).

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_WIDTH: u32 = 320;
pub const DEFAULT_HEIGHT: u32 = 240;
pub const DEFAULT_SENSITIVITY: u8 = 25;
pub const DEFAULT_BLUR_SIZE: u32 = 10;
pub const DEFAULT_MIN_AREA: f64 = 25.0;
/// Largest box-blur window accepted. The blur costs `blur_size` taps per pixel.
pub const MAX_BLUR_SIZE: u32 = 1024;

/// Tunables of the motion detection algorithm.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// Binarization cutoff. A smoothed difference pixel counts as motion only
    /// when strictly greater than this value.
    pub sensitivity: u8,
    /// Side of the square box-blur window applied to the difference raster.
    pub blur_size: u32,
    /// Contours with an area at or below this value (px²) are never motion.
    pub min_area: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            blur_size: DEFAULT_BLUR_SIZE,
            min_area: DEFAULT_MIN_AREA,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_BLUR_SIZE).contains(&self.blur_size) {
            return Err(ConfigError::Invalid(format!(
                "detector.blur_size must be between 1 and {MAX_BLUR_SIZE}, got {}",
                self.blur_size
            )));
        }
        if !self.min_area.is_finite() || self.min_area < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "detector.min_area must be a non-negative number, got {}",
                self.min_area
            )));
        }
        Ok(())
    }
}

/// Resolution and orientation requested from the frame source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
    pub hflip: bool,
    pub vflip: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            hflip: false,
            vflip: false,
        }
    }
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "capture resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Reporting and visualization switches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Periodic throughput and per-motion text reports.
    pub debug: bool,
    /// Annotated snapshot output.
    pub visualize: bool,
    pub snapshot_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            debug: true,
            visualize: false,
            snapshot_dir: PathBuf::from("snapshots"),
        }
    }
}

/// The complete, validated configuration of one tracker process.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub capture: CaptureConfig,
    pub detector: DetectorConfig,
    pub output: OutputConfig,
}

impl Settings {
    /// Reads settings from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        self.detector.validate()
    }
}
