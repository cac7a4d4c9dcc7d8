// THEORY:
// The error taxonomy of the tracker is narrow. Each layer owns one
// error enum, and the orchestration layer folds the two fatal ones together:
// 1.  `DetectorError`: the frame handed to the detector cannot be differenced
//     against the retained one. Raised before any state is touched.
// 2.  `SourceError`: the frame source could not open or could not deliver.
//     `Exhausted` is the one benign variant, used by finite sources.
// 3.  `ConfigError`: the settings file or a tunable is unusable.
// 4.  `TrackError`: what the tracking loop returns when it stops on a failure.
//
// Nothing in the library retries. The embedding application decides whether to
// restart a detector or abort.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of a single `MotionDetector::process` call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DetectorError {
    #[error("frame has no pixels ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },
    #[error(
        "frame is {}x{} but this detector was primed with {}x{} frames",
        .actual.0, .actual.1, .expected.0, .expected.1
    )]
    InvalidFrame {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// Failures of a `FrameSource`.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open frame source {name:?}: {reason}")]
    Open { name: String, reason: String },
    #[error("failed to capture frame: {0}")]
    Capture(String),
    #[error("failed to decode image {path:?}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no image files found in {0:?}")]
    NoImages(PathBuf),
    #[error("frame source has no more frames")]
    Exhausted,
}

/// Failures while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Why the tracking loop stopped on a failure.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Detector(#[from] DetectorError),
}
