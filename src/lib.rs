// THEORY:
// This file is the main entry point for the `motion_track` library crate. It
// exposes the motion locator as a small set of layers that an embedding
// application (a pan/tilt rig, a robot controller) can wire together itself, or
// run as-is through the bundled binary.
//
// Layers, from the leaf up:
// - `frame_source`: where frames come from (camera, image files, synthetic).
// - `core_modules`: the per-frame motion detector and its raster/contour helpers.
// - `report`: where results go (log, callback, snapshots).
// - `pipeline`: the tracking loop tying them together.
// - `config` / `cli` / `error`: tunables, command line, and error types.

pub mod cli;
pub mod config;
pub mod core_modules;
pub mod error;
pub mod frame_source;
pub mod pipeline;
pub mod report;

pub use config::{CaptureConfig, DetectorConfig, OutputConfig, Settings};
pub use core_modules::contour::{Point, Region};
pub use core_modules::frame::{Frame, IntensityFrame};
pub use core_modules::motion_detector::{Motion, MotionDetector, MotionEvent};
pub use error::{ConfigError, DetectorError, SourceError, TrackError};
pub use frame_source::FrameSource;
pub use pipeline::{RunSummary, StopReason, TrackingLoop};
pub use report::{Report, ReportSink};
