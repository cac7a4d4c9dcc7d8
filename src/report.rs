// THEORY:
// Reporting is the outer edge of the tracker. Two kinds of facts leave the core:
// periodic throughput and per-frame motion. Both are packed into a `Report` and
// handed to a `ReportSink` without waiting for an answer.
//
// Visualization is a separate concern. A `FrameObserver` sees every frame and
// the detector's analysis of it, may draw or save whatever it likes, and can
// only *advise* the loop to stop. It never feeds anything back into detection.

use crate::core_modules::contour::Point;
use crate::core_modules::frame::Frame;
use crate::core_modules::motion_detector::{Analysis, Motion, MotionEvent};
pub use crate::core_modules::throughput::ThroughputSample;
use image::{GrayImage, Rgb};
use imageproc::drawing::{draw_hollow_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use std::path::PathBuf;
use tracing::{info, warn};

/// A motion report, shaped for a downstream controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub total_contours: usize,
    pub centroid: Point,
    pub width: u32,
    pub height: u32,
    pub area: f64,
}

impl MotionSample {
    /// `None` when the event carries no motion.
    pub fn from_event(event: &MotionEvent) -> Option<Self> {
        event.motion.map(|motion| Self {
            total_contours: event.total_contours,
            centroid: motion.centroid,
            width: motion.region.width,
            height: motion.region.height,
            area: motion.area,
        })
    }
}

/// Everything the tracking loop tells the outside world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Report {
    Throughput(ThroughputSample),
    Motion(MotionSample),
}

/// Fire-and-forget consumer of reports.
pub trait ReportSink {
    fn report(&mut self, report: Report);
}

/// Writes reports to the log at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn report(&mut self, report: Report) {
        match report {
            Report::Throughput(sample) => {
                info!("Processing at {:.2} fps last {} frames", sample.fps, sample.frames);
            }
            Report::Motion(sample) => {
                info!(
                    "total_contours={:2}  Motion at cx={:3} cy={:3}   biggest_area:{:3}x{:3}={:5}",
                    sample.total_contours,
                    sample.centroid.x,
                    sample.centroid.y,
                    sample.width,
                    sample.height,
                    sample.area as u64
                );
            }
        }
    }
}

/// Drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl ReportSink for SilentSink {
    fn report(&mut self, _report: Report) {}
}

/// Forwards every report to a closure.
pub struct CallbackSink<F>(pub F);

impl<F: FnMut(Report)> ReportSink for CallbackSink<F> {
    fn report(&mut self, report: Report) {
        (self.0)(report)
    }
}

impl<R: ReportSink + ?Sized> ReportSink for Box<R> {
    fn report(&mut self, report: Report) {
        (**self).report(report)
    }
}

impl ReportSink for Vec<Report> {
    fn report(&mut self, report: Report) {
        self.push(report);
    }
}

/// An observer's advice to the tracking loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Observation {
    #[default]
    Continue,
    Quit,
}

/// Sees each frame after detection. `analysis` is `None` on the warm-up frame.
pub trait FrameObserver {
    fn observe(&mut self, frame_index: u64, frame: &Frame, analysis: Option<&Analysis>) -> Observation;
}

const MARKER: Rgb<u8> = Rgb([0, 255, 0]);
const CIRCLE_RADIUS: i32 = 10;

/// Saves an annotated copy of each frame with motion, plus its threshold mask,
/// as PNG files in a directory.
pub struct SnapshotWriter {
    dir: PathBuf,
    written: u64,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        info!(dir = %dir.display(), "writing motion snapshots");
        Ok(Self { dir, written: 0 })
    }

    /// Frames saved so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    fn save(&self, frame_index: u64, frame: &Frame, mask: &GrayImage, motion: &Motion) -> image::ImageResult<()> {
        let mut annotated = frame.clone();
        draw_annotation(&mut annotated, motion);
        annotated.save(self.dir.join(format!("frame-{frame_index:06}.png")))?;
        mask.save(self.dir.join(format!("mask-{frame_index:06}.png")))?;
        Ok(())
    }
}

impl FrameObserver for SnapshotWriter {
    fn observe(&mut self, frame_index: u64, frame: &Frame, analysis: Option<&Analysis>) -> Observation {
        let Some(analysis) = analysis else {
            return Observation::Continue;
        };
        let Some(motion) = analysis.event.motion.as_ref() else {
            return Observation::Continue;
        };
        match self.save(frame_index, frame, &analysis.mask, motion) {
            Ok(()) => self.written += 1,
            Err(e) => warn!(frame_index, "failed to write snapshot: {}", e),
        }
        Observation::Continue
    }
}

/// Outlines the motion region and circles its centroid.
pub fn draw_annotation(frame: &mut Frame, motion: &Motion) {
    let region = motion.region;
    draw_hollow_rect_mut(
        frame,
        Rect::at(region.x as i32, region.y as i32).of_size(region.width, region.height),
        MARKER,
    );
    draw_hollow_circle_mut(
        frame,
        (motion.centroid.x as i32, motion.centroid.y as i32),
        CIRCLE_RADIUS,
        MARKER,
    );
}
