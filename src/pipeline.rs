// THEORY:
// The `pipeline` module is the top-level API of the tracker. It wires the three
// layers together (frame source -> motion detector -> report sink) and runs them
// one frame at a time, strictly in sequence.
//
// Key architectural principles:
// 1.  **Single Thread of Control**: A frame is fully detected and reported before
//     the next one is requested. Pulling from the source is the only place the
//     loop blocks.
// 2.  **Cooperative Cancellation**: The loop checks a shared flag between frames.
//     Stopping abandons the detector state as-is; there is never a half-processed
//     frame to clean up.
// 3.  **Fail Once, Stop**: Source and detector failures end the run and are
//     returned to the caller untouched. No retry, no partial report.
// 4.  **Observers Advise**: The optional frame observer can ask the loop to stop
//     but cannot influence detection.

use crate::core_modules::contour::{BorderFollowing, ContourExtractor};
use crate::core_modules::frame::Frame;
use crate::core_modules::motion_detector::{MotionDetector, MotionEvent};
use crate::core_modules::throughput::{FPS_WINDOW, ThroughputMeter};
use crate::error::{SourceError, TrackError};
use crate::frame_source::FrameSource;
use crate::report::{FrameObserver, MotionSample, Observation, Report, ReportSink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info};

// Re-export key data structures for the public API.
pub use crate::core_modules::motion_detector::{Analysis, Motion};

/// Why `TrackingLoop::run` returned without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The cancel flag was raised.
    Cancelled,
    /// The configured frame limit was reached.
    FrameLimit,
    /// A finite frame source ran out.
    SourceExhausted,
    /// The frame observer asked to quit.
    ObserverQuit,
}

/// Totals of one `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub motion_events: u64,
    pub stop: StopReason,
}

/// Result of a single `step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// `None` on the warm-up frame.
    pub event: Option<MotionEvent>,
    pub observation: Observation,
}

/// Drives a frame source through a motion detector into a report sink.
pub struct TrackingLoop<S, R, E = BorderFollowing> {
    source: S,
    detector: MotionDetector<E>,
    sink: R,
    observer: Option<Box<dyn FrameObserver>>,
    meter: ThroughputMeter,
    max_frames: Option<u64>,
    frames: u64,
    motion_events: u64,
}

impl<S: FrameSource, R: ReportSink, E: ContourExtractor> TrackingLoop<S, R, E> {
    pub fn new(source: S, detector: MotionDetector<E>, sink: R) -> Self {
        Self {
            source,
            detector,
            sink,
            observer: None,
            meter: ThroughputMeter::new(FPS_WINDOW, Instant::now()),
            max_frames: None,
            frames: 0,
            motion_events: 0,
        }
    }

    /// Attaches a visualization/debug observer.
    pub fn with_observer(mut self, observer: Box<dyn FrameObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Stops `run` after this many frames. `None` runs until cancelled.
    pub fn with_max_frames(mut self, max_frames: Option<u64>) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn detector(&self) -> &MotionDetector<E> {
        &self.detector
    }

    pub fn sink(&self) -> &R {
        &self.sink
    }

    pub fn into_sink(self) -> R {
        self.sink
    }

    /// Frames pulled from the source so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Pulls, detects and reports exactly one frame.
    pub fn step(&mut self) -> Result<Step, TrackError> {
        let frame: Frame = self.source.next_frame()?;
        let analysis = self.detector.analyze(&frame)?;
        let frame_index = self.frames;
        self.frames += 1;

        if let Some(sample) = self.meter.record(Instant::now()) {
            self.sink.report(Report::Throughput(sample));
        }

        let event = analysis.as_ref().map(|a| a.event);
        if let Some(sample) = event.as_ref().and_then(MotionSample::from_event) {
            self.motion_events += 1;
            self.sink.report(Report::Motion(sample));
        }

        let observation = match self.observer.as_mut() {
            Some(observer) => observer.observe(frame_index, &frame, analysis.as_ref()),
            None => Observation::Continue,
        };

        Ok(Step { event, observation })
    }

    /// Runs until `cancel` is raised, the frame limit is hit, a finite source
    /// runs out, or the observer asks to quit. Any other failure is returned.
    pub fn run(&mut self, cancel: &AtomicBool) -> Result<RunSummary, TrackError> {
        self.meter = ThroughputMeter::new(FPS_WINDOW, Instant::now());
        let (width, height) = self.source.resolution();
        info!(width, height, "motion tracking started");

        let stop = loop {
            if cancel.load(Ordering::Relaxed) {
                break StopReason::Cancelled;
            }
            if self.max_frames.is_some_and(|limit| self.frames >= limit) {
                break StopReason::FrameLimit;
            }
            match self.step() {
                Ok(step) if step.observation == Observation::Quit => break StopReason::ObserverQuit,
                Ok(_) => {}
                Err(TrackError::Source(SourceError::Exhausted)) => break StopReason::SourceExhausted,
                Err(e) => return Err(e),
            }
        };

        debug!(?stop, "tracking loop finished");
        info!(
            frames = self.frames,
            motion_events = self.motion_events,
            "motion tracking stopped"
        );
        Ok(RunSummary {
            frames: self.frames,
            motion_events: self.motion_events,
            stop,
        })
    }
}
