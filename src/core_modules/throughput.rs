// THEORY:
// Throughput is measured over fixed windows of frames rather than per frame. A
// single frame's duration is dominated by camera jitter; ten frames give a stable
// figure while still reacting within a fraction of a second.
//
// The meter never reads the clock itself. Callers pass the instant at which a
// frame finished, which keeps the arithmetic testable.

use std::time::Instant;

/// Frames per throughput window.
pub const FPS_WINDOW: u32 = 10;

/// One throughput measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroughputSample {
    /// Frames in the window the sample covers.
    pub frames: u32,
    /// `frames / seconds elapsed since the window opened`. Infinite if no time
    /// passed at all.
    pub fps: f64,
}

#[derive(Debug, Clone)]
pub struct ThroughputMeter {
    window: u32,
    frames: u32,
    window_start: Instant,
}

impl ThroughputMeter {
    pub fn new(window: u32, now: Instant) -> Self {
        Self {
            window: window.max(1),
            frames: 0,
            window_start: now,
        }
    }

    /// Counts one processed frame. Every `window` frames returns a sample and
    /// opens a new window at `now`.
    pub fn record(&mut self, now: Instant) -> Option<ThroughputSample> {
        self.frames += 1;
        if self.frames < self.window {
            return None;
        }

        let elapsed = now.saturating_duration_since(self.window_start).as_secs_f64();
        let fps = if elapsed > 0.0 {
            self.frames as f64 / elapsed
        } else {
            f64::INFINITY
        };
        let sample = ThroughputSample {
            frames: self.frames,
            fps,
        };
        self.frames = 0;
        self.window_start = now;
        Some(sample)
    }

    /// Frames counted in the currently open window.
    pub fn pending(&self) -> u32 {
        self.frames
    }
}
