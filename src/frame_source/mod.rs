// THEORY:
// A `FrameSource` is the leaf of the system: something that hands out color
// frames of a fixed resolution, one per request, blocking until the next one is
// ready. The tracker knows nothing else about where frames come from.
//
// Key architectural principles:
// 1.  **Fixed Resolution**: A source commits to `resolution()` for its whole
//     lifetime. Adapters that read differently sized material resize it.
// 2.  **Blocking Pull**: `next_frame` is the only suspension point of the
//     tracking loop. Sources never push.
// 3.  **Composable Orientation**: Flipping is a wrapper (`Oriented`) around any
//     source rather than a flag each adapter has to honor.
// 4.  **Fatal Failures**: A capture error ends the loop. `Exhausted` marks the
//     clean end of a finite source.

mod images;
mod synthetic;

#[cfg(feature = "camera")]
mod camera;

pub use images::ImageSequenceSource;
pub use synthetic::SyntheticSource;

#[cfg(feature = "camera")]
pub use camera::CameraSource;

use crate::core_modules::frame::Frame;
use crate::error::SourceError;
use image::imageops::{self, FilterType};

pub trait FrameSource {
    /// Blocks until the next frame is available.
    fn next_frame(&mut self) -> Result<Frame, SourceError>;

    /// `(width, height)` of every frame this source yields.
    fn resolution(&self) -> (u32, u32);
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        (**self).next_frame()
    }

    fn resolution(&self) -> (u32, u32) {
        (**self).resolution()
    }
}

/// Mirrors the frames of another source horizontally and/or vertically.
pub struct Oriented<S> {
    inner: S,
    hflip: bool,
    vflip: bool,
}

impl<S: FrameSource> Oriented<S> {
    pub fn new(inner: S, hflip: bool, vflip: bool) -> Self {
        Self { inner, hflip, vflip }
    }
}

impl<S: FrameSource> FrameSource for Oriented<S> {
    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        let mut frame = self.inner.next_frame()?;
        if self.hflip {
            imageops::flip_horizontal_in_place(&mut frame);
        }
        if self.vflip {
            imageops::flip_vertical_in_place(&mut frame);
        }
        Ok(frame)
    }

    fn resolution(&self) -> (u32, u32) {
        self.inner.resolution()
    }
}

/// Resizes `frame` to `(width, height)` unless it already has that size.
pub(crate) fn fit_to(frame: Frame, width: u32, height: u32) -> Frame {
    if frame.dimensions() == (width, height) {
        frame
    } else {
        imageops::resize(&frame, width, height, FilterType::Triangle)
    }
}
