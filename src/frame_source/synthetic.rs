use super::FrameSource;
use crate::core_modules::frame::Frame;
use crate::error::SourceError;
use image::Rgb;

const BACKGROUND: Rgb<u8> = Rgb([30, 60, 90]);
const TARGET: Rgb<u8> = Rgb([240, 240, 240]);
const VELOCITY: (i64, i64) = (3, 2);

/// A deterministic stand-in for a camera: a bright square bouncing across a
/// uniform background. Never runs out of frames.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    side: u32,
    position: (i64, i64),
    velocity: (i64, i64),
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            side: (width.min(height) / 8).max(1),
            position: (0, 0),
            velocity: VELOCITY,
        }
    }

    /// Where the square will be drawn on the next frame.
    pub fn target_position(&self) -> (u32, u32) {
        (self.position.0 as u32, self.position.1 as u32)
    }

    pub fn target_side(&self) -> u32 {
        self.side
    }

    fn advance(&mut self) {
        let (x, vx) = bounce(self.position.0, self.velocity.0, self.width.saturating_sub(self.side));
        let (y, vy) = bounce(self.position.1, self.velocity.1, self.height.saturating_sub(self.side));
        self.position = (x, y);
        self.velocity = (vx, vy);
    }
}

/// Moves `position` by `velocity` inside `0..=max`, reflecting off both ends.
fn bounce(position: i64, velocity: i64, max: u32) -> (i64, i64) {
    let max = max as i64;
    let next = position + velocity;
    if next < 0 {
        ((-next).min(max), -velocity)
    } else if next > max {
        ((2 * max - next).max(0), -velocity)
    } else {
        (next, velocity)
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        let (left, top) = self.target_position();
        let side = self.side;
        let frame = Frame::from_fn(self.width, self.height, |x, y| {
            let inside = (left..left + side).contains(&x) && (top..top + side).contains(&y);
            if inside { TARGET } else { BACKGROUND }
        });
        self.advance();
        Ok(frame)
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
