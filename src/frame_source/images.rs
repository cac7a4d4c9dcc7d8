use super::{FrameSource, fit_to};
use crate::core_modules::frame::Frame;
use crate::error::SourceError;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Replays the image files of a directory, in file name order, as a video feed.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    next: usize,
    width: u32,
    height: u32,
    looping: bool,
}

impl ImageSequenceSource {
    /// Lists every file in `dir` whose extension names a known image format.
    /// Frames are resized to `width x height` when they differ.
    pub fn open(dir: &Path, width: u32, height: u32, looping: bool) -> Result<Self, SourceError> {
        let entries = std::fs::read_dir(dir).map_err(|source| SourceError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| SourceError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?
                .path();
            let is_image = path.is_file()
                && path
                    .extension()
                    .and_then(ImageFormat::from_extension)
                    .is_some();
            if is_image {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(SourceError::NoImages(dir.to_path_buf()));
        }
        paths.sort();

        info!(dir = %dir.display(), frames = paths.len(), looping, "opened image sequence");
        Ok(Self {
            paths,
            next: 0,
            width,
            height,
            looping,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        if self.next >= self.paths.len() {
            if !self.looping {
                return Err(SourceError::Exhausted);
            }
            self.next = 0;
        }
        let path = &self.paths[self.next];
        self.next += 1;

        let decoded = image::open(path).map_err(|source| SourceError::Decode {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "loaded frame");
        Ok(fit_to(decoded.to_rgb8(), self.width, self.height))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
