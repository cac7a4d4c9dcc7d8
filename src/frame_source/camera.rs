use super::{FrameSource, fit_to};
use crate::core_modules::frame::Frame;
use crate::error::SourceError;
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
};
use tracing::{debug, info, warn};

const REQUESTED_FRAME_RATE: u32 = 30;

/// Live frames from a local capture device.
pub struct CameraSource {
    camera: Camera,
    width: u32,
    height: u32,
}

impl CameraSource {
    /// Opens device `index` at the format closest to `width x height` and starts
    /// streaming. Frames are resized only if the device cannot deliver that size.
    pub fn open(index: u32, width: u32, height: u32) -> Result<Self, SourceError> {
        let name = format!("camera {index}");
        let open_error = |reason: String| SourceError::Open {
            name: name.clone(),
            reason,
        };

        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(wanted_format(width, height)));
        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| open_error(e.to_string()))?;
        camera.open_stream().map_err(|e| open_error(e.to_string()))?;

        let native = camera.resolution();
        if (native.width(), native.height()) != (width, height) {
            warn!(
                native_width = native.width(),
                native_height = native.height(),
                "camera cannot deliver the requested resolution, frames will be resized"
            );
        }
        info!(
            device = index,
            native_width = native.width(),
            native_height = native.height(),
            width,
            height,
            "camera stream opened"
        );
        Ok(Self { camera, width, height })
    }
}

/// The capture format asked of the device: the configured size at a modest rate.
fn wanted_format(width: u32, height: u32) -> CameraFormat {
    CameraFormat::new(Resolution::new(width, height), FrameFormat::MJPEG, REQUESTED_FRAME_RATE)
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| SourceError::Capture(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| SourceError::Capture(e.to_string()))?;

        // nokhwa links its own `image` version; move the raw samples across.
        let (width, height) = (decoded.width(), decoded.height());
        let frame = Frame::from_raw(width, height, decoded.into_raw())
            .ok_or_else(|| SourceError::Capture("camera returned a truncated frame".into()))?;
        debug!(width, height, "captured frame");
        Ok(fit_to(frame, self.width, self.height))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            warn!("failed to stop camera stream: {}", e);
        }
    }
}
