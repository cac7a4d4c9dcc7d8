use anyhow::{Context, Result};
use motion_track::cli::{Args, SourceKind};
use motion_track::config::{CaptureConfig, Settings};
use motion_track::core_modules::motion_detector::MotionDetector;
use motion_track::frame_source::{FrameSource, ImageSequenceSource, Oriented, SyntheticSource};
use motion_track::pipeline::{RunSummary, TrackingLoop};
use motion_track::report::{LogSink, ReportSink, SilentSink, SnapshotWriter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();
    args.setup_logging().context("Failed to set tracing subscriber")?;

    info!("Starting motion tracker");

    if let Err(e) = run_application(args).await {
        error!("Application error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run_application(args: Args) -> Result<()> {
    let settings = args.settings().context("Invalid configuration")?;

    let cancel = Arc::new(AtomicBool::new(false));
    let interrupt = {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping after the current frame");
                cancel.store(true, Ordering::Relaxed);
            }
        })
    };

    // Capture handles are not always `Send`, so the source is opened on the
    // worker thread that drives it.
    let summary = tokio::task::spawn_blocking(move || track(&args, &settings, &cancel))
        .await
        .context("Tracking worker panicked")??;
    interrupt.abort();

    info!(
        frames = summary.frames,
        motion_events = summary.motion_events,
        stop = ?summary.stop,
        "Motion tracker finished"
    );
    Ok(())
}

fn track(args: &Args, settings: &Settings, cancel: &AtomicBool) -> Result<RunSummary> {
    let source = open_source(args, &settings.capture)?;
    let source = Oriented::new(source, settings.capture.hflip, settings.capture.vflip);
    let detector = MotionDetector::new(settings.detector.clone()).context("Invalid detector settings")?;

    let sink: Box<dyn ReportSink> = if settings.output.debug {
        Box::new(LogSink)
    } else {
        Box::new(SilentSink)
    };

    let mut tracker = TrackingLoop::new(source, detector, sink).with_max_frames(args.max_frames);
    if settings.output.visualize {
        let writer = SnapshotWriter::new(&settings.output.snapshot_dir).with_context(|| {
            format!(
                "Failed to create snapshot directory {}",
                settings.output.snapshot_dir.display()
            )
        })?;
        tracker = tracker.with_observer(Box::new(writer));
    }

    Ok(tracker.run(cancel)?)
}

fn open_source(args: &Args, capture: &CaptureConfig) -> Result<Box<dyn FrameSource>> {
    match args.source {
        SourceKind::Synthetic => Ok(Box::new(SyntheticSource::new(capture.width, capture.height))),
        SourceKind::Images => {
            let dir = args
                .images
                .as_deref()
                .context("--images <DIR> is required with --source images")?;
            let source = ImageSequenceSource::open(dir, capture.width, capture.height, args.loop_images)
                .context("Failed to open image sequence")?;
            Ok(Box::new(source))
        }
        SourceKind::Camera => open_camera(args.device, capture),
    }
}

#[cfg(feature = "camera")]
fn open_camera(device: u32, capture: &CaptureConfig) -> Result<Box<dyn FrameSource>> {
    use motion_track::frame_source::CameraSource;

    let camera = CameraSource::open(device, capture.width, capture.height).context("Failed to initialize camera")?;
    Ok(Box::new(camera))
}

#[cfg(not(feature = "camera"))]
fn open_camera(_device: u32, _capture: &CaptureConfig) -> Result<Box<dyn FrameSource>> {
    anyhow::bail!("camera support is not compiled in; rebuild with `--features camera`")
}
