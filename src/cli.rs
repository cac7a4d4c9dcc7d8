use crate::config::Settings;
use crate::error::ConfigError;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "motion_track")]
#[command(about = "Locates the largest moving region in a video feed")]
#[command(long_about = "Differences consecutive frames, thresholds the blurred difference, and reports the centroid and bounding box of the largest moving contour together with periodic throughput.")]
pub struct Args {
    #[arg(short = 'c', long = "config", help = "TOML settings file; flags override its values")]
    pub config: Option<PathBuf>,

    #[arg(
        short = 's',
        long = "source",
        value_enum,
        default_value_t = SourceKind::default(),
        help = "Where frames come from"
    )]
    pub source: SourceKind,

    #[arg(long = "images", help = "Directory of frames for --source images")]
    pub images: Option<PathBuf>,

    #[arg(long = "loop-images", help = "Restart the image sequence instead of stopping at its end")]
    pub loop_images: bool,

    #[arg(short = 'd', long = "device", default_value = "0", help = "Camera index for --source camera")]
    pub device: u32,

    #[arg(short = 'w', long = "width", help = "Capture width in pixels [default: 320]")]
    pub width: Option<u32>,

    #[arg(long = "height", help = "Capture height in pixels [default: 240]")]
    pub height: Option<u32>,

    #[arg(long = "hflip", help = "Mirror frames horizontally")]
    pub hflip: bool,

    #[arg(long = "vflip", help = "Mirror frames vertically")]
    pub vflip: bool,

    #[arg(long = "sensitivity", help = "Binarization cutoff, 0-255 [default: 25]")]
    pub sensitivity: Option<u8>,

    #[arg(long = "blur-size", help = "Box-blur window applied to the difference [default: 10]")]
    pub blur_size: Option<u32>,

    #[arg(long = "min-area", help = "Smallest contour area reported as motion [default: 25]")]
    pub min_area: Option<f64>,

    #[arg(short = 'q', long = "quiet", help = "Disable throughput and motion reports")]
    pub quiet: bool,

    #[arg(long = "visualize", help = "Save annotated snapshots of frames with motion")]
    pub visualize: bool,

    #[arg(long = "snapshot-dir", help = "Directory for --visualize output [default: snapshots]")]
    pub snapshot_dir: Option<PathBuf>,

    #[arg(long = "max-frames", help = "Stop after this many frames")]
    pub max_frames: Option<u64>,

    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase verbosity level (use multiple times for more verbose output)"
    )]
    pub verbose: u8,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Generated frames with a moving square.
    Synthetic,
    /// Image files from a directory.
    Images,
    /// A local capture device.
    Camera,
}

impl Default for SourceKind {
    fn default() -> Self {
        if cfg!(feature = "camera") {
            SourceKind::Camera
        } else {
            SourceKind::Synthetic
        }
    }
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Defaults, then the config file, then flags.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        let capture = &mut settings.capture;
        if let Some(width) = self.width {
            capture.width = width;
        }
        if let Some(height) = self.height {
            capture.height = height;
        }
        capture.hflip |= self.hflip;
        capture.vflip |= self.vflip;

        let detector = &mut settings.detector;
        if let Some(sensitivity) = self.sensitivity {
            detector.sensitivity = sensitivity;
        }
        if let Some(blur_size) = self.blur_size {
            detector.blur_size = blur_size;
        }
        if let Some(min_area) = self.min_area {
            detector.min_area = min_area;
        }

        let output = &mut settings.output;
        if self.quiet {
            output.debug = false;
        }
        output.visualize |= self.visualize;
        if let Some(dir) = &self.snapshot_dir {
            output.snapshot_dir = dir.clone();
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn setup_logging(&self) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
        use tracing_subscriber::{EnvFilter, FmtSubscriber};

        let level = match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };

        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
    }
}
