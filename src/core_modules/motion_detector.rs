// THEORY:
// The `MotionDetector` is the engine of the whole crate. It compares each new
// frame against the one before it and reports where the single largest moving
// region is.
//
// Key architectural principles:
// 1.  **One Slot of Memory**: The only state carried between calls is the
//     previous frame in intensity form. It is replaced, never blended, once the
//     current frame has been differenced against it. There is no notion of
//     "objects" surviving from one frame to the next.
// 2.  **Warm-up as Absence**: Before the first frame there is nothing to
//     compare with. That is modeled as `None` rather than a sentinel frame, and
//     the first call simply seeds the slot and reports nothing.
// 3.  **Pipeline per Frame**: luma -> |prev - cur| -> box blur -> threshold ->
//     external contours -> largest qualifying contour -> head-biased centroid.
// 4.  **Fail Before Mutating**: A frame that cannot be differenced against the
//     retained one is rejected up front, leaving the detector exactly as it was.

use crate::config::DetectorConfig;
use crate::core_modules::contour::{BorderFollowing, Contour, ContourExtractor, Point, Region};
use crate::core_modules::frame::{self, Frame, IntensityFrame};
use crate::error::{ConfigError, DetectorError};
use image::GrayImage;
use tracing::debug;

/// The centroid sits half way across the winning box...
pub const HORIZONTAL_CENTROID_DIVISOR: u32 = 2;
/// ...but only a sixth of the way down, so it lands on the top of a moving
/// object (a head, a leading edge) rather than its middle.
pub const VERTICAL_CENTROID_DIVISOR: u32 = 6;

/// The winning region of one processing step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub centroid: Point,
    pub region: Region,
    /// Enclosed contour area in px². Always above the configured minimum.
    pub area: f64,
}

/// The detector's per-frame output once it is warmed up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionEvent {
    /// How many external contours the mask held, qualifying or not.
    pub total_contours: usize,
    /// The largest contour above the minimum area, if there was one.
    pub motion: Option<Motion>,
}

impl MotionEvent {
    pub fn motion_found(&self) -> bool {
        self.motion.is_some()
    }
}

/// A `MotionEvent` together with the binary mask it was derived from.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub event: MotionEvent,
    pub mask: GrayImage,
}

/// Head-biased centroid of a bounding box.
pub fn centroid_of(region: &Region) -> Point {
    Point::new(
        region.x + region.width / HORIZONTAL_CENTROID_DIVISOR,
        region.y + region.height / VERTICAL_CENTROID_DIVISOR,
    )
}

/// Picks the contour with the strictly largest area above `min_area`. Ties keep
/// the earlier contour.
pub fn select_largest(contours: &[Contour], min_area: f64) -> Option<&Contour> {
    let mut best: Option<&Contour> = None;
    let mut biggest_area = min_area;
    for contour in contours {
        if contour.area > biggest_area {
            biggest_area = contour.area;
            best = Some(contour);
        }
    }
    best
}

/// Frame-differencing motion locator. One instance per video feed.
pub struct MotionDetector<E = BorderFollowing> {
    config: DetectorConfig,
    extractor: E,
    previous: Option<IntensityFrame>,
    dimensions: Option<(u32, u32)>,
}

impl MotionDetector<BorderFollowing> {
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        Self::with_extractor(config, BorderFollowing)
    }
}

impl<E: ContourExtractor> MotionDetector<E> {
    /// Builds a detector around a custom segmentation backend.
    pub fn with_extractor(config: DetectorConfig, extractor: E) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            extractor,
            previous: None,
            dimensions: None,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Dimensions of the first frame this detector accepted.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    /// Whether a previous frame is held, i.e. the next call can report motion.
    pub fn is_primed(&self) -> bool {
        self.previous.is_some()
    }

    /// Forgets the previous frame and its dimensions. The next call warms up again.
    pub fn reset(&mut self) {
        self.previous = None;
        self.dimensions = None;
    }

    /// Runs one step and returns only the event.
    pub fn process(&mut self, frame: &Frame) -> Result<Option<MotionEvent>, DetectorError> {
        Ok(self.analyze(frame)?.map(|analysis| analysis.event))
    }

    /// Runs one step and returns the event with its motion mask.
    ///
    /// Returns `Ok(None)` on the warm-up call.
    pub fn analyze(&mut self, frame: &Frame) -> Result<Option<Analysis>, DetectorError> {
        let actual = frame.dimensions();
        if actual.0 == 0 || actual.1 == 0 {
            return Err(DetectorError::EmptyFrame {
                width: actual.0,
                height: actual.1,
            });
        }
        if let Some(expected) = self.dimensions
            && expected != actual
        {
            return Err(DetectorError::InvalidFrame { expected, actual });
        }

        let current = frame::to_intensity(frame);
        let Some(previous) = self.previous.as_ref() else {
            debug!(width = actual.0, height = actual.1, "seeded previous frame");
            self.previous = Some(current);
            self.dimensions = Some(actual);
            return Ok(None);
        };

        let difference = frame::absolute_difference(previous, &current);
        let smoothed = frame::box_blur(&difference, self.config.blur_size);
        let mask = frame::binarize(&smoothed, self.config.sensitivity);
        self.previous = Some(current);

        let contours = self.extractor.extract_external_contours(&mask);
        let motion = select_largest(&contours, self.config.min_area).map(|best| Motion {
            centroid: centroid_of(&best.bounds),
            region: best.bounds,
            area: best.area,
        });

        debug!(
            total_contours = contours.len(),
            motion_found = motion.is_some(),
            "processed frame"
        );

        Ok(Some(Analysis {
            event: MotionEvent {
                total_contours: contours.len(),
                motion,
            },
            mask,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::cell::RefCell;

    const BACKGROUND: Rgb<u8> = Rgb([40, 40, 40]);

    fn background(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, BACKGROUND)
    }

    fn with_square(mut frame: RgbImage, region: Region) -> RgbImage {
        for y in region.y..region.y + region.height {
            for x in region.x..region.x + region.width {
                frame.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        frame
    }

    fn detector(config: DetectorConfig) -> MotionDetector {
        MotionDetector::new(config).expect("valid config")
    }

    fn unblurred() -> DetectorConfig {
        DetectorConfig {
            blur_size: 1,
            ..DetectorConfig::default()
        }
    }

    /// Hands out canned contour lists, ignoring the mask.
    struct Scripted(RefCell<Vec<Vec<Contour>>>);

    impl Scripted {
        fn new(mut steps: Vec<Vec<Contour>>) -> Self {
            steps.reverse();
            Self(RefCell::new(steps))
        }
    }

    impl ContourExtractor for Scripted {
        fn extract_external_contours(&self, _mask: &GrayImage) -> Vec<Contour> {
            self.0.borrow_mut().pop().unwrap_or_default()
        }
    }

    fn contour(region: Region, area: f64) -> Contour {
        Contour {
            points: vec![Point::new(region.x, region.y)],
            area,
            bounds: region,
        }
    }

    #[test]
    fn first_call_only_seeds_state() {
        let mut detector = detector(DetectorConfig::default());
        assert!(!detector.is_primed());

        let busy = with_square(background(64, 48), Region::new(5, 5, 30, 30));
        assert_eq!(detector.process(&busy), Ok(None));
        assert!(detector.is_primed());
        assert_eq!(detector.dimensions(), Some((64, 48)));
    }

    #[test]
    fn identical_frames_have_no_motion() {
        let mut detector = detector(DetectorConfig::default());
        let frame = with_square(background(64, 48), Region::new(10, 10, 8, 8));

        detector.process(&frame).expect("warm-up");
        for _ in 0..3 {
            let event = detector.process(&frame).expect("valid frame").expect("primed");
            assert!(!event.motion_found());
            assert_eq!(event.total_contours, 0);
        }
    }

    #[test]
    fn three_frame_scenario() {
        let mut detector = detector(unblurred());
        let still = background(120, 100);
        let moved = with_square(still.clone(), Region::new(50, 50, 10, 10));

        assert_eq!(detector.process(&still), Ok(None));

        let quiet = detector.process(&still).expect("valid").expect("primed");
        assert!(!quiet.motion_found());

        let event = detector.process(&moved).expect("valid").expect("primed");
        assert_eq!(event.total_contours, 1);
        let motion = event.motion.expect("square should register");
        assert_eq!(motion.region, Region::new(50, 50, 10, 10));
        assert_eq!(motion.area, 81.0);
        assert_eq!(motion.centroid, Point::new(55, 51));
    }

    #[test]
    fn default_blur_still_locates_the_square() {
        let mut detector = detector(DetectorConfig::default());
        let still = background(120, 100);
        let moved = with_square(still.clone(), Region::new(50, 50, 10, 10));

        detector.process(&still).expect("warm-up");
        let event = detector.process(&moved).expect("valid").expect("primed");

        assert_eq!(event.total_contours, 1);
        let motion = event.motion.expect("square should register");
        // The blur smears the square by up to half a window on each side.
        assert!((44..=50).contains(&motion.region.x), "{:?}", motion.region);
        assert!((44..=50).contains(&motion.region.y), "{:?}", motion.region);
        assert!((10..=20).contains(&motion.region.width), "{:?}", motion.region);
        assert!((10..=20).contains(&motion.region.height), "{:?}", motion.region);
        assert!(motion.region.contains(Point::new(55, 55)));
        assert!(motion.area > 25.0);
    }

    #[test]
    fn previous_frame_is_always_the_last_one() {
        let mut detector = detector(unblurred());
        let still = background(80, 80);
        let moved = with_square(still.clone(), Region::new(20, 20, 10, 10));

        detector.process(&still).expect("warm-up");
        assert!(detector.process(&moved).expect("valid").expect("primed").motion_found());
        // Same frame again: compared against `moved`, not the first background.
        assert!(!detector.process(&moved).expect("valid").expect("primed").motion_found());
        // Square disappears: that is motion again.
        assert!(detector.process(&still).expect("valid").expect("primed").motion_found());
    }

    #[test]
    fn squares_on_the_frame_edges_register() {
        let still = background(64, 64);
        let edges = [
            Region::new(0, 20, 12, 12),
            Region::new(52, 20, 12, 12),
            Region::new(20, 0, 12, 12),
            Region::new(20, 52, 12, 12),
        ];
        for region in edges {
            let mut detector = detector(unblurred());
            detector.process(&still).expect("warm-up");

            let event = detector
                .process(&with_square(still.clone(), region))
                .expect("valid")
                .expect("primed");
            assert!(event.motion_found(), "{region:?}");
            assert_eq!(event.total_contours, 1);
            assert_eq!(event.motion.expect("motion").region, region);
        }
    }

    #[test]
    fn whole_scene_change_is_motion() {
        let mut detector = detector(DetectorConfig::default());
        detector.process(&background(48, 32)).expect("warm-up");

        let lit = RgbImage::from_pixel(48, 32, Rgb([250, 250, 250]));
        let event = detector.process(&lit).expect("valid").expect("primed");
        assert_eq!(event.total_contours, 1);
        assert_eq!(event.motion.expect("motion").region, Region::new(0, 0, 48, 32));
    }

    #[test]
    fn small_changes_stay_below_min_area() {
        let mut detector = detector(unblurred());
        let still = background(60, 60);
        // 6x6 pixels trace a 5x5 polygon: area 25, not strictly above 25.
        let moved = with_square(still.clone(), Region::new(20, 20, 6, 6));

        detector.process(&still).expect("warm-up");
        let event = detector.process(&moved).expect("valid").expect("primed");
        assert_eq!(event.total_contours, 1);
        assert!(!event.motion_found());
    }

    #[test]
    fn largest_of_several_regions_wins() {
        let mut detector = detector(unblurred());
        let still = background(100, 100);
        let moved = with_square(
            with_square(still.clone(), Region::new(5, 5, 8, 8)),
            Region::new(50, 40, 20, 15),
        );

        detector.process(&still).expect("warm-up");
        let event = detector.process(&moved).expect("valid").expect("primed");
        assert_eq!(event.total_contours, 2);
        assert_eq!(event.motion.expect("motion").region, Region::new(50, 40, 20, 15));
    }

    #[test]
    fn ties_keep_the_earlier_contour() {
        let first = Region::new(0, 0, 10, 10);
        let second = Region::new(20, 20, 10, 10);
        let extractor = Scripted::new(vec![vec![contour(first, 90.0), contour(second, 90.0)]]);
        let mut detector =
            MotionDetector::with_extractor(DetectorConfig::default(), extractor).expect("valid");

        let frame = background(40, 40);
        detector.process(&frame).expect("warm-up");
        let event = detector.process(&frame).expect("valid").expect("primed");
        assert_eq!(event.total_contours, 2);
        assert_eq!(event.motion.expect("motion").region, first);
    }

    #[test]
    fn area_equal_to_minimum_never_qualifies() {
        let extractor = Scripted::new(vec![
            vec![contour(Region::new(0, 0, 5, 5), 25.0)],
            vec![contour(Region::new(0, 0, 5, 5), 25.5)],
        ]);
        let mut detector =
            MotionDetector::with_extractor(DetectorConfig::default(), extractor).expect("valid");

        let frame = background(40, 40);
        detector.process(&frame).expect("warm-up");
        let at_threshold = detector.process(&frame).expect("valid").expect("primed");
        assert_eq!(at_threshold.total_contours, 1);
        assert!(!at_threshold.motion_found());

        let above = detector.process(&frame).expect("valid").expect("primed");
        assert_eq!(above.motion.expect("motion").area, 25.5);
    }

    #[test]
    fn centroid_is_biased_towards_the_top() {
        let region = Region::new(10, 20, 40, 60);
        assert_eq!(centroid_of(&region), Point::new(30, 30));
        // Integer division truncates.
        assert_eq!(centroid_of(&Region::new(0, 0, 5, 5)), Point::new(2, 0));
    }

    #[test]
    fn mismatched_frame_is_rejected_without_mutation() {
        let mut detector = detector(unblurred());
        let still = background(50, 50);
        let moved = with_square(still.clone(), Region::new(10, 10, 10, 10));

        detector.process(&still).expect("warm-up");
        let err = detector.process(&background(40, 50)).expect_err("size mismatch");
        assert_eq!(
            err,
            DetectorError::InvalidFrame {
                expected: (50, 50),
                actual: (40, 50),
            }
        );

        // Still differencing against `still`.
        assert!(detector.process(&moved).expect("valid").expect("primed").motion_found());
    }

    #[test]
    fn empty_frame_is_rejected_without_priming() {
        let mut detector = detector(DetectorConfig::default());
        assert!(matches!(
            detector.process(&RgbImage::new(0, 10)),
            Err(DetectorError::EmptyFrame { .. })
        ));
        // The empty frame left no trace: any size is accepted next.
        assert_eq!(detector.process(&background(12, 12)), Ok(None));
        assert_eq!(detector.dimensions(), Some((12, 12)));
    }

    #[test]
    fn reset_starts_a_new_warm_up() {
        let mut detector = detector(DetectorConfig::default());
        detector.process(&background(30, 30)).expect("warm-up");
        detector.reset();
        assert!(!detector.is_primed());
        assert_eq!(detector.dimensions(), None);
        // Different resolution is fine after a reset.
        assert_eq!(detector.process(&background(60, 20)), Ok(None));
    }

    #[test]
    fn runs_are_deterministic() {
        let frames: Vec<RgbImage> = (0..6)
            .map(|i| with_square(background(90, 70), Region::new(5 + i * 9, 10 + i * 4, 12, 12)))
            .collect();

        let run = || {
            let mut detector = detector(DetectorConfig::default());
            frames
                .iter()
                .map(|f| detector.process(f).expect("valid"))
                .collect::<Vec<_>>()
        };

        let first = run();
        assert_eq!(first, run());
        assert_eq!(first[0], None);
        assert!(first[1..].iter().all(|e| e.is_some()));
    }

    #[test]
    fn analysis_exposes_the_mask() {
        let mut detector = detector(unblurred());
        let still = background(30, 30);
        let moved = with_square(still.clone(), Region::new(3, 4, 5, 6));

        assert!(detector.analyze(&still).expect("valid").is_none());
        let analysis = detector.analyze(&moved).expect("valid").expect("primed");
        assert_eq!(analysis.mask.dimensions(), (30, 30));
        assert_eq!(analysis.mask.get_pixel(3, 4)[0], 255);
        assert_eq!(analysis.mask.get_pixel(0, 0)[0], 0);
        assert_eq!(analysis.mask.pixels().filter(|p| p[0] == 255).count(), 30);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = DetectorConfig {
            blur_size: 0,
            ..DetectorConfig::default()
        };
        assert!(MotionDetector::new(config).is_err());
    }
}
