// THEORY:
// The `contour` module is the spatial grouping layer. It turns a binary motion
// mask into a list of candidate regions, each described by its outer boundary,
// the area that boundary encloses and its axis-aligned bounding box.
//
// Key architectural principles:
// 1.  **Narrow Seam**: Segmentation is reached only through the
//     `ContourExtractor` trait. The detector's selection logic never sees which
//     algorithm produced the boundaries, so the backend can be swapped (or
//     stubbed in tests) without touching it.
// 2.  **External Boundaries Only**: A moving blob with a hole in it is still one
//     blob. Hole borders, and anything nested inside a hole, never become
//     candidates.
// 3.  **Deterministic Order**: Candidates come out in raster-scan order of their
//     first boundary pixel. Same mask, same list.
// 4.  **Stateless Utility**: Nothing here remembers previous frames. Contours
//     live for one processing step and are dropped.

use image::{GrayImage, imageops};
use imageproc::contours::{BorderType, find_contours};

/// An integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned box in pixel coordinates. `width` and `height` are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Last column inside the box.
    pub fn right(&self) -> u32 {
        self.x + self.width - 1
    }

    /// Last row inside the box.
    pub fn bottom(&self) -> u32 {
        self.y + self.height - 1
    }

    pub fn contains(&self, point: Point) -> bool {
        (self.x..=self.right()).contains(&point.x) && (self.y..=self.bottom()).contains(&point.y)
    }
}

/// One candidate region of a motion mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    /// Boundary pixels in tracing order.
    pub points: Vec<Point>,
    /// Area enclosed by the boundary polygon, in px².
    pub area: f64,
    pub bounds: Region,
}

impl Contour {
    /// Builds a contour from its boundary. Returns `None` for an empty boundary.
    pub fn from_points(points: Vec<Point>) -> Option<Self> {
        let bounds = bounding_region(&points)?;
        Some(Self {
            area: polygon_area(&points),
            bounds,
            points,
        })
    }
}

/// Anything that can segment a binary mask into its outermost boundaries.
pub trait ContourExtractor {
    /// Returns the external contours of `mask` (non-zero pixels are foreground)
    /// in a deterministic order.
    fn extract_external_contours(&self, mask: &GrayImage) -> Vec<Contour>;
}

/// Suzuki-Abe border following, keeping only top-level outer borders.
#[derive(Debug, Clone, Copy, Default)]
pub struct BorderFollowing;

impl ContourExtractor for BorderFollowing {
    fn extract_external_contours(&self, mask: &GrayImage) -> Vec<Contour> {
        // `find_contours` only opens an outer border right of a background
        // pixel, so a blob on column 0 would come back as a hole. Surround the
        // mask with one background pixel on every side.
        let (width, height) = mask.dimensions();
        let mut padded = GrayImage::new(width + 2, height + 2);
        imageops::replace(&mut padded, mask, 1, 1);

        find_contours::<u32>(&padded)
            .into_iter()
            .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
            .filter_map(|c| {
                let points = c.points.into_iter().map(|p| Point::new(p.x - 1, p.y - 1)).collect();
                Contour::from_points(points)
            })
            .collect()
    }
}

/// Shoelace area of the closed polygon through `points`.
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice_signed: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice_signed.abs() as f64 / 2.0
}

/// Smallest `Region` holding every point, or `None` when there are none.
pub fn bounding_region(points: &[Point]) -> Option<Region> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Region::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}
