// THEORY:
// The `frame` module holds the raster primitives of the motion pipeline. Each one
// is a pure function from one image to a new image of the same dimensions; none of
// them know about contours, thresholds in pixels², or frame history.
//
// Key architectural principles:
// 1.  **Intensity First**: Color frames are reduced to a single luma channel
//     before anything else happens. Motion is a change in brightness; color only
//     adds sensor noise to the difference.
// 2.  **Spatial Pooling**: The difference raster is smoothed with a mean filter
//     over a square window. Averaging a neighborhood cancels isolated
//     single-pixel flicker so that only spatially coherent change survives the
//     threshold. Larger windows trade small/fast motion for fewer false hits.
// 3.  **Binary Output**: The final stage maps the smoothed difference onto a
//     {0, 255} mask, the only input the contour layer accepts.

use image::{GrayImage, Luma, RgbImage};

/// A captured color frame: 3 channels, 8 bits each, row-major.
pub type Frame = RgbImage;
/// A single-channel luma raster derived from a `Frame`.
pub type IntensityFrame = GrayImage;

const MASK_SET: u8 = 255;
const MASK_CLEAR: u8 = 0;

// Rec. 601 luma weights in 14-bit fixed point. They sum to 1 << 14.
const LUMA_SHIFT: u32 = 14;
const LUMA_RED: u32 = 4899;
const LUMA_GREEN: u32 = 9617;
const LUMA_BLUE: u32 = 1868;

/// Rec. 601 luma of one RGB sample, rounded to nearest.
pub fn luma([red, green, blue]: [u8; 3]) -> u8 {
    let weighted = red as u32 * LUMA_RED + green as u32 * LUMA_GREEN + blue as u32 * LUMA_BLUE;
    ((weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
}

/// Converts a color frame to its intensity raster.
pub fn to_intensity(frame: &Frame) -> IntensityFrame {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        Luma([luma(frame.get_pixel(x, y).0)])
    })
}

/// Per-pixel `|a - b|`. Both rasters must share dimensions.
pub fn absolute_difference(a: &IntensityFrame, b: &IntensityFrame) -> IntensityFrame {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    let mut out = GrayImage::new(a.width(), a.height());
    for ((dst, &lhs), &rhs) in out.iter_mut().zip(a.iter()).zip(b.iter()) {
        *dst = lhs.abs_diff(rhs);
    }
    out
}

/// Normalized box filter with a `size x size` window.
///
/// The window is anchored at `size / 2`, so for even sizes it reaches one pixel
/// further up/left than down/right. Pixels outside the raster are mirrored
/// without repeating the edge (`dcb|abcd|cba`). The mean is rounded to nearest.
pub fn box_blur(src: &IntensityFrame, size: u32) -> IntensityFrame {
    let (width, height) = src.dimensions();
    if size <= 1 || width == 0 || height == 0 {
        return src.clone();
    }

    let anchor = (size / 2) as i64;
    let taps = || (0..size as i64).map(|k| k - anchor);

    // Horizontal pass: window sums along each row.
    let mut row_sums = vec![0u64; width as usize * height as usize];
    for y in 0..height {
        for x in 0..width {
            let sum: u64 = taps()
                .map(|dx| src.get_pixel(reflect_101(x as i64 + dx, width), y)[0] as u64)
                .sum();
            row_sums[y as usize * width as usize + x as usize] = sum;
        }
    }

    // Vertical pass over the row sums.
    // Row sums fit in u64 for any u32 window; their sum over the column needs u128.
    let area = size as u128 * size as u128;
    GrayImage::from_fn(width, height, |x, y| {
        let sum: u128 = taps()
            .map(|dy| {
                let row = reflect_101(y as i64 + dy, height) as usize;
                row_sums[row * width as usize + x as usize] as u128
            })
            .sum();
        Luma([((sum + area / 2) / area) as u8])
    })
}

/// Maps every pixel strictly above `sensitivity` to 255 and the rest to 0.
pub fn binarize(src: &IntensityFrame, sensitivity: u8) -> GrayImage {
    let mut mask = src.clone();
    for value in mask.iter_mut() {
        *value = if *value > sensitivity { MASK_SET } else { MASK_CLEAR };
    }
    mask
}

/// Mirrors an out-of-range coordinate back into `0..len` without repeating the
/// border sample.
fn reflect_101(index: i64, len: u32) -> u32 {
    let len = len as i64;
    if len == 1 {
        return 0;
    }
    let period = 2 * len - 2;
    let folded = index.rem_euclid(period);
    (if folded >= len { period - folded } else { folded }) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gray(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([value]))
    }

    #[test]
    fn luma_of_primaries_and_extremes() {
        assert_eq!(luma([0, 0, 0]), 0);
        assert_eq!(luma([255, 255, 255]), 255);
        assert_eq!(luma([255, 0, 0]), 76);
        assert_eq!(luma([0, 255, 0]), 150);
        assert_eq!(luma([0, 0, 255]), 29);
    }

    #[test]
    fn intensity_keeps_dimensions() {
        let frame = RgbImage::from_pixel(7, 3, Rgb([10, 20, 30]));
        let intensity = to_intensity(&frame);
        assert_eq!(intensity.dimensions(), (7, 3));
        assert!(intensity.pixels().all(|p| p[0] == luma([10, 20, 30])));
    }

    #[test]
    fn difference_is_symmetric() {
        let a = gray(4, 4, 200);
        let mut b = gray(4, 4, 50);
        b.put_pixel(1, 1, Luma([250]));

        let ab = absolute_difference(&a, &b);
        let ba = absolute_difference(&b, &a);
        assert_eq!(ab, ba);
        assert_eq!(ab.get_pixel(0, 0)[0], 150);
        assert_eq!(ab.get_pixel(1, 1)[0], 50);
    }

    #[test]
    fn blur_of_uniform_raster_is_uniform() {
        let src = gray(13, 9, 77);
        assert_eq!(box_blur(&src, 10), src);
    }

    #[test]
    fn blur_of_size_one_is_identity() {
        let mut src = gray(5, 5, 0);
        src.put_pixel(2, 3, Luma([255]));
        assert_eq!(box_blur(&src, 1), src);
    }

    #[test]
    fn blur_spreads_a_single_spike() {
        let mut src = gray(9, 9, 0);
        src.put_pixel(4, 4, Luma([90]));

        let blurred = box_blur(&src, 3);
        // 90 / 9 = 10 over the 3x3 neighborhood, zero outside.
        for y in 0..9 {
            for x in 0..9 {
                let expected = if (3..=5).contains(&x) && (3..=5).contains(&y) { 10 } else { 0 };
                assert_eq!(blurred.get_pixel(x, y)[0], expected, "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn even_blur_window_leans_up_and_left() {
        let mut src = gray(8, 1, 0);
        src.put_pixel(4, 0, Luma([200]));

        // Window for output x covers x-1..=x, so the spike lands on x = 4 and 5.
        // The single row is mirrored onto itself vertically: 2 of 4 taps hit.
        let blurred = box_blur(&src, 2);
        let row: Vec<u8> = blurred.pixels().map(|p| p[0]).collect();
        assert_eq!(row, vec![0, 0, 0, 0, 100, 100, 0, 0]);
    }

    #[test]
    fn huge_blur_window_does_not_overflow() {
        // 255 * 70000² exceeds u64.
        let src = gray(4, 3, 255);
        assert_eq!(box_blur(&src, 70_000), src);

        let mut half = gray(2, 2, 0);
        half.put_pixel(1, 0, Luma([255]));
        half.put_pixel(1, 1, Luma([255]));
        // Every window alternates columns evenly.
        let blurred = box_blur(&half, 70_000);
        assert!(blurred.pixels().all(|p| p[0] == 128), "{blurred:?}");
    }

    #[test]
    fn reflection_does_not_repeat_the_border() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(3, 5), 3);
        assert_eq!(reflect_101(-7, 1), 0);
        assert_eq!(reflect_101(-3, 2), 1);
    }

    #[test]
    fn binarize_is_strictly_greater_than() {
        let mut src = gray(3, 1, 0);
        src.put_pixel(0, 0, Luma([25]));
        src.put_pixel(1, 0, Luma([26]));
        src.put_pixel(2, 0, Luma([255]));

        let mask = binarize(&src, 25);
        let row: Vec<u8> = mask.pixels().map(|p| p[0]).collect();
        assert_eq!(row, vec![0, 255, 255]);
    }
}
