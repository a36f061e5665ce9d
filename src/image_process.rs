//! Preprocessing and contour geometry shared by the candidate detector.

use image::{ DynamicImage, GenericImageView, GrayImage };
use imageproc::{ contours, edges };
use imageproc::point::Point;
use tracing::debug;

use crate::config::DetectorConfig;
use crate::error::LprError;
use crate::utils;

/// Reject images a pipeline stage can not work on.
pub fn ensure_not_empty(img: &DynamicImage) -> Result<(), LprError> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(LprError::invalid_input(format!("image has zero size ({}x{})", width, height)));
    }
    Ok(())
}

/// Colour image → binary map (values 0 / 255) of the same size.
///
/// grayscale, gaussian blur, histogram equalization, then a gaussian adaptive
/// threshold. Flat areas come out white, the dark side of every contrast step
/// comes out black.
pub fn preprocess(img: &DynamicImage, config: &DetectorConfig) -> Result<GrayImage, LprError> {
    ensure_not_empty(img)?;
    let gray = img.to_luma8();
    let blurred = utils::gaussian_blur(&gray, config.blur_kernel_size);
    let equalized = utils::equalize_hist_in_gray(&blurred);
    let binary = utils::adaptive_threshold_gaussian(&equalized, config.adaptive_block_size, config.adaptive_offset);
    debug!(width = binary.width(), height = binary.height(), "preprocessed");
    Ok(binary)
}

/// Hysteresis edge map of a preprocessed image.
pub fn edge_map(binary: &GrayImage, config: &DetectorConfig) -> GrayImage {
    edges::canny(binary, config.canny_low, config.canny_high)
}

/// Every border in the edge map, outer and hole, reduced to its turning points.
pub fn find_contours(edge_map: &GrayImage) -> Vec<Vec<Point<i32>>> {
    contours::find_contours::<i32>(edge_map)
        .into_iter()
        .map(|contour| simplify_chain(&contour.points))
        .collect()
}

/// Drop points that continue the previous step in the same direction.
pub fn simplify_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let len = points.len();
    if len <= 2 {
        return points.to_vec();
    }
    let step = |a: &Point<i32>, b: &Point<i32>| ((b.x - a.x).signum(), (b.y - a.y).signum());
    points.iter().enumerate().filter(|(i, p)| {
        let prev = &points[(i + len - 1) % len];
        let next = &points[(i + 1) % len];
        step(prev, p) != step(p, next)
    }).map(|(_, p)| *p).collect()
}

/// Enclosed area of a closed polygon (shoelace).
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points.iter().zip(points.iter().cycle().skip(1)).map(|(a, b)| {
        a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
    }).sum();
    (twice as f64 / 2.0).abs()
}

/// Inclusive axis-aligned bounds as `[x, y, width, height]`.
pub fn bounding_rect(points: &[Point<i32>]) -> Option<[u32; 4]> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some([
        min_x.max(0) as u32,
        min_y.max(0) as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ])
}


#[cfg(test)]
mod test {

    use image::{ DynamicImage, GrayImage, Luma, RgbImage, Rgb };
    use imageproc::point::Point;

    use super::*;
    use crate::config::DetectorConfig;
    use crate::utils::is_binary;

    fn square(side: i32) -> Vec<Point<i32>> {
        let mut points = Vec::new();
        for x in 0..side { points.push(Point::new(x, 0)); }
        for y in 1..side { points.push(Point::new(side - 1, y)); }
        for x in (0..side - 1).rev() { points.push(Point::new(x, side - 1)); }
        for y in (1..side - 1).rev() { points.push(Point::new(0, y)); }
        points
    }

    #[test]
    fn chain_keeps_only_corners() {
        let simple = simplify_chain(&square(10));
        assert_eq!(simple, vec![Point::new(0, 0), Point::new(9, 0), Point::new(9, 9), Point::new(0, 9)]);
    }

    #[test]
    fn area_and_bounds_of_square() {
        let points = square(10);
        assert_eq!(contour_area(&points), 81.0);
        assert_eq!(contour_area(&simplify_chain(&points)), 81.0);
        assert_eq!(bounding_rect(&points), Some([0, 0, 10, 10]));
        assert_eq!(bounding_rect(&[]), None);
    }

    #[test]
    fn preprocess_is_binary_whatever_the_contrast() {
        let low_contrast = RgbImage::from_fn(64, 48, |x, y| {
            let v = 120 + ((x * 7 + y * 3) % 9) as u8;
            Rgb([v, v.saturating_sub(2), v + 1])
        });
        let gradient = GrayImage::from_fn(64, 48, |x, y| Luma([(x * 4 + y) as u8]));
        let config = DetectorConfig::default();
        for img in vec![DynamicImage::ImageRgb8(low_contrast), DynamicImage::ImageLuma8(gradient)] {
            let bin = preprocess(&img, &config).unwrap();
            assert_eq!(bin.dimensions(), (64, 48));
            assert!(is_binary(&bin));
        }
    }

    #[test]
    fn zero_size_image_is_invalid() {
        let empty = DynamicImage::new_rgb8(0, 0);
        assert!(preprocess(&empty, &DetectorConfig::default()).is_err());
    }

    #[test]
    fn blank_image_has_no_edges() {
        let blank = DynamicImage::ImageRgb8(RgbImage::from_pixel(80, 60, Rgb([200, 200, 200])));
        let config = DetectorConfig::default();
        let edges = edge_map(&preprocess(&blank, &config).unwrap(), &config);
        assert!(find_contours(&edges).is_empty());
    }
}
