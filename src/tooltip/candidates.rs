//! Tooltip rectangle proposals from edge/contour analysis.
//!
//! Pipeline: grayscale → 3x3 median blur → Canny with thresholds derived from
//! the median intensity → one 3x3 dilation → external contours → bounding boxes.
//! No filtering happens here; every external contour becomes a proposal.

use image::{DynamicImage, GrayImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::median_filter;
use imageproc::morphology::dilate;

use super::geometry::PixelRect;

/// Multipliers applied to the median intensity to get the Canny threshold pair.
const LOW_THRESHOLD_FACTOR: f32 = 0.66;
const HIGH_THRESHOLD_FACTOR: f32 = 1.33;

/// Proposes axis-aligned tooltip candidates, in contour order.
///
/// The order is stable for a fixed image, so identical input always yields an
/// identical list.
pub fn propose_candidates(img: &DynamicImage) -> Vec<PixelRect> {
    let gray = img.to_luma8();
    if gray.width() == 0 || gray.height() == 0 {
        return Vec::new();
    }

    let edges = edge_map(&gray);
    let contours = find_contours::<i32>(&edges);

    contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| {
            let min_x = c.points.iter().map(|p| p.x).min()?;
            let max_x = c.points.iter().map(|p| p.x).max()?;
            let min_y = c.points.iter().map(|p| p.y).min()?;
            let max_y = c.points.iter().map(|p| p.y).max()?;
            // Inclusive pixel extents, so a single-pixel contour is 1x1
            Some(PixelRect::new(min_x, min_y, max_x + 1, max_y + 1))
        })
        .collect()
}

/// Binary edge map used for contour extraction.
pub fn edge_map(gray: &GrayImage) -> GrayImage {
    let blurred = median_filter(gray, 1, 1);
    let (low, high) = edge_thresholds(median_intensity(&blurred));
    let edges = canny(&blurred, low, high);
    dilate(&edges, Norm::LInf, 1)
}

/// Canny threshold pair for a given median intensity, clamped to `[1, 255]`.
///
/// A zero low threshold makes `canny` hysteresis walk off the image border, so
/// near-black captures still get a pair of at least 1.
pub fn edge_thresholds(median: f32) -> (f32, f32) {
    let low = (LOW_THRESHOLD_FACTOR * median).clamp(1.0, 255.0).floor();
    let high = (HIGH_THRESHOLD_FACTOR * median).clamp(1.0, 255.0).floor().max(low);
    (low, high)
}

/// Median pixel value; for an even pixel count, the mean of the two middle values.
pub fn median_intensity(gray: &GrayImage) -> f32 {
    let mut histogram = [0u64; 256];
    for p in gray.pixels() {
        histogram[p[0] as usize] += 1;
    }

    let n = gray.width() as u64 * gray.height() as u64;
    if n == 0 {
        return 0.0;
    }

    if n % 2 == 1 {
        nth_value(&histogram, n / 2) as f32
    } else {
        let a = nth_value(&histogram, n / 2 - 1) as f32;
        let b = nth_value(&histogram, n / 2) as f32;
        (a + b) / 2.0
    }
}

/// Value of the `k`-th smallest pixel (0-based) given a histogram.
fn nth_value(histogram: &[u64; 256], k: u64) -> u8 {
    let mut seen = 0u64;
    for (value, &count) in histogram.iter().enumerate() {
        seen += count;
        if seen > k {
            return value as u8;
        }
    }
    255
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba, RgbaImage};

    fn panel_image() -> DynamicImage {
        // Dark 160x140 background with a bright panel at x 20..80, y 30..100
        let img = RgbaImage::from_fn(160, 140, |x, y| {
            if (20..80).contains(&x) && (30..100).contains(&y) {
                Rgba([210, 210, 200, 255])
            } else {
                Rgba([40, 40, 45, 255])
            }
        });
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_edge_thresholds_clamped() {
        assert_eq!(edge_thresholds(100.0), (66.0, 133.0));
        assert_eq!(edge_thresholds(250.0), (165.0, 255.0));
        assert_eq!(edge_thresholds(0.0), (1.0, 1.0));
        assert_eq!(edge_thresholds(1.0), (1.0, 1.0));
        assert_eq!(edge_thresholds(2.0), (1.0, 2.0));
    }

    #[test]
    fn test_median_intensity() {
        let img = GrayImage::from_fn(4, 1, |x, _| Luma([[10, 20, 30, 200][x as usize]]));
        assert_eq!(median_intensity(&img), 25.0);

        let odd = GrayImage::from_fn(3, 1, |x, _| Luma([[9, 1, 5][x as usize]]));
        assert_eq!(median_intensity(&odd), 5.0);
    }

    #[test]
    fn test_uniform_image_has_no_candidates() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 64, Rgba([40, 40, 40, 255])));
        assert!(propose_candidates(&img).is_empty());
    }

    #[test]
    fn test_panel_is_proposed() {
        let candidates = propose_candidates(&panel_image());
        assert!(!candidates.is_empty());

        let found = candidates.iter().any(|r| {
            (r.x1 - 20).abs() <= 4
                && (r.y1 - 30).abs() <= 4
                && (r.x2 - 80).abs() <= 4
                && (r.y2 - 100).abs() <= 4
        });
        assert!(found, "panel not among candidates: {:?}", candidates);
        assert!(candidates.iter().all(PixelRect::is_valid));
    }

    #[test]
    fn test_panel_on_black_background() {
        // Median intensity is 0; the panel covers 120x140 of 300x200
        let img = RgbaImage::from_fn(300, 200, |x, y| {
            if (40..160).contains(&x) && (30..170).contains(&y) {
                Rgba([120, 120, 120, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        });
        let gray = DynamicImage::ImageRgba8(img.clone()).to_luma8();
        assert_eq!(median_intensity(&median_filter(&gray, 1, 1)), 0.0);

        let candidates = propose_candidates(&DynamicImage::ImageRgba8(img));
        let found = candidates.iter().any(|r| {
            (r.x1 - 40).abs() <= 4
                && (r.y1 - 30).abs() <= 4
                && (r.x2 - 160).abs() <= 4
                && (r.y2 - 170).abs() <= 4
        });
        assert!(found, "panel not among candidates: {:?}", candidates);
    }

    #[test]
    fn test_black_image_has_no_candidates() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(80, 60, Rgba([0, 0, 0, 255])));
        assert!(propose_candidates(&img).is_empty());
    }

    #[test]
    fn test_proposals_are_deterministic() {
        let img = panel_image();
        assert_eq!(propose_candidates(&img), propose_candidates(&img));
    }
}
