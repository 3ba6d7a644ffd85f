use anyhow::{anyhow, Result};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::otsu_level;
use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostics;
use crate::log;
use crate::tooltip::geometry::PixelRect;

/// Optional image preparation applied before field extraction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreprocessMode {
    #[default]
    None,
    /// Grayscale + Otsu binarization
    #[serde(alias = "binary-threshold")]
    Binary,
}

/// Applies `mode` to `img`.
///
/// The input and the result are saved as `last_input.png` / `last_preprocessed.png`.
/// If preprocessing fails the original image is returned and the error is written
/// to `last_preprocess_error.txt`.
pub fn preprocess(img: &DynamicImage, mode: PreprocessMode, diagnostics: &Diagnostics) -> DynamicImage {
    diagnostics.save_image("last_input.png", img);

    let output = match mode {
        PreprocessMode::None => img.clone(),
        PreprocessMode::Binary => match binarize(img) {
            Ok(binary) => DynamicImage::ImageLuma8(binary),
            Err(e) => {
                log(&format!("Preprocessing failed, using original image: {}", e));
                diagnostics.write_text("last_preprocess_error.txt", &e.to_string());
                img.clone()
            }
        },
    };

    diagnostics.save_image("last_preprocessed.png", &output);
    output
}

/// Converts to grayscale and thresholds at the Otsu level.
///
/// Pixels brighter than the level become white, the rest black.
pub fn binarize(img: &DynamicImage) -> Result<GrayImage> {
    if img.width() == 0 || img.height() == 0 {
        return Err(anyhow!(
            "Cannot binarize an empty {}x{} image",
            img.width(),
            img.height()
        ));
    }

    let mut gray = img.to_luma8();
    let level = otsu_level(&gray);
    for p in gray.pixels_mut() {
        *p = if p[0] > level { Luma([255]) } else { Luma([0]) };
    }
    Ok(gray)
}

/// Crops a pixel rectangle, clamped to the image bounds.
pub fn crop_rect(img: &DynamicImage, rect: &PixelRect) -> DynamicImage {
    let r = rect.clamp_to(img.width(), img.height());
    let w = r.width().max(0) as u32;
    let h = r.height().max(0) as u32;
    img.crop_imm(r.x1 as u32, r.y1 as u32, w, h)
}

/// Resizes by `factor` with bicubic filtering, keeping at least 1x1.
pub fn upscale(img: &DynamicImage, factor: f32) -> DynamicImage {
    let w = ((img.width() as f32 * factor) as u32).max(1);
    let h = ((img.height() as f32 * factor) as u32).max(1);
    img.resize_exact(w, h, FilterType::CatmullRom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    fn two_tone() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(10, 2, |x, _| {
            if x < 5 {
                Rgba([30, 30, 30, 255])
            } else {
                Rgba([220, 220, 220, 255])
            }
        }))
    }

    #[test]
    fn test_binarize_splits_two_tones() {
        let result = binarize(&two_tone()).unwrap();
        assert_eq!(result.get_pixel(0, 0)[0], 0, "Dark pixel should become black");
        assert_eq!(result.get_pixel(9, 1)[0], 255, "Bright pixel should become white");
    }

    #[test]
    fn test_preprocess_none_is_passthrough() {
        let img = two_tone();
        let out = preprocess(&img, PreprocessMode::None, &Diagnostics::disabled());
        assert_eq!(out.to_rgba8().as_raw(), img.to_rgba8().as_raw());
    }

    #[test]
    fn test_preprocess_failure_falls_back() {
        let dir = tempdir().unwrap();
        let diag = Diagnostics::in_dir(dir.path());
        let empty = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));

        let out = preprocess(&empty, PreprocessMode::Binary, &diag);
        assert_eq!((out.width(), out.height()), (0, 0));
        assert!(dir.path().join("last_preprocess_error.txt").exists());
    }

    #[test]
    fn test_preprocess_writes_artifacts() {
        let dir = tempdir().unwrap();
        let diag = Diagnostics::in_dir(dir.path());

        let out = preprocess(&two_tone(), PreprocessMode::Binary, &diag);
        assert!(matches!(out, DynamicImage::ImageLuma8(_)));
        assert!(dir.path().join("last_input.png").exists());
        assert!(dir.path().join("last_preprocessed.png").exists());
    }

    #[test]
    fn test_crop_rect_clamps() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(100, 100));
        let cropped = crop_rect(&img, &PixelRect::new(90, 90, 140, 140));
        assert_eq!((cropped.width(), cropped.height()), (10, 10));
    }

    #[test]
    fn test_upscale() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(40, 20));
        let up = upscale(&img, 1.5);
        assert_eq!((up.width(), up.height()), (60, 30));
    }

    #[test]
    fn test_mode_deserializes() {
        let mode: PreprocessMode = serde_json::from_str("\"binary\"").unwrap();
        assert_eq!(mode, PreprocessMode::Binary);
        let mode: PreprocessMode = serde_json::from_str("\"binary-threshold\"").unwrap();
        assert_eq!(mode, PreprocessMode::Binary);
        let mode: PreprocessMode = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(mode, PreprocessMode::None);
    }
}
