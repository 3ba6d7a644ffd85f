//! Scratch-directory artifacts for inspecting a run after the fact.
//!
//! Files are overwritten by every invocation. Write failures are logged and
//! otherwise ignored; diagnostics never change the outcome of a run.

use image::DynamicImage;
use std::path::{Path, PathBuf};

use crate::log;
use crate::ocr::preprocess::crop_rect;
use crate::tooltip::geometry::PixelRect;

#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    dir: Option<PathBuf>,
}

impl Diagnostics {
    /// Writes artifacts into `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Discards every artifact.
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Saves `img` as `name`, returning the written path.
    pub fn save_image(&self, name: &str, img: &DynamicImage) -> Option<PathBuf> {
        let path = self.dir.as_ref()?.join(name);
        match img.save(&path) {
            Ok(()) => Some(path),
            Err(e) => {
                log(&format!("Diagnostics: failed to save {}: {}", path.display(), e));
                None
            }
        }
    }

    /// Saves the `rect` crop of `img` as `name`.
    pub fn save_crop(&self, name: &str, img: &DynamicImage, rect: &PixelRect) -> Option<PathBuf> {
        self.dir.as_ref()?;
        let crop = crop_rect(img, rect);
        if crop.width() == 0 || crop.height() == 0 {
            return None;
        }
        self.save_image(name, &crop)
    }

    pub fn write_text(&self, name: &str, text: &str) -> Option<PathBuf> {
        let path = self.dir.as_ref()?.join(name);
        match std::fs::write(&path, text) {
            Ok(()) => Some(path),
            Err(e) => {
                log(&format!("Diagnostics: failed to write {}: {}", path.display(), e));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn test_disabled_writes_nothing() {
        let diag = Diagnostics::disabled();
        let img = DynamicImage::ImageRgba8(RgbaImage::new(4, 4));
        assert!(diag.save_image("x.png", &img).is_none());
        assert!(diag.write_text("x.txt", "hello").is_none());
    }

    #[test]
    fn test_save_crop() {
        let dir = tempdir().unwrap();
        let diag = Diagnostics::in_dir(dir.path());
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(20, 20, Rgba([1, 2, 3, 255])));

        let path = diag
            .save_crop("crop.png", &img, &PixelRect::new(5, 5, 15, 12))
            .unwrap();
        let saved = image::open(path).unwrap();
        assert_eq!((saved.width(), saved.height()), (10, 7));

        assert!(diag.save_crop("empty.png", &img, &PixelRect::new(30, 30, 40, 40)).is_none());
    }
}
