//! One detect-then-extract pass over a captured image.
//!
//! The pipeline holds no state between runs. Scratch artifacts go through
//! [`Diagnostics`] and are overwritten by the next run.

use anyhow::Result;
use image::{DynamicImage, Rgba};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use serde::Serialize;

use crate::diagnostics::Diagnostics;
use crate::log;
use crate::ocr::engine::OcrEngine;
use crate::ocr::preprocess::{crop_rect, preprocess, PreprocessMode};
use crate::tooltip::fields::{extract_fields, ExtractionMode, ExtractionResult, LocatorConfig};
use crate::tooltip::geometry::PixelRect;
use crate::tooltip::lexicon::Lexicons;
use crate::tooltip::scorer::{DetectorConfig, RegionCandidate, TooltipLocator};

/// Per-run switches.
#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineOptions {
    /// Search for the tooltip rectangle before extracting; otherwise use the whole image
    pub use_region_detection: bool,
    pub preprocess: PreprocessMode,
    pub extraction: ExtractionMode,
}

/// Result of one run. Field boxes are in the coordinates of the input image.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PipelineOutput {
    /// The detected tooltip, `None` when the whole image was used
    pub region: Option<RegionCandidate>,
    #[serde(flatten)]
    pub fields: ExtractionResult,
}

/// Wires the detector and the field extractor to one OCR engine.
pub struct Pipeline<'a> {
    engine: &'a dyn OcrEngine,
    lexicons: &'a Lexicons,
    detector: &'a DetectorConfig,
    locator: &'a LocatorConfig,
    options: PipelineOptions,
    diagnostics: Diagnostics,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        engine: &'a dyn OcrEngine,
        lexicons: &'a Lexicons,
        detector: &'a DetectorConfig,
        locator: &'a LocatorConfig,
        options: PipelineOptions,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            engine,
            lexicons,
            detector,
            locator,
            options,
            diagnostics,
        }
    }

    /// Finds the tooltip in `img` around `reference` (image coordinates).
    ///
    /// Saves the debug overlay and the best candidate crops.
    pub fn locate_tooltip(&self, img: &DynamicImage, reference: (i32, i32)) -> Result<Option<RegionCandidate>> {
        let locator = TooltipLocator::new(self.engine, self.lexicons, self.detector);
        let ranked = locator.rank(img, reference)?;

        for (i, cand) in ranked.iter().take(self.detector.diagnostic_top_k).enumerate() {
            self.diagnostics
                .save_crop(&format!("cv_cand_{}.png", i + 1), img, &cand.bounds);
        }

        let best = ranked.into_iter().next();
        if self.diagnostics.dir().is_some() {
            let overlay = debug_overlay(img, best.as_ref().map(|c| &c.bounds));
            self.diagnostics.save_image("cv_big_roi_debug.png", &overlay);
        }
        Ok(best)
    }

    /// Extracts name and trait from `img`, a capture around `reference`.
    ///
    /// When no tooltip rectangle is found the whole image is used. OCR
    /// failures are returned as errors.
    pub fn run(&self, img: &DynamicImage, reference: (i32, i32)) -> Result<PipelineOutput> {
        self.diagnostics.save_image("cv_big_roi.png", img);

        let region = if self.options.use_region_detection {
            self.locate_tooltip(img, reference)?
        } else {
            None
        };

        let (tooltip, offset) = match &region {
            Some(cand) => {
                log(&format!(
                    "Tooltip at {:?} (score={:.2}, aspect={:.2})",
                    cand.bounds, cand.score, cand.aspect
                ));
                let crop = crop_rect(img, &cand.bounds);
                self.diagnostics.save_image("cv_tooltip_crop.png", &crop);
                (crop, (cand.bounds.x1, cand.bounds.y1))
            }
            None => {
                if self.options.use_region_detection {
                    log("No tooltip rectangle found, using the whole capture");
                }
                (img.clone(), (0, 0))
            }
        };

        let prepared = preprocess(&tooltip, self.options.preprocess, &self.diagnostics);
        let mut fields = extract_fields(
            &prepared,
            self.options.extraction,
            self.engine,
            self.lexicons,
            self.locator,
        )?;

        fields.name_box = fields.name_box.map(|b| b.translate(offset.0, offset.1));
        fields.trait_box = fields.trait_box.map(|b| b.translate(offset.0, offset.1));

        if let Some(b) = &fields.name_box {
            self.diagnostics.save_crop("auto_name_crop.png", img, b);
        }
        if let Some(b) = &fields.trait_box {
            self.diagnostics.save_crop("auto_trait_crop.png", img, b);
        }

        log(&format!(
            "Extracted name={:?} trait={:?}",
            fields.name_text, fields.trait_text
        ));
        Ok(PipelineOutput { region, fields })
    }
}

/// Copy of `img` with `bounds` outlined in green, two pixels wide.
fn debug_overlay(img: &DynamicImage, bounds: Option<&PixelRect>) -> DynamicImage {
    let mut canvas = img.to_rgba8();
    if let Some(b) = bounds {
        let green = Rgba([0, 255, 0, 255]);
        for inset in 0..2 {
            let w = b.width() - 2 * inset;
            let h = b.height() - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(b.x1 + inset, b.y1 + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(&mut canvas, rect, green);
        }
    }
    DynamicImage::ImageRgba8(canvas)
}
