//! Name and trait extraction.
//!
//! The geometric path runs two stage cascades over a [`WordIndex`]; the text
//! path scans raw OCR lines. Both sit behind [`FieldExtractor`] and produce the
//! same [`ExtractionResult`].

pub mod name;
pub mod plain_text;
pub mod stages;
pub mod trait_label;

use anyhow::Result;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::geometry::PixelRect;
use super::lexicon::Lexicons;
use super::words::WordIndex;
use crate::log;
use crate::ocr::engine::OcrEngine;

use name::name_cascade;
use stages::StageContext;
use trait_label::trait_cascade;

/// A located field: its text and box in image coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldMatch {
    pub text: String,
    pub bounds: PixelRect,
}

/// Thresholds of the field stages.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Pixels between the dual anchors and the name window
    pub anchor_gap: i32,
    /// Height of the name window below the dual anchors
    pub name_window_height: i32,
    /// Maximum distance of a name line above the stat section
    pub lower_window_height: i32,
    /// Alphabetic words a name line needs
    pub min_alpha_words: usize,
    /// Alphabetic characters a name line above the stat section needs
    pub min_alpha_chars: usize,
    /// Weight of the tallest word in a line score
    pub height_weight: i32,
    /// Base vertical tolerance when grouping the top line
    pub top_line_tolerance: i32,
    /// Lines after the section label that may hold the trait
    pub trait_lookahead: i32,
    /// Lines scanned for a name in plain-text mode
    pub text_name_lines: usize,
    /// Lines scanned for a trait before the whole text in plain-text mode
    pub text_trait_lines: usize,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            anchor_gap: 2,
            name_window_height: 180,
            lower_window_height: 260,
            min_alpha_words: 2,
            min_alpha_chars: 6,
            height_weight: 3,
            top_line_tolerance: 10,
            trait_lookahead: 2,
            text_name_lines: 8,
            text_trait_lines: 12,
        }
    }
}

/// Extracted fields of one tooltip. A box is only present with its text.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub name_text: Option<String>,
    pub name_box: Option<PixelRect>,
    pub trait_text: Option<String>,
    pub trait_box: Option<PixelRect>,
    /// Full recognized text, filled by the plain-text path
    pub raw_text: Option<String>,
}

impl ExtractionResult {
    fn set_name(&mut self, found: Option<FieldMatch>) {
        if let Some(m) = found {
            self.name_text = Some(m.text);
            self.name_box = Some(m.bounds);
        }
    }

    fn set_trait(&mut self, found: Option<FieldMatch>) {
        if let Some(m) = found {
            self.trait_text = Some(m.text);
            self.trait_box = Some(m.bounds);
        }
    }
}

/// Which extraction path to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Word boxes and the stage cascades
    #[default]
    Geometric,
    /// Raw text lines only
    Text,
}

/// Turns a tooltip image into an [`ExtractionResult`].
pub trait FieldExtractor {
    fn extract(&self, img: &DynamicImage) -> Result<ExtractionResult>;
}

/// Extracts fields from word boxes.
pub struct GeometricExtractor<'a> {
    engine: &'a dyn OcrEngine,
    lexicons: &'a Lexicons,
    config: &'a LocatorConfig,
}

impl<'a> GeometricExtractor<'a> {
    pub fn new(engine: &'a dyn OcrEngine, lexicons: &'a Lexicons, config: &'a LocatorConfig) -> Self {
        Self {
            engine,
            lexicons,
            config,
        }
    }
}

impl FieldExtractor for GeometricExtractor<'_> {
    fn extract(&self, img: &DynamicImage) -> Result<ExtractionResult> {
        let index: WordIndex = self.engine.recognize_words(img)?.into_iter().collect();
        let (blocks, mean_confidence) = index.summary();
        log(&format!(
            "{}: {} words in {} blocks recognized in {}x{} image (mean confidence {})",
            self.engine.name(),
            index.len(),
            blocks,
            img.width(),
            img.height(),
            mean_confidence.map_or("n/a".to_string(), |c| c.to_string())
        ));
        Ok(extract_from_index(&index, img.width(), self.lexicons, self.config))
    }
}

/// Extracts fields from raw text lines.
pub struct TextExtractor<'a> {
    engine: &'a dyn OcrEngine,
    lexicons: &'a Lexicons,
    config: &'a LocatorConfig,
}

impl<'a> TextExtractor<'a> {
    pub fn new(engine: &'a dyn OcrEngine, lexicons: &'a Lexicons, config: &'a LocatorConfig) -> Self {
        Self {
            engine,
            lexicons,
            config,
        }
    }
}

impl FieldExtractor for TextExtractor<'_> {
    fn extract(&self, img: &DynamicImage) -> Result<ExtractionResult> {
        let text = self.engine.recognize_text(img)?;
        Ok(extract_from_text(&text, self.lexicons, self.config))
    }
}

/// Builds the extractor for `mode`.
pub fn extractor_for<'a>(
    mode: ExtractionMode,
    engine: &'a dyn OcrEngine,
    lexicons: &'a Lexicons,
    config: &'a LocatorConfig,
) -> Box<dyn FieldExtractor + 'a> {
    match mode {
        ExtractionMode::Geometric => Box::new(GeometricExtractor::new(engine, lexicons, config)),
        ExtractionMode::Text => Box::new(TextExtractor::new(engine, lexicons, config)),
    }
}

/// Runs the name and trait cascades over a word index.
///
/// An empty index yields an empty result, never an error.
pub fn extract_from_index(
    index: &WordIndex,
    image_width: u32,
    lexicons: &Lexicons,
    config: &LocatorConfig,
) -> ExtractionResult {
    let mut result = ExtractionResult::default();
    if index.is_empty() {
        log("Field extraction: no words recognized");
        return result;
    }

    let ctx = StageContext {
        image_width,
        lexicons,
        config,
    };
    result.set_name(name_cascade().run(index, &ctx));
    result.set_trait(trait_cascade().run(index, &ctx));
    result
}

/// Picks name and trait lines from raw recognized text. Boxes stay empty.
pub fn extract_from_text(text: &str, lexicons: &Lexicons, config: &LocatorConfig) -> ExtractionResult {
    let lines = plain_text::text_lines(text);
    let result = ExtractionResult {
        name_text: plain_text::plain_name(&lines, config.text_name_lines).map(str::to_string),
        name_box: None,
        trait_text: plain_text::plain_trait(&lines, &lexicons.trait_hints, config.text_trait_lines)
            .map(str::to_string),
        trait_box: None,
        raw_text: Some(text.to_string()),
    };
    log(&format!(
        "Plain-text extraction: name={:?} trait={:?} ({} lines)",
        result.name_text,
        result.trait_text,
        lines.len()
    ));
    result
}

/// Extracts fields from `img` with the given mode.
pub fn extract_fields(
    img: &DynamicImage,
    mode: ExtractionMode,
    engine: &dyn OcrEngine,
    lexicons: &Lexicons,
    config: &LocatorConfig,
) -> Result<ExtractionResult> {
    extractor_for(mode, engine, lexicons, config).extract(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::scripted::ScriptedEngine;
    use crate::tooltip::words::Word;
    use image::RgbaImage;

    fn w(text: &str, x: i32, y: i32, width: i32, height: i32, line: i32) -> Word {
        Word::new(text, x, y, width, height).unwrap().with_line(line)
    }

    fn extract(words: Vec<Word>) -> ExtractionResult {
        extract_from_index(&WordIndex::new(words), 200, &Lexicons::english(), &LocatorConfig::default())
    }

    #[test]
    fn test_full_tooltip() {
        let result = extract(vec![
            w("Epic", 10, 0, 40, 12, 0),
            w("Merciless", 10, 20, 80, 14, 1),
            w("Greatsword", 95, 20, 90, 14, 1),
            w("Trait", 10, 200, 40, 12, 5),
            w("Crippling Strike", 10, 220, 100, 14, 6),
        ]);

        assert_eq!(result.name_text.as_deref(), Some("Merciless Greatsword"));
        assert_eq!(result.name_box, Some(PixelRect::new(10, 20, 185, 34)));
        assert_eq!(result.trait_text.as_deref(), Some("Crippling Strike"));
        assert_eq!(result.trait_box, Some(PixelRect::new(10, 220, 110, 234)));
        assert_eq!(result.raw_text, None);
    }

    #[test]
    fn test_name_above_stat_section() {
        let result = extract(vec![
            w("Merciless", 10, 60, 80, 14, 1),
            w("Blade", 95, 60, 50, 14, 1),
            w("Defense", 10, 150, 60, 12, 3),
            w("1,204", 80, 150, 40, 12, 3),
        ]);

        assert_eq!(result.name_text.as_deref(), Some("Merciless Blade"));
        assert_eq!(result.trait_text, None);
        assert_eq!(result.trait_box, None);
    }

    #[test]
    fn test_name_falls_back_to_top_line() {
        let result = extract(vec![
            w("Lv.", 10, 5, 20, 12, 0),
            w("12", 35, 5, 20, 12, 0),
            w("Some body text", 10, 40, 120, 12, 1),
        ]);
        assert_eq!(result.name_text.as_deref(), Some("Lv."));
        assert_eq!(result.name_box, Some(PixelRect::new(10, 5, 30, 17)));
    }

    #[test]
    fn test_empty_index_is_not_an_error() {
        let result = extract(Vec::new());
        assert_eq!(result, ExtractionResult::default());
    }

    #[test]
    fn test_anchored_names_pass_denylist() {
        let lexicons = Lexicons::english();
        let result = extract(vec![
            w("Set", 10, 40, 60, 18, 0),
            w("Effects", 75, 40, 90, 18, 0),
            w("Storm", 10, 80, 50, 14, 1),
            w("Caller", 65, 80, 50, 14, 1),
            w("Melee", 10, 150, 50, 12, 2),
            w("Defense", 65, 150, 60, 12, 2),
        ]);
        let name = result.name_text.unwrap();
        assert_eq!(name, "Storm Caller");
        assert!(!lexicons.denylist.search(&name));
    }

    #[test]
    fn test_geometric_extractor_uses_engine_words() {
        let engine = ScriptedEngine::with_words(vec![
            w("Epic", 10, 0, 40, 12, 0),
            w("Merciless", 10, 20, 80, 14, 1),
            w("Greatsword", 95, 20, 90, 14, 1),
        ]);
        let lexicons = Lexicons::english();
        let config = LocatorConfig::default();
        let img = DynamicImage::ImageRgba8(RgbaImage::new(200, 100));

        let result = extract_fields(&img, ExtractionMode::Geometric, &engine, &lexicons, &config).unwrap();
        assert_eq!(result.name_text.as_deref(), Some("Merciless Greatsword"));
        assert_eq!(engine.calls.get(), 1);
    }

    #[test]
    fn test_text_extractor_keeps_raw_text() {
        let raw = "1,204\nAncient Runeblade\n\nCommon Sword\nCritical Hit Chance +4%\n";
        let engine = ScriptedEngine::with_text(raw);
        let lexicons = Lexicons::english();
        let config = LocatorConfig::default();
        let img = DynamicImage::ImageRgba8(RgbaImage::new(10, 10));

        let result = extract_fields(&img, ExtractionMode::Text, &engine, &lexicons, &config).unwrap();
        assert_eq!(result.name_text.as_deref(), Some("Ancient Runeblade"));
        assert_eq!(result.trait_text.as_deref(), Some("Critical Hit Chance +4%"));
        assert_eq!(result.name_box, None);
        assert_eq!(result.raw_text.as_deref(), Some(raw));
    }

    #[test]
    fn test_engine_failure_propagates() {
        let engine = ScriptedEngine::failing();
        let lexicons = Lexicons::english();
        let config = LocatorConfig::default();
        let img = DynamicImage::ImageRgba8(RgbaImage::new(10, 10));

        for mode in [ExtractionMode::Geometric, ExtractionMode::Text] {
            assert!(extract_fields(&img, mode, &engine, &lexicons, &config).is_err());
        }
    }

    #[test]
    fn test_mode_deserializes() {
        let mode: ExtractionMode = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(mode, ExtractionMode::Text);
        let config: LocatorConfig = serde_json::from_str(r#"{"name_window_height": 220}"#).unwrap();
        assert_eq!(config.name_window_height, 220);
        assert_eq!(config.min_alpha_chars, 6);
    }
}
