//! Application configuration.
//!
//! Loaded once from config.json next to the executable. Every field has a
//! default, so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::capture::CaptureConfig;
use crate::ocr::PreprocessMode;
use crate::pipeline::PipelineOptions;
use crate::tooltip::{DetectorConfig, ExtractionMode, LexiconsConfig, LocatorConfig};

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<AppConfig> = OnceLock::new();

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Tesseract language code, e.g. "eng"
    pub language: String,
    /// Tesseract page segmentation mode
    pub ocr_psm: u32,
    pub ocr_preprocess: PreprocessMode,
    pub extraction: ExtractionMode,
    /// Look for the tooltip rectangle instead of reading the whole capture
    pub use_region_detection: bool,
    /// Write scratch images to the cache directory
    pub save_diagnostics: bool,
    pub capture: CaptureConfig,
    pub detector: DetectorConfig,
    pub locator: LocatorConfig,
    pub lexicons: LexiconsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            ocr_psm: 6,
            ocr_preprocess: PreprocessMode::None,
            extraction: ExtractionMode::Geometric,
            use_region_detection: true,
            save_diagnostics: true,
            capture: CaptureConfig::default(),
            detector: DetectorConfig::default(),
            locator: LocatorConfig::default(),
            lexicons: LexiconsConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            use_region_detection: self.use_region_detection,
            preprocess: self.ocr_preprocess,
            extraction: self.extraction,
        }
    }
}

/// Reads `path`, falling back to defaults when it is missing or invalid.
pub fn load_config_from(path: &Path) -> AppConfig {
    crate::log(&format!("Looking for config at: {}", path.display()));

    if !path.exists() {
        crate::log("config.json not found. Using default config.");
        return AppConfig::default();
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => {
                crate::log("Config loaded from config.json");
                config
            }
            Err(e) => {
                crate::log(&format!("Failed to parse config.json: {}. Using defaults.", e));
                AppConfig::default()
            }
        },
        Err(e) => {
            crate::log(&format!("Failed to read config.json: {}. Using defaults.", e));
            AppConfig::default()
        }
    }
}

fn load_config() -> AppConfig {
    load_config_from(&crate::paths::get_exe_dir().join("config.json"))
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config() {
    let _ = CONFIG.set(load_config());
}

/// Returns a reference to the global configuration.
/// Panics if called before init_config().
pub fn get_config() -> &'static AppConfig {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tooltip::scorer::TooltipSide;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.json"));
        assert_eq!(config.language, "eng");
        assert_eq!(config.ocr_psm, 6);
        assert!(config.use_region_detection);
    }

    #[test]
    fn test_invalid_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config_from(&path).ocr_psm, 6);
    }

    #[test]
    fn test_partial_file_overrides_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "language": "spa",
                "ocr_preprocess": "binary-threshold",
                "extraction": "text",
                "detector": { "side": "right", "max_scored_candidates": 8 },
                "lexicons": { "section_label": { "terms": ["rasgo"] } }
            }"#,
        )
        .unwrap();

        let config = load_config_from(&path);
        assert_eq!(config.language, "spa");
        assert_eq!(config.ocr_preprocess, PreprocessMode::Binary);
        assert_eq!(config.extraction, ExtractionMode::Text);
        assert_eq!(config.detector.side, TooltipSide::Right);
        assert_eq!(config.detector.max_scored_candidates, 8);
        assert_eq!(config.detector.min_area_ratio, 0.015);
        assert_eq!(config.lexicons.section_label.terms, vec!["rasgo"]);
        assert!(config.lexicons.section_label.whole_words);
        assert_eq!(config.capture, CaptureConfig::default());

        let options = config.pipeline_options();
        assert_eq!(options.extraction, ExtractionMode::Text);
    }
}
