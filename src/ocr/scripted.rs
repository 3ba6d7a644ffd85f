//! In-memory OCR engine for tests.

use anyhow::{anyhow, Result};
use image::DynamicImage;
use std::cell::Cell;

use super::engine::OcrEngine;
use crate::tooltip::words::Word;

/// Returns the same words and text for every image and counts its calls.
pub struct ScriptedEngine {
    pub words: Vec<Word>,
    pub text: String,
    pub fail: bool,
    pub calls: Cell<usize>,
}

impl ScriptedEngine {
    pub fn with_words(words: Vec<Word>) -> Self {
        Self {
            words,
            text: String::new(),
            fail: false,
            calls: Cell::new(0),
        }
    }

    pub fn with_text(text: &str) -> Self {
        Self {
            words: Vec::new(),
            text: text.to_string(),
            fail: false,
            calls: Cell::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            words: Vec::new(),
            text: String::new(),
            fail: true,
            calls: Cell::new(0),
        }
    }
}

impl OcrEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn recognize_words(&self, _img: &DynamicImage) -> Result<Vec<Word>> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(anyhow!("eng.traineddata not found"));
        }
        Ok(self.words.clone())
    }

    fn recognize_text(&self, _img: &DynamicImage) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(anyhow!("eng.traineddata not found"));
        }
        Ok(self.text.clone())
    }
}
