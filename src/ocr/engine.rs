use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use std::path::Path;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::{find_tessdata_dir, find_tesseract_executable};
use crate::tooltip::words::Word;

/// An OCR backend able to report word geometry and plain text.
///
/// Failures mean the recognizer itself is unavailable (missing binary, missing
/// language data); callers propagate them instead of retrying.
pub trait OcrEngine {
    fn name(&self) -> &str;

    /// Recognizes every word in `img`, in reading order.
    fn recognize_words(&self, img: &DynamicImage) -> Result<Vec<Word>>;

    /// Recognizes `img` as plain text.
    fn recognize_text(&self, img: &DynamicImage) -> Result<String>;
}

/// Tesseract invoked as a subprocess.
#[derive(Clone, Debug)]
pub struct TesseractEngine {
    /// Traineddata language code, e.g. "eng" or "eng+spa"
    pub language: String,
    /// Page segmentation mode passed as `--psm`
    pub psm: u32,
}

impl TesseractEngine {
    pub fn new(language: &str, psm: u32) -> Self {
        Self {
            language: language.to_string(),
            psm,
        }
    }

    /// Runs Tesseract on `input`, writing to `output` ("stdout" or a base path).
    fn run(&self, input: &Path, output: &str, extra: &[&str]) -> Result<Vec<u8>> {
        let tesseract_exe = find_tesseract_executable()?;
        let tessdata_dir = find_tessdata_dir(&self.language)?;

        let result = Command::new(&tesseract_exe)
            .arg(input)
            .arg(output)
            .arg("--tessdata-dir")
            .arg(&tessdata_dir)
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.psm.to_string())
            .args(extra)
            .output()
            .with_context(|| format!("Failed to launch {}", tesseract_exe.display()))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        Ok(result.stdout)
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize_words(&self, img: &DynamicImage) -> Result<Vec<Word>> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("Failed to write OCR input image")?;

        // Tesseract appends .tsv to the output base
        let temp_output = NamedTempFile::new()?;
        let output_base = temp_output.path().to_string_lossy().to_string();

        self.run(temp_input.path(), &output_base, &["tsv"])?;

        let tsv_path = format!("{}.tsv", output_base);
        let tsv_content = std::fs::read_to_string(&tsv_path)
            .map_err(|e| anyhow!("Failed to read Tesseract output: {}", e))?;
        let _ = std::fs::remove_file(&tsv_path);

        Ok(parse_tsv_words(&tsv_content))
    }

    fn recognize_text(&self, img: &DynamicImage) -> Result<String> {
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("Failed to write OCR input image")?;

        let stdout = self.run(temp_input.path(), "stdout", &[])?;
        Ok(String::from_utf8_lossy(&stdout).to_string())
    }
}

/// Parses Tesseract TSV output into words.
///
/// Only level-5 (word) rows with non-empty text and a positive box are kept.
/// `line_id` numbers each distinct (block, paragraph, line) triple in reading
/// order, so ids stay unique when Tesseract reports several blocks.
pub fn parse_tsv_words(tsv: &str) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current_key: Option<(i32, i32, i32)> = None;
    let mut line_id: i32 = -1;

    for row in tsv.lines().skip(1) {
        // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
        //             left, top, width, height, conf, text
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        let level: i32 = fields[0].parse().unwrap_or(-1);
        if level != 5 {
            continue;
        }

        let parse = |s: &str| s.trim().parse::<i32>().unwrap_or(0);
        let block_num = parse(fields[2]);
        let par_num = parse(fields[3]);
        let line_num = parse(fields[4]);
        let (left, top, width, height) = (
            parse(fields[6]),
            parse(fields[7]),
            parse(fields[8]),
            parse(fields[9]),
        );
        let confidence = fields[10]
            .trim()
            .parse::<f32>()
            .map(|c| c as i32)
            .unwrap_or(-1);

        let Some(word) = Word::new(fields[11], left, top, width, height) else {
            continue;
        };

        let key = (block_num, par_num, line_num);
        if current_key != Some(key) {
            current_key = Some(key);
            line_id += 1;
        }

        words.push(
            word.with_line(line_id)
                .with_block(block_num)
                .with_confidence(confidence),
        );
    }

    words
}
