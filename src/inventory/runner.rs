//! Capture cycles: grab the screen around the pointer, extract, record.

use anyhow::{Context, Result};
use chrono::Local;
use image::DynamicImage;
use std::path::{Path, PathBuf};

use super::config::AppConfig;
use super::csv_writer::{append_row, InventoryRow};
use crate::capture::{pointer_roi, to_local, FrameSource, PointerSource};
use crate::diagnostics::Diagnostics;
use crate::log;
use crate::ocr::engine::{OcrEngine, TesseractEngine};
use crate::ocr::preprocess::crop_rect;
use crate::paths;
use crate::pipeline::{Pipeline, PipelineOutput};
use crate::tooltip::geometry::PixelRect;
use crate::tooltip::lexicon::Lexicons;

/// Where a cycle writes its files.
#[cfg_attr(not(windows), allow(dead_code))]
#[derive(Clone, Debug)]
pub struct OutputPaths {
    pub snaps_dir: PathBuf,
    pub inventory_csv: PathBuf,
    pub diagnostics: Diagnostics,
}

impl OutputPaths {
    /// The standard layout under the executable directory.
    #[cfg_attr(not(windows), allow(dead_code))]
    pub fn standard(config: &AppConfig) -> Self {
        let diagnostics = if config.save_diagnostics {
            Diagnostics::in_dir(paths::get_cache_dir())
        } else {
            Diagnostics::disabled()
        };
        Self {
            snaps_dir: paths::get_snaps_dir(),
            inventory_csv: paths::get_inventory_csv(),
            diagnostics,
        }
    }
}

/// Builds the Tesseract engine described by `config`.
pub fn engine_from_config(config: &AppConfig) -> TesseractEngine {
    TesseractEngine::new(&config.language, config.ocr_psm)
}

/// Runs the pipeline over a captured image with the configured settings.
pub fn run_pipeline(
    img: &DynamicImage,
    reference: (i32, i32),
    config: &AppConfig,
    engine: &dyn OcrEngine,
    diagnostics: Diagnostics,
) -> Result<PipelineOutput> {
    let lexicons = Lexicons::compile(&config.lexicons).context("Invalid lexicons in config")?;
    let pipeline = Pipeline::new(
        engine,
        &lexicons,
        &config.detector,
        &config.locator,
        config.pipeline_options(),
        diagnostics,
    );
    pipeline.run(img, reference)
}

/// One hotkey cycle.
///
/// Snapshots the full screen into `snaps_dir`, runs the pipeline on the area
/// around the pointer and appends the result to the inventory CSV.
#[cfg_attr(not(windows), allow(dead_code))]
pub fn run_once(
    frames: &dyn FrameSource,
    pointer: &dyn PointerSource,
    config: &AppConfig,
    engine: &dyn OcrEngine,
    out: &OutputPaths,
) -> Result<PipelineOutput> {
    let position = pointer.position().context("Failed to read pointer position")?;
    let (sw, sh) = frames.screen_size()?;
    log(&format!("Pointer at {:?} on {}x{} screen", position, sw, sh));

    let screen = frames
        .capture(&PixelRect::new(0, 0, sw as i32, sh as i32))
        .context("Screen capture failed")?;
    let snapshot = save_snapshot(&screen, &out.snaps_dir)?;

    let roi = pointer_roi(position, (sw, sh), &config.capture);
    log(&format!("Capture ROI {:?}", roi));
    let roi_img = crop_rect(&screen, &roi);

    let output = run_pipeline(
        &roi_img,
        to_local(position, &roi),
        config,
        engine,
        out.diagnostics.clone(),
    )?;

    let row = InventoryRow::sighting(
        output.fields.name_text.as_deref(),
        output.fields.trait_text.as_deref(),
        Some(snapshot),
    );
    append_row(&out.inventory_csv, &row)?;
    log(&format!("Inventory row appended to {}", out.inventory_csv.display()));

    Ok(output)
}

/// Runs the pipeline over an image file.
///
/// Without a reference point the pointer is assumed at the right edge, halfway
/// down, where a left-opening tooltip would leave it.
pub fn process_image_file(
    path: &Path,
    reference: Option<(i32, i32)>,
    config: &AppConfig,
    engine: &dyn OcrEngine,
    diagnostics: Diagnostics,
) -> Result<PipelineOutput> {
    let img = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reference = reference.unwrap_or_else(|| default_reference(&img));
    log(&format!(
        "Processing {} ({}x{}), reference {:?}",
        path.display(),
        img.width(),
        img.height(),
        reference
    ));
    run_pipeline(&img, reference, config, engine, diagnostics)
}

/// Right edge, vertical centre.
pub fn default_reference(img: &DynamicImage) -> (i32, i32) {
    (img.width() as i32, img.height() as i32 / 2)
}

fn save_snapshot(img: &DynamicImage, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let name = format!("tooltip_{}.png", Local::now().format("%Y%m%d_%H%M%S"));
    let path = dir.join(name);
    img.save(&path)
        .with_context(|| format!("Failed to save snapshot {}", path.display()))?;
    log(&format!("Snapshot saved to {}", path.display()));
    Ok(path)
}
