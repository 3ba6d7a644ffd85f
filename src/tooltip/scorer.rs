//! Filtering and ranking of tooltip candidates.
//!
//! A candidate must first pass two hard filters (side of the pointer, area
//! ratio). Survivors are scored with [`score_candidate`], a convex combination
//! of an anchor prior, a proximity prior and an aspect prior, scaled down when
//! the crop holds little text.

use anyhow::{Context, Result};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::candidates::propose_candidates;
use super::geometry::PixelRect;
use super::lexicon::Lexicons;
use crate::log;
use crate::ocr::engine::OcrEngine;
use crate::ocr::preprocess::{crop_rect, upscale};

/// A proposed tooltip rectangle with its score.
///
/// Scores are only comparable between candidates of the same screenshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RegionCandidate {
    pub bounds: PixelRect,
    pub area: i64,
    /// width / height
    pub aspect: f32,
    pub score: f32,
}

/// Which side of the pointer the tooltip is rendered on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipSide {
    #[default]
    Left,
    Right,
}

/// Weights of the three priors. They should sum to 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub anchor: f32,
    pub proximity: f32,
    pub aspect: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            anchor: 0.45,
            proximity: 0.30,
            aspect: 0.25,
        }
    }
}

/// Tunable thresholds of the candidate filters and priors.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Accepted range of candidate area / image area
    pub min_area_ratio: f32,
    pub max_area_ratio: f32,
    /// Preferred width / height band; outside it the aspect prior is `aspect_penalty`
    pub aspect_min: f32,
    pub aspect_max: f32,
    pub aspect_penalty: f32,
    pub side: TooltipSide,
    /// Pixels kept free between the pointer and the tooltip edge
    pub pointer_margin: i32,
    /// Crop scale factor before OCR
    pub upscale: f32,
    /// Fewer recognized words than this multiplies the score by `text_penalty`
    pub min_words: usize,
    pub text_penalty: f32,
    /// Added to the anchor prior per anchor vocabulary found
    pub anchor_bonus: f32,
    /// Distance (px) at which the proximity prior drops to one half
    pub proximity_scale: f32,
    pub weights: ScoreWeights,
    /// Upper bound on OCR calls per screenshot; the largest survivors are kept
    pub max_scored_candidates: usize,
    /// How many of the best candidates to keep for diagnostics
    pub diagnostic_top_k: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_area_ratio: 0.015,
            max_area_ratio: 0.95,
            aspect_min: 0.45,
            aspect_max: 1.80,
            aspect_penalty: 0.6,
            side: TooltipSide::Left,
            pointer_margin: 6,
            upscale: 1.5,
            min_words: 6,
            text_penalty: 0.6,
            anchor_bonus: 0.6,
            proximity_scale: 120.0,
            weights: ScoreWeights::default(),
            max_scored_candidates: 32,
            diagnostic_top_k: 3,
        }
    }
}

/// The per-candidate inputs of [`score_candidate`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Priors {
    pub anchor: f32,
    pub proximity: f32,
    pub aspect: f32,
    /// 1.0 when enough text was recognized, `text_penalty` otherwise
    pub text_factor: f32,
}

/// `text_factor * (w.anchor * anchor + w.proximity * proximity + w.aspect * aspect)`
pub fn score_candidate(priors: &Priors, weights: &ScoreWeights) -> f32 {
    priors.text_factor
        * (weights.anchor * priors.anchor
            + weights.proximity * priors.proximity
            + weights.aspect * priors.aspect)
}

/// What OCR found inside one crop.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct ContentSummary {
    word_count: usize,
    has_rarity: bool,
    has_label: bool,
}

/// Finds the tooltip rectangle in a screenshot.
pub struct TooltipLocator<'a> {
    engine: &'a dyn OcrEngine,
    lexicons: &'a Lexicons,
    config: &'a DetectorConfig,
}

impl<'a> TooltipLocator<'a> {
    pub fn new(engine: &'a dyn OcrEngine, lexicons: &'a Lexicons, config: &'a DetectorConfig) -> Self {
        Self {
            engine,
            lexicons,
            config,
        }
    }

    /// Proposes candidates and returns the survivors, best first.
    pub fn rank(&self, img: &DynamicImage, reference: (i32, i32)) -> Result<Vec<RegionCandidate>> {
        let proposals = propose_candidates(img);
        log(&format!("Tooltip detection: {} contour candidates", proposals.len()));
        self.rank_candidates(img, reference, &proposals)
    }

    /// Filters and scores the given rectangles, best first.
    ///
    /// Ties keep proposal order. OCR failures are returned as errors.
    pub fn rank_candidates(
        &self,
        img: &DynamicImage,
        reference: (i32, i32),
        proposals: &[PixelRect],
    ) -> Result<Vec<RegionCandidate>> {
        let image_area = img.width() as f64 * img.height() as f64;

        let mut survivors: Vec<(usize, PixelRect)> = proposals
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, r)| r.is_valid())
            .filter(|(_, r)| self.on_allowed_side(r, reference))
            .filter(|(_, r)| self.area_ratio_ok(r, image_area))
            .collect();

        if survivors.len() > self.config.max_scored_candidates {
            log(&format!(
                "Tooltip detection: {} survivors, scoring the {} largest",
                survivors.len(),
                self.config.max_scored_candidates
            ));
            survivors.sort_by(|a, b| b.1.area().cmp(&a.1.area()).then(a.0.cmp(&b.0)));
            survivors.truncate(self.config.max_scored_candidates);
            survivors.sort_by_key(|(i, _)| *i);
        }

        // Several contours can share one bounding box; OCR each box once
        let mut cache: HashMap<PixelRect, ContentSummary> = HashMap::new();
        let mut ranked = Vec::with_capacity(survivors.len());

        for (_, rect) in survivors {
            let content = match cache.get(&rect) {
                Some(summary) => *summary,
                None => {
                    let summary = self.read_content(img, &rect)?;
                    cache.insert(rect, summary);
                    summary
                }
            };

            let aspect = rect.width() as f32 / (rect.height() as f32 + 1e-6);
            let priors = self.priors(&rect, reference, aspect, &content);
            ranked.push(RegionCandidate {
                bounds: rect,
                area: rect.area(),
                aspect,
                score: score_candidate(&priors, &self.config.weights),
            });
        }

        // Stable: equal scores keep proposal order
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        if let Some(best) = ranked.first() {
            log(&format!(
                "Tooltip detection: best {:?} score={:.3} aspect={:.2} ({} scored)",
                best.bounds,
                best.score,
                best.aspect,
                ranked.len()
            ));
        } else {
            log("Tooltip detection: no candidate survived filtering");
        }

        Ok(ranked)
    }

    /// The x coordinate the tooltip edge must not cross.
    fn boundary_x(&self, reference: (i32, i32)) -> i32 {
        match self.config.side {
            TooltipSide::Left => reference.0 - self.config.pointer_margin,
            TooltipSide::Right => reference.0 + self.config.pointer_margin,
        }
    }

    fn on_allowed_side(&self, rect: &PixelRect, reference: (i32, i32)) -> bool {
        let boundary = self.boundary_x(reference);
        match self.config.side {
            TooltipSide::Left => rect.x2 <= boundary,
            TooltipSide::Right => rect.x1 >= boundary,
        }
    }

    fn area_ratio_ok(&self, rect: &PixelRect, image_area: f64) -> bool {
        let ratio = rect.area() as f64 / (image_area + 1e-6);
        ratio >= self.config.min_area_ratio as f64 && ratio <= self.config.max_area_ratio as f64
    }

    fn priors(
        &self,
        rect: &PixelRect,
        reference: (i32, i32),
        aspect: f32,
        content: &ContentSummary,
    ) -> Priors {
        let cfg = self.config;

        let aspect_prior = if (cfg.aspect_min..=cfg.aspect_max).contains(&aspect) {
            1.0
        } else {
            cfg.aspect_penalty
        };

        let mut anchor = 0.0;
        if content.has_rarity {
            anchor += cfg.anchor_bonus;
        }
        if content.has_label {
            anchor += cfg.anchor_bonus;
        }

        let facing_edge = match cfg.side {
            TooltipSide::Left => rect.x2,
            TooltipSide::Right => rect.x1,
        };
        let distance = (facing_edge - self.boundary_x(reference)).abs() as f32;
        let proximity = 1.0 / (1.0 + distance / cfg.proximity_scale.max(f32::EPSILON));

        let text_factor = if content.word_count >= cfg.min_words {
            1.0
        } else {
            cfg.text_penalty
        };

        Priors {
            anchor,
            proximity,
            aspect: aspect_prior,
            text_factor,
        }
    }

    fn read_content(&self, img: &DynamicImage, rect: &PixelRect) -> Result<ContentSummary> {
        let crop = upscale(&crop_rect(img, rect), self.config.upscale);
        let words = self
            .engine
            .recognize_words(&crop)
            .with_context(|| format!("OCR of candidate {:?} failed", rect))?;

        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(ContentSummary {
            word_count: words.len(),
            has_rarity: self.lexicons.rarity.search(&text),
            has_label: self.lexicons.section_label.search(&text),
        })
    }
}
