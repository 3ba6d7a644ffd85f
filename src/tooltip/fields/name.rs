//! Item-name stages, strongest anchor first.
//!
//! No single anchor is always visible: rarity and type wording depends on the
//! item category and locale. Each stage falls back to a weaker but still
//! geometry-grounded cue, and the last one always answers.

use super::stages::{is_name_like, line_score, Cascade, FieldStage, StageContext};
use super::FieldMatch;
use crate::tooltip::words::{alpha_count, group_lines, Line, Word, WordIndex};

/// Builds the name cascade: dual anchor, then lower anchor, then top line.
pub fn name_cascade() -> Cascade {
    Cascade::new("name")
        .with_stage(DualAnchorStage)
        .with_stage(LowerAnchorStage)
        .with_stage(TopLineStage)
}

/// Best line under a rarity word and a type word.
///
/// The window starts just below whichever anchor ends higher and spans
/// `name_window_height` pixels.
pub struct DualAnchorStage;

impl FieldStage for DualAnchorStage {
    fn name(&self) -> &'static str {
        "dual-anchor"
    }

    fn attempt(&self, index: &WordIndex, ctx: &StageContext) -> Option<FieldMatch> {
        let lex = ctx.lexicons;
        let words = index.words();

        let center_x = (ctx.image_width / 2) as i32;
        let rarity = words
            .iter()
            .filter(|w| lex.rarity.search(&w.text))
            .min_by_key(|w| (w.center_x() - center_x).abs())?;
        let item_type = words
            .iter()
            .filter(|w| lex.item_type.search(&w.text))
            .min_by_key(|w| (w.y - rarity.y).abs() + (w.x - rarity.x).abs())?;

        let top = rarity.bottom().min(item_type.bottom()) + ctx.config.anchor_gap;
        let bottom = top + ctx.config.name_window_height;

        let in_window = words.iter().filter(|w| {
            let yc = w.center_y();
            (top..=bottom).contains(&yc) && w.has_alpha()
        });

        best_line(group_lines(in_window), ctx, |_, _| true)
    }
}

/// Best line above the topmost stat-section word.
pub struct LowerAnchorStage;

impl FieldStage for LowerAnchorStage {
    fn name(&self) -> &'static str {
        "lower-anchor"
    }

    fn attempt(&self, index: &WordIndex, ctx: &StageContext) -> Option<FieldMatch> {
        let anchor_y = index
            .words()
            .iter()
            .filter(|w| ctx.lexicons.stat_anchor.search(&w.text))
            .map(|w| w.y)
            .min()? as f32;
        let window = ctx.config.lower_window_height as f32;
        let min_chars = ctx.config.min_alpha_chars;

        best_line(index.lines(), ctx, |line, text| {
            let yc = line.center_y();
            yc < anchor_y
                && anchor_y - yc <= window
                && alpha_count(text) >= min_chars
                && !ctx.lexicons.lower_denylist.search(text)
        })
    }
}

/// The topmost line containing letters, taken unconditionally.
///
/// Words are grouped by vertical tolerance instead of the engine's line ids.
pub struct TopLineStage;

impl FieldStage for TopLineStage {
    fn name(&self) -> &'static str {
        "top-line"
    }

    fn attempt(&self, index: &WordIndex, ctx: &StageContext) -> Option<FieldMatch> {
        let alpha: Vec<&Word> = index.words().iter().filter(|w| w.has_alpha()).collect();
        let top = alpha.iter().map(|w| w.y).min()?;
        let tolerance = ctx.config.top_line_tolerance;

        // The topmost word always belongs, even with a zero tolerance
        let members: Vec<&Word> = alpha
            .into_iter()
            .filter(|w| w.y == top || (w.y - top).abs() < tolerance + w.h / 2)
            .collect();
        let line_id = members.first()?.line_id;
        let line = Line::new(line_id, members);

        Some(FieldMatch {
            text: line.text(),
            bounds: line.bounds(),
        })
    }
}

/// Highest-scoring name-like line among `lines`; the first one wins ties.
///
/// `accept` applies stage-specific checks on top of the shared filter.
fn best_line<'a, F>(lines: Vec<Line<'a>>, ctx: &StageContext, accept: F) -> Option<FieldMatch>
where
    F: Fn(&Line<'a>, &str) -> bool,
{
    let mut best: Option<(i32, Line<'a>, String)> = None;

    for line in lines {
        let text = line.text();
        if !accept(&line, &text) {
            continue;
        }
        let alpha_words = line.alpha_words();
        if !is_name_like(&text, &alpha_words, ctx) {
            continue;
        }
        let score = line_score(&alpha_words, ctx.config.height_weight);
        if best.as_ref().is_none_or(|(s, _, _)| score > *s) {
            best = Some((score, line, text));
        }
    }

    best.map(|(_, line, text)| FieldMatch {
        text,
        bounds: line.bounds(),
    })
}
