//! Trait line lookup below its section label.

use super::stages::{Cascade, FieldStage, StageContext};
use super::FieldMatch;
use crate::tooltip::words::WordIndex;

/// Builds the trait cascade. There is a single stage: a trait without its
/// label cannot be told apart from ordinary body text.
pub fn trait_cascade() -> Cascade {
    Cascade::new("trait").with_stage(SectionLabelStage)
}

/// The nearest line within `trait_lookahead` lines after the first label word.
pub struct SectionLabelStage;

impl FieldStage for SectionLabelStage {
    fn name(&self) -> &'static str {
        "section-label"
    }

    fn attempt(&self, index: &WordIndex, ctx: &StageContext) -> Option<FieldMatch> {
        let label = index
            .words()
            .iter()
            .find(|w| ctx.lexicons.section_label.matches_token(&w.text))?;

        let first = label.line_id + 1;
        let last = label.line_id + ctx.config.trait_lookahead;
        let line_id = index
            .words()
            .iter()
            .map(|w| w.line_id)
            .filter(|id| (first..=last).contains(id))
            .min()?;

        let line = index.line(line_id)?;
        Some(FieldMatch {
            text: line.text(),
            bounds: line.bounds(),
        })
    }
}
