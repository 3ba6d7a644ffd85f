//! The uniform stage contract and the cascade that runs stages in order.

use regex::Regex;
use std::sync::OnceLock;

use super::{FieldMatch, LocatorConfig};
use crate::log;
use crate::tooltip::lexicon::Lexicons;
use crate::tooltip::words::{Word, WordIndex};

/// Everything a stage may consult besides the words themselves.
pub struct StageContext<'a> {
    pub image_width: u32,
    pub lexicons: &'a Lexicons,
    pub config: &'a LocatorConfig,
}

/// One heuristic for locating a field. `None` means the stage found nothing.
pub trait FieldStage {
    fn name(&self) -> &'static str;
    fn attempt(&self, index: &WordIndex, ctx: &StageContext) -> Option<FieldMatch>;
}

/// Stages tried in order until one succeeds.
pub struct Cascade {
    field: &'static str,
    stages: Vec<Box<dyn FieldStage>>,
}

impl Cascade {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            stages: Vec::new(),
        }
    }

    pub fn with_stage(mut self, stage: impl FieldStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    #[cfg(test)]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Returns the first stage result, or `None` when every stage came up empty.
    pub fn run(&self, index: &WordIndex, ctx: &StageContext) -> Option<FieldMatch> {
        for stage in &self.stages {
            if let Some(found) = stage.attempt(index, ctx) {
                log(&format!(
                    "{}: '{}' via {} at {:?}",
                    self.field,
                    found.text,
                    stage.name(),
                    found.bounds
                ));
                return Some(found);
            }
        }
        log(&format!("{}: no stage produced a match", self.field));
        None
    }
}

/// True when the text consists only of digits, whitespace and symbols.
pub fn is_symbolic(text: &str) -> bool {
    static SYMBOLIC: OnceLock<Regex> = OnceLock::new();
    SYMBOLIC
        .get_or_init(|| Regex::new(r"^[\s\W\d]+$").expect("valid symbolic pattern"))
        .is_match(text)
}

/// Line filter shared by the anchored name stages.
///
/// Rejects denylisted lines, lines made of digits/symbols and lines with too few
/// alphabetic words.
pub fn is_name_like(text: &str, alpha_words: &[&Word], ctx: &StageContext) -> bool {
    !ctx.lexicons.denylist.search(text)
        && !is_symbolic(text)
        && alpha_words.len() >= ctx.config.min_alpha_words
}

/// Favors wide lines with tall letters: total alpha-word width plus a weighted max height.
pub fn line_score(alpha_words: &[&Word], height_weight: i32) -> i32 {
    let total_width: i32 = alpha_words.iter().map(|w| w.w).sum();
    let max_height = alpha_words.iter().map(|w| w.h).max().unwrap_or(0);
    total_width + height_weight * max_height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tooltip::geometry::PixelRect;

    struct Fixed(Option<&'static str>);

    impl FieldStage for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn attempt(&self, _index: &WordIndex, _ctx: &StageContext) -> Option<FieldMatch> {
            self.0.map(|t| FieldMatch {
                text: t.to_string(),
                bounds: PixelRect::new(0, 0, 1, 1),
            })
        }
    }

    #[test]
    fn test_cascade_stops_at_first_success() {
        let lexicons = Lexicons::english();
        let config = LocatorConfig::default();
        let ctx = StageContext {
            image_width: 100,
            lexicons: &lexicons,
            config: &config,
        };

        let cascade = Cascade::new("name")
            .with_stage(Fixed(None))
            .with_stage(Fixed(Some("second")))
            .with_stage(Fixed(Some("third")));

        let found = cascade.run(&WordIndex::default(), &ctx).unwrap();
        assert_eq!(found.text, "second");

        let empty = Cascade::new("name").with_stage(Fixed(None));
        assert!(empty.run(&WordIndex::default(), &ctx).is_none());
    }

    #[test]
    fn test_is_symbolic() {
        assert!(is_symbolic("1,204"));
        assert!(is_symbolic("+12.5% -"));
        assert!(!is_symbolic("Lv 12"));
        assert!(!is_symbolic("Épée"));
    }

    #[test]
    fn test_line_score() {
        let a = Word::new("Merciless", 10, 20, 80, 14).unwrap();
        let b = Word::new("Greatsword", 95, 20, 90, 16).unwrap();
        assert_eq!(line_score(&[&a, &b], 3), 80 + 90 + 3 * 16);
        assert_eq!(line_score(&[], 3), 0);
    }
}
