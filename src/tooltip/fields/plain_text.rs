//! Field lookup over raw recognized text, for when no word boxes are available.

use super::stages::is_symbolic;
use crate::tooltip::lexicon::Lexicon;
use crate::tooltip::words::has_alpha;

/// Trimmed, non-empty lines of `text`.
pub fn text_lines(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}

/// First line among the first `max_lines` that has a letter and is not just
/// digits and symbols. Falls back to the first line.
pub fn plain_name<'a>(lines: &[&'a str], max_lines: usize) -> Option<&'a str> {
    lines
        .iter()
        .take(max_lines)
        .find(|l| has_alpha(l) && !is_symbolic(l))
        .or_else(|| lines.first())
        .copied()
}

/// First line matching a trait hint, looking at lines `1..max_lines` before
/// the whole text.
pub fn plain_trait<'a>(lines: &[&'a str], hints: &Lexicon, max_lines: usize) -> Option<&'a str> {
    let head_end = max_lines.min(lines.len());
    let head = lines.get(1..head_end).unwrap_or(&[]);

    head.iter()
        .find(|l| hints.search(l))
        .or_else(|| lines.iter().find(|l| hints.search(l)))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tooltip::lexicon::Lexicons;

    #[test]
    fn test_text_lines_drops_blanks() {
        assert_eq!(text_lines("  A \n\n   \nB\r\n"), vec!["A", "B"]);
        assert!(text_lines("").is_empty());
    }

    #[test]
    fn test_name_skips_numeric_lines() {
        let lines = ["1,204", "+ 12 %", "Ancient Runeblade", "Sword"];
        assert_eq!(plain_name(&lines, 8), Some("Ancient Runeblade"));
    }

    #[test]
    fn test_name_falls_back_to_first_line() {
        let lines = ["1,204", "55"];
        assert_eq!(plain_name(&lines, 8), Some("1,204"));
        assert_eq!(plain_name(&[], 8), None);
    }

    #[test]
    fn test_name_only_scans_head() {
        let lines = ["1", "2", "3", "Late Name"];
        assert_eq!(plain_name(&lines, 3), Some("1"));
    }

    #[test]
    fn test_trait_prefers_head_then_any() {
        let lexicons = Lexicons::english();
        let hints = &lexicons.trait_hints;

        let lines = ["Stun Baton", "Plain words", "Stun Chance +5%"];
        assert_eq!(plain_trait(&lines, hints, 12), Some("Stun Chance +5%"));

        // Line 0 is only considered once the head has no match
        let lines = ["Critical Edge", "Plain words"];
        assert_eq!(plain_trait(&lines, hints, 12), Some("Critical Edge"));

        let mut lines = vec!["Name"; 12];
        lines.push("Cooldown Speed");
        assert_eq!(plain_trait(&lines, hints, 12), Some("Cooldown Speed"));

        assert_eq!(plain_trait(&["Name", "Nothing here"], hints, 12), None);
    }
}
