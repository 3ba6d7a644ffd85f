//! Recognized words and the line grouping built over them.
//!
//! A [`WordIndex`] is built once per OCR pass. Lines are never stored; they are
//! grouped on demand from the words' `line_id`.

use super::geometry::PixelRect;

/// One recognized token with its box in region-local pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Word {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    /// Engine confidence, -1 when the engine did not report one
    pub confidence: i32,
    pub line_id: i32,
    pub block_id: i32,
}

impl Word {
    /// Creates a word, or `None` when the trimmed text is empty or the box is degenerate.
    pub fn new(text: &str, x: i32, y: i32, w: i32, h: i32) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() || w <= 0 || h <= 0 {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            x,
            y,
            w,
            h,
            confidence: -1,
            line_id: 0,
            block_id: 0,
        })
    }

    pub fn with_line(mut self, line_id: i32) -> Self {
        self.line_id = line_id;
        self
    }

    pub fn with_block(mut self, block_id: i32) -> Self {
        self.block_id = block_id;
        self
    }

    pub fn with_confidence(mut self, confidence: i32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::from_xywh(self.x, self.y, self.w, self.h)
    }

    pub fn center_x(&self) -> i32 {
        self.x + self.w / 2
    }

    pub fn center_y(&self) -> i32 {
        self.y + self.h / 2
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// True when the text contains at least one alphabetic character.
    pub fn has_alpha(&self) -> bool {
        has_alpha(&self.text)
    }
}

/// True when `text` contains at least one alphabetic character.
///
/// Uses Unicode `char::is_alphabetic`, so accented and non-Latin letters count,
/// including the ones OCR sometimes produces from noise.
pub fn has_alpha(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
}

/// Counts alphabetic characters in `text`, with the same Unicode rule as [`has_alpha`].
pub fn alpha_count(text: &str) -> usize {
    text.chars().filter(|c| c.is_alphabetic()).count()
}

/// All words recognized in one image, in engine order.
#[derive(Clone, Debug, Default)]
pub struct WordIndex {
    words: Vec<Word>,
}

impl WordIndex {
    pub fn new(words: Vec<Word>) -> Self {
        Self { words }
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of distinct blocks and the mean of the reported confidences.
    ///
    /// Words with confidence -1 are left out of the mean; `None` when no word has one.
    pub fn summary(&self) -> (usize, Option<i32>) {
        let mut blocks: Vec<i32> = self.words.iter().map(|w| w.block_id).collect();
        blocks.sort_unstable();
        blocks.dedup();

        let reported: Vec<i32> = self
            .words
            .iter()
            .map(|w| w.confidence)
            .filter(|&c| c >= 0)
            .collect();
        let mean = (!reported.is_empty()).then(|| reported.iter().sum::<i32>() / reported.len() as i32);

        (blocks.len(), mean)
    }

    /// Groups every word into lines, in order of each line's first word.
    pub fn lines(&self) -> Vec<Line<'_>> {
        group_lines(self.words.iter())
    }

    /// The words of one line, left-to-right, or `None` when no word carries `line_id`.
    pub fn line(&self, line_id: i32) -> Option<Line<'_>> {
        let words: Vec<&Word> = self.words.iter().filter(|w| w.line_id == line_id).collect();
        if words.is_empty() {
            None
        } else {
            Some(Line::new(line_id, words))
        }
    }
}

impl FromIterator<Word> for WordIndex {
    fn from_iter<I: IntoIterator<Item = Word>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Groups an arbitrary subset of words by `line_id`.
///
/// Lines come out in order of their first word; words inside each line are sorted by `x`.
pub fn group_lines<'a, I>(words: I) -> Vec<Line<'a>>
where
    I: IntoIterator<Item = &'a Word>,
{
    let mut groups: Vec<(i32, Vec<&'a Word>)> = Vec::new();
    for word in words {
        match groups.iter_mut().find(|(id, _)| *id == word.line_id) {
            Some((_, members)) => members.push(word),
            None => groups.push((word.line_id, vec![word])),
        }
    }
    groups
        .into_iter()
        .map(|(id, members)| Line::new(id, members))
        .collect()
}

/// A view over the words sharing one `line_id`, ordered left-to-right.
#[derive(Clone, Debug)]
pub struct Line<'a> {
    pub line_id: i32,
    words: Vec<&'a Word>,
}

impl<'a> Line<'a> {
    /// Creates a line; `words` must be non-empty.
    pub fn new(line_id: i32, mut words: Vec<&'a Word>) -> Self {
        words.sort_by_key(|w| w.x);
        Self { line_id, words }
    }

    /// Space-joined word texts.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Union of the member word boxes.
    pub fn bounds(&self) -> PixelRect {
        PixelRect::union_all(self.words.iter().map(|w| w.bounds())).unwrap_or(PixelRect::new(0, 0, 0, 0))
    }

    /// Words containing at least one alphabetic character.
    pub fn alpha_words(&self) -> Vec<&'a Word> {
        self.words.iter().copied().filter(|w| w.has_alpha()).collect()
    }

    /// Vertical centre of the line box.
    pub fn center_y(&self) -> f32 {
        let b = self.bounds();
        (b.y1 + b.y2) as f32 / 2.0
    }
}
