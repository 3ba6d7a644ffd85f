//! Tooltip localization and field extraction.

pub mod candidates;
pub mod fields;
pub mod geometry;
pub mod lexicon;
pub mod scorer;
pub mod words;

pub use fields::{ExtractionMode, LocatorConfig};
pub use lexicon::LexiconsConfig;
pub use scorer::DetectorConfig;
