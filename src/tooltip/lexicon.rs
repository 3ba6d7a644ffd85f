//! Swappable vocabularies used as anchors and filters.
//!
//! Each vocabulary is a list of regex fragments loaded from configuration, so a
//! localized client only needs a different `config.json`.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Serialized form of one vocabulary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LexiconSpec {
    /// Regex fragments, matched case-insensitively
    pub terms: Vec<String>,
    /// Require word boundaries around each match
    #[serde(default = "default_whole_words")]
    pub whole_words: bool,
}

fn default_whole_words() -> bool {
    true
}

impl LexiconSpec {
    pub fn words(terms: &[&str]) -> Self {
        Self {
            terms: terms.iter().map(|t| t.to_string()).collect(),
            whole_words: true,
        }
    }

    pub fn substrings(terms: &[&str]) -> Self {
        Self {
            terms: terms.iter().map(|t| t.to_string()).collect(),
            whole_words: false,
        }
    }
}

/// A compiled vocabulary.
#[derive(Clone, Debug)]
pub struct Lexicon {
    search: Option<Regex>,
    token: Option<Regex>,
}

impl Lexicon {
    /// Compiles a vocabulary. An empty term list yields a lexicon that never matches.
    pub fn compile(spec: &LexiconSpec) -> Result<Self> {
        if spec.terms.is_empty() {
            return Ok(Self {
                search: None,
                token: None,
            });
        }

        let alternation = spec.terms.join("|");
        let search_pattern = if spec.whole_words {
            format!(r"(?i)\b(?:{})\b", alternation)
        } else {
            format!(r"(?i)(?:{})", alternation)
        };
        let token_pattern = format!(r"(?i)^(?:{})$", alternation);

        Ok(Self {
            search: Some(
                Regex::new(&search_pattern)
                    .with_context(|| format!("Invalid lexicon pattern: {}", search_pattern))?,
            ),
            token: Some(
                Regex::new(&token_pattern)
                    .with_context(|| format!("Invalid lexicon pattern: {}", token_pattern))?,
            ),
        })
    }

    /// True when any term occurs inside `text`.
    pub fn search(&self, text: &str) -> bool {
        self.search.as_ref().is_some_and(|re| re.is_match(text))
    }

    /// True when the whole of `text` is one term.
    pub fn matches_token(&self, text: &str) -> bool {
        self.token.as_ref().is_some_and(|re| re.is_match(text))
    }
}

/// Serialized vocabulary set, part of the application config.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconsConfig {
    /// Item rarity words ("Epic", "Heroic", ...)
    pub rarity: LexiconSpec,
    /// Item type nouns ("Greatsword", "Gloves", ...)
    pub item_type: LexiconSpec,
    /// Section label that introduces the trait line
    pub section_label: LexiconSpec,
    /// Stat-section words sitting below the item name
    pub stat_anchor: LexiconSpec,
    /// Phrases that can never be the item name
    pub denylist: LexiconSpec,
    /// Further phrases rejected only when searching above the stat section
    pub lower_denylist: LexiconSpec,
    /// Keywords identifying a trait line in plain-text OCR output
    pub trait_hints: LexiconSpec,
}

impl Default for LexiconsConfig {
    fn default() -> Self {
        Self {
            rarity: LexiconSpec::words(&["epic", "heroic", "legendary", "rare", "common"]),
            item_type: LexiconSpec::words(&[
                "gloves", "headgear", "chest", "greatsword", "sword", "daggers", "crossbow",
                "longbow", "staff", "wand", "spear", "legs", "shoes", "cloak", "belt",
                "necklace", "ring", "bracelet",
            ]),
            section_label: LexiconSpec::words(&["trait"]),
            stat_anchor: LexiconSpec::words(&[
                "defense", "damage", "melee", "range", "magic", "extraction",
            ]),
            denylist: LexiconSpec::words(&[
                r"melee\s+defense",
                r"ranged\s+defense",
                r"magic\s+defense",
                r"off-?hand",
                r"main-?hand",
                "locked",
                "preview",
                r"max\s+enchantment\s+stats",
                r"set\s+effects",
                "trait",
                "blessing",
                r"lv\.?",
                "level",
            ]),
            lower_denylist: LexiconSpec::words(&["durability", "weight"]),
            trait_hints: LexiconSpec::substrings(&[
                "hit",
                "critical",
                "max health",
                "cooldown",
                "evasion",
                "endurance",
                "heavy attack",
                "attack speed",
                "buff",
                "debuff",
                "range",
                "magic",
                "melee",
                "skill",
                "side",
                "front",
                "collision",
                "mana",
                "stun",
            ]),
        }
    }
}

/// Compiled vocabulary set handed to the detector and the field locator.
#[derive(Clone, Debug)]
pub struct Lexicons {
    pub rarity: Lexicon,
    pub item_type: Lexicon,
    pub section_label: Lexicon,
    pub stat_anchor: Lexicon,
    pub denylist: Lexicon,
    pub lower_denylist: Lexicon,
    pub trait_hints: Lexicon,
}

impl Lexicons {
    pub fn compile(config: &LexiconsConfig) -> Result<Self> {
        Ok(Self {
            rarity: Lexicon::compile(&config.rarity).context("rarity lexicon")?,
            item_type: Lexicon::compile(&config.item_type).context("item_type lexicon")?,
            section_label: Lexicon::compile(&config.section_label)
                .context("section_label lexicon")?,
            stat_anchor: Lexicon::compile(&config.stat_anchor).context("stat_anchor lexicon")?,
            denylist: Lexicon::compile(&config.denylist).context("denylist lexicon")?,
            lower_denylist: Lexicon::compile(&config.lower_denylist)
                .context("lower_denylist lexicon")?,
            trait_hints: Lexicon::compile(&config.trait_hints).context("trait_hints lexicon")?,
        })
    }

    /// The built-in English vocabularies.
    #[cfg(test)]
    pub fn english() -> Self {
        Self::compile(&LexiconsConfig::default()).expect("built-in lexicons are valid")
    }
}
