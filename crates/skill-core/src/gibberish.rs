use serde::{Deserialize, Serialize};

use crate::lexicon::Lexicon;

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u'];
const CONSONANT_HEAVY_MIN_LEN: usize = 6;
const CONSONANT_HEAVY_RATIO: f64 = 0.7;

/// The heuristic that classified a candidate as gibberish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GibberishRule {
    TooShort,
    NoVowels,
    ConsonantHeavy,
    DisallowedCharacter,
}

impl GibberishRule {
    /// Rules judging letter composition rather than length or character set.
    /// A near-miss of a real skill can trip these.
    pub fn is_composition_rule(self) -> bool {
        matches!(self, Self::NoVowels | Self::ConsonantHeavy)
    }
}

/// Runs the gibberish heuristics in order and returns the first that fires.
///
/// Allowlisted short technical terms are exempt from every rule.
pub fn classify_gibberish(candidate: &str, lexicon: &Lexicon) -> Option<GibberishRule> {
    if lexicon.is_allowlisted(candidate) {
        return None;
    }

    let len = candidate.chars().count();
    if len == 1 || len == 2 {
        return Some(GibberishRule::TooShort);
    }

    if len > 2 && candidate.chars().all(char::is_alphabetic) && !candidate.contains(VOWELS) {
        return Some(GibberishRule::NoVowels);
    }

    if len >= CONSONANT_HEAVY_MIN_LEN && candidate.chars().all(|ch| ch.is_ascii_lowercase()) {
        let consonants = candidate.chars().filter(|ch| !VOWELS.contains(ch)).count();
        if consonants as f64 > len as f64 * CONSONANT_HEAVY_RATIO {
            return Some(GibberishRule::ConsonantHeavy);
        }
    }

    if candidate.is_empty() || !candidate.chars().all(is_allowed_char) {
        return Some(GibberishRule::DisallowedCharacter);
    }

    None
}

fn is_allowed_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '_' | '.' | '/' | '#' | '+' | '-')
}
