use std::fmt;

use serde::{Deserialize, Serialize};

use crate::gibberish::GibberishRule;
use crate::moderation::ModerationCategory;

/// Outcome of validating one candidate. Rejections are ordinary values, not
/// errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid { matched_term: Option<String> },
    Blocked { reason: BlockReason },
    Gibberish { rule: GibberishRule },
    NameDetected,
    SuggestionOffered { suggestion: String },
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    BlockedTerm(String),
    FuzzyMatch(String),
    Moderation { categories: Vec<ModerationCategory> },
    ModerationUnavailable,
    ClassifierFlagged,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlockedTerm(term) => write!(f, "contains blocked term: {term}"),
            Self::FuzzyMatch(term) => write!(f, "fuzzy match to: {term}"),
            Self::Moderation { categories } if categories.is_empty() => {
                f.write_str("flagged by moderation")
            }
            Self::Moderation { categories } => {
                let labels = categories
                    .iter()
                    .map(|category| category.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "flagged by moderation: {labels}")
            }
            Self::ModerationUnavailable => f.write_str("moderation service unavailable"),
            Self::ClassifierFlagged => f.write_str("flagged as inappropriate by classifier"),
        }
    }
}

impl Verdict {
    pub fn valid(matched_term: impl Into<String>) -> Self {
        Self::Valid {
            matched_term: Some(matched_term.into()),
        }
    }

    pub fn blocked(reason: BlockReason) -> Self {
        Self::Blocked { reason }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Stable snake_case label used in logs and API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Valid { .. } => "valid",
            Self::Blocked { .. } => "blocked",
            Self::Gibberish { .. } => "gibberish",
            Self::NameDetected => "name_detected",
            Self::SuggestionOffered { .. } => "suggestion_offered",
            Self::Unknown => "unknown",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Valid { matched_term: None } => "Valid skill!".to_string(),
            Self::Valid {
                matched_term: Some(term),
            } => format!("Valid skill: '{term}'"),
            Self::Blocked { reason } => format!("Inappropriate content ({reason})"),
            Self::Gibberish { .. } => "This looks like gibberish or not a real skill.".to_string(),
            Self::NameDetected => "This looks like a name, not a skill.".to_string(),
            Self::SuggestionOffered { suggestion } => format!("Do you mean: {suggestion}?"),
            Self::Unknown => "Unknown skill: not found in list.".to_string(),
        }
    }
}

/// Caller-facing rendering of a [`Verdict`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    pub verdict: String,
}

impl From<&Verdict> for ValidationOutcome {
    fn from(verdict: &Verdict) -> Self {
        let suggestion = match verdict {
            Verdict::SuggestionOffered { suggestion } => Some(suggestion.clone()),
            _ => None,
        };

        Self {
            valid: verdict.is_valid(),
            message: verdict.message(),
            suggestion,
            verdict: verdict.kind().to_string(),
        }
    }
}

impl From<Verdict> for ValidationOutcome {
    fn from(verdict: Verdict) -> Self {
        Self::from(&verdict)
    }
}
