use std::cmp::{Ordering, Reverse};

use crate::lexicon::TermSet;
use crate::similarity::similarity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillMatch {
    Exact(String),
    Contains(String),
}

impl SkillMatch {
    pub fn term(&self) -> &str {
        match self {
            Self::Exact(term) | Self::Contains(term) => term,
        }
    }
}

/// Exact lexicon hit, or else the lexicon entry contained in the candidate.
///
/// When several entries are contained the longest wins, then the
/// lexicographically smallest.
pub fn match_skill(candidate: &str, skills: &TermSet) -> Option<SkillMatch> {
    if skills.contains(candidate) {
        return Some(SkillMatch::Exact(candidate.to_string()));
    }

    skills
        .iter()
        .filter(|entry| candidate.contains(entry))
        .min_by_key(|entry| (Reverse(entry.chars().count()), *entry))
        .map(|entry| SkillMatch::Contains(entry.to_string()))
}

/// Closest lexicon entry scoring at least `threshold`; ties go to the
/// lexicographically smallest entry.
pub fn suggest_skill(candidate: &str, skills: &TermSet, threshold: f64) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;

    for entry in skills.iter() {
        let score = similarity(candidate, entry);
        if score < threshold {
            continue;
        }

        let better = match best {
            Some((_, best_score)) => score.partial_cmp(&best_score) == Some(Ordering::Greater),
            None => true,
        };
        if better {
            best = Some((entry, score));
        }
    }

    best.map(|(entry, _)| entry.to_string())
}
