use crate::lexicon::TermSet;
use crate::similarity::similarity;
use crate::verdict::BlockReason;

/// Checks a normalized candidate against the blocklist.
///
/// Substring containment of any term wins over every fuzzy match, so the
/// whole list is scanned for containment before any ratio is computed.
/// Terms are visited in sorted order, so the reported term is reproducible.
pub fn check_blocklist(candidate: &str, blocklist: &TermSet, threshold: f64) -> Option<BlockReason> {
    if let Some(term) = blocklist.iter().find(|term| candidate.contains(term)) {
        return Some(BlockReason::BlockedTerm(term.to_string()));
    }

    blocklist
        .iter()
        .find(|term| similarity(candidate, term) >= threshold)
        .map(|term| BlockReason::FuzzyMatch(term.to_string()))
}

#[cfg(test)]
mod tests {
    use super::check_blocklist;
    use crate::lexicon::{DEFAULT_BLOCKLIST, TermSet};
    use crate::verdict::BlockReason;

    fn blocklist() -> TermSet {
        TermSet::from_entries(DEFAULT_BLOCKLIST)
    }

    #[test]
    fn every_blocklist_term_blocks_itself() {
        let blocklist = blocklist();
        for term in blocklist.iter() {
            assert!(
                check_blocklist(term, &blocklist, 0.85).is_some(),
                "{term} should be blocked"
            );
        }
    }

    #[test]
    fn substring_hit_reports_first_term_in_sorted_order() {
        let blocklist = TermSet::from_entries(["hack", "hacker"]);
        assert_eq!(
            check_blocklist("ethical hacker", &blocklist, 0.85),
            Some(BlockReason::BlockedTerm("hack".to_string()))
        );
    }

    #[test]
    fn substring_takes_priority_over_earlier_fuzzy_term() {
        // "grenadea" sorts first and scores 0.875, but "nades" is contained.
        let blocklist = TermSet::from_entries(["grenadea", "nades"]);
        assert_eq!(
            check_blocklist("grenades", &blocklist, 0.85),
            Some(BlockReason::BlockedTerm("nades".to_string()))
        );
    }

    #[test]
    fn fuzzy_match_catches_near_misses() {
        // "nazzi" vs "nazi": 2 * 4 / 9 = 0.889.
        assert_eq!(
            check_blocklist("nazzi", &blocklist(), 0.85),
            Some(BlockReason::FuzzyMatch("nazi".to_string()))
        );
    }

    #[test]
    fn unrelated_candidates_are_inconclusive() {
        for candidate in ["python", "machine learning", "rust", "graphic design", ""] {
            assert_eq!(check_blocklist(candidate, &blocklist(), 0.85), None, "{candidate}");
        }
    }
}
