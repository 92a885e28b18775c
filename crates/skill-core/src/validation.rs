use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::blocklist::check_blocklist;
use crate::config::DEFAULT_EXTERNAL_TIMEOUT_MS;
use crate::gibberish::classify_gibberish;
pub use crate::lexicon::normalize;
use crate::lexicon::Lexicon;
use crate::moderation::prompts::MAX_PROMPT_SKILLS;
use crate::moderation::{
    ClassifierRequest, ClassifierTag, ExternalServiceError, ModerationGateway, ModerationOutcome,
    SkillClassifier,
};
use crate::names::is_person_name;
use crate::skills::{match_skill, suggest_skill};
use crate::verdict::{BlockReason, Verdict};

const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;

/// What to do when the moderation service cannot answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModerationFailurePolicy {
    /// Treat the candidate as not flagged and run the local stages.
    #[default]
    FailOpen,
    /// Reject the candidate as blocked.
    FailClosed,
}

impl FromStr for ModerationFailurePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fail_open" | "open" => Ok(Self::FailOpen),
            "fail_closed" | "closed" => Ok(Self::FailClosed),
            other => Err(format!(
                "unsupported moderation failure policy '{other}' (expected fail_open or fail_closed)"
            )),
        }
    }
}

impl fmt::Display for ModerationFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailOpen => f.write_str("fail_open"),
            Self::FailClosed => f.write_str("fail_closed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    pub blocklist_fuzzy_threshold: f64,
    pub suggestion_threshold: f64,
    pub suggestions_enabled: bool,
    pub moderation_failure_policy: ModerationFailurePolicy,
    /// Bound on a single moderation call.
    pub external_timeout: Duration,
    /// Bound on a whole classifier escalation, retries and fallback model
    /// included.
    pub classifier_timeout: Duration,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            blocklist_fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            suggestion_threshold: DEFAULT_FUZZY_THRESHOLD,
            suggestions_enabled: true,
            moderation_failure_policy: ModerationFailurePolicy::default(),
            external_timeout: Duration::from_millis(DEFAULT_EXTERNAL_TIMEOUT_MS),
            classifier_timeout: Duration::from_millis(DEFAULT_EXTERNAL_TIMEOUT_MS),
        }
    }
}

/// Runs a candidate through moderation, blocklist, name, gibberish and skill
/// checks in that order. The first decisive stage ends the run.
#[derive(Clone)]
pub struct SkillValidator {
    lexicon: Arc<Lexicon>,
    policy: ValidationPolicy,
    moderation: Option<Arc<dyn ModerationGateway>>,
    classifier: Option<Arc<dyn SkillClassifier>>,
}

impl SkillValidator {
    pub fn new(lexicon: Arc<Lexicon>, policy: ValidationPolicy) -> Self {
        Self {
            lexicon,
            policy,
            moderation: None,
            classifier: None,
        }
    }

    pub fn with_moderation(mut self, moderation: Arc<dyn ModerationGateway>) -> Self {
        self.moderation = Some(moderation);
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn SkillClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Full pipeline, including the external stages when configured.
    pub async fn validate(&self, raw: &str) -> Verdict {
        let candidate = normalize(raw);

        if let Some(verdict) = self.moderation_check(&candidate).await {
            return self.finish(&candidate, verdict);
        }

        let verdict = self.local_verdict(&candidate);
        if verdict != Verdict::Unknown {
            return self.finish(&candidate, verdict);
        }

        let verdict = self.classifier_escalation(&candidate).await;
        self.finish(&candidate, verdict)
    }

    /// Deterministic local stages only. Never touches the network.
    pub fn validate_offline(&self, raw: &str) -> Verdict {
        let candidate = normalize(raw);
        let verdict = self.local_verdict(&candidate);
        self.finish(&candidate, verdict)
    }

    fn local_verdict(&self, candidate: &str) -> Verdict {
        let lexicon = self.lexicon.as_ref();

        if let Some(reason) = check_blocklist(
            candidate,
            lexicon.blocklist(),
            self.policy.blocklist_fuzzy_threshold,
        ) {
            return Verdict::blocked(reason);
        }

        if is_person_name(candidate, lexicon) {
            return Verdict::NameDetected;
        }

        if let Some(rule) = classify_gibberish(candidate, lexicon) {
            // Lexicon entries always validate as themselves, whatever their shape.
            if lexicon.is_skill(candidate) {
                return Verdict::valid(candidate);
            }
            // A vowel-less or consonant-heavy near miss of a real skill is a
            // typo, not noise.
            if rule.is_composition_rule()
                && let Some(suggestion) = self.suggestion_for(candidate)
            {
                return Verdict::SuggestionOffered { suggestion };
            }
            return Verdict::Gibberish { rule };
        }

        if let Some(found) = match_skill(candidate, lexicon.skills()) {
            return Verdict::valid(found.term());
        }

        match self.suggestion_for(candidate) {
            Some(suggestion) => Verdict::SuggestionOffered { suggestion },
            None => Verdict::Unknown,
        }
    }

    fn suggestion_for(&self, candidate: &str) -> Option<String> {
        if !self.policy.suggestions_enabled {
            return None;
        }
        suggest_skill(
            candidate,
            self.lexicon.skills(),
            self.policy.suggestion_threshold,
        )
    }

    async fn moderation_check(&self, candidate: &str) -> Option<Verdict> {
        let moderation = self.moderation.as_ref()?;

        let result = match timeout(self.policy.external_timeout, moderation.moderate(candidate)).await
        {
            Ok(result) => result,
            Err(_) => Err(ExternalServiceError::Timeout),
        };

        match result {
            Ok(ModerationOutcome {
                flagged: true,
                categories,
            }) => Some(Verdict::blocked(BlockReason::Moderation { categories })),
            Ok(_) => None,
            Err(err) => match self.policy.moderation_failure_policy {
                ModerationFailurePolicy::FailOpen => {
                    warn!(
                        error = %err,
                        policy = %ModerationFailurePolicy::FailOpen,
                        "moderation check failed; continuing with local checks"
                    );
                    None
                }
                ModerationFailurePolicy::FailClosed => {
                    warn!(
                        error = %err,
                        policy = %ModerationFailurePolicy::FailClosed,
                        "moderation check failed; rejecting candidate"
                    );
                    Some(Verdict::blocked(BlockReason::ModerationUnavailable))
                }
            },
        }
    }

    async fn classifier_escalation(&self, candidate: &str) -> Verdict {
        let Some(classifier) = self.classifier.as_ref() else {
            return Verdict::Unknown;
        };

        let request = ClassifierRequest {
            candidate,
            known_skills: self.lexicon.skills().iter().take(MAX_PROMPT_SKILLS).collect(),
        };
        let result = match timeout(self.policy.classifier_timeout, classifier.classify(request)).await
        {
            Ok(result) => result,
            Err(_) => Err(ExternalServiceError::Timeout),
        };

        match result {
            Ok(ClassifierTag::Valid) => Verdict::Valid { matched_term: None },
            Ok(ClassifierTag::Suggestion(raw)) => {
                let suggestion = normalize(&raw);
                if self.lexicon.is_skill(&suggestion) {
                    Verdict::SuggestionOffered { suggestion }
                } else {
                    debug!(suggestion = %suggestion, "classifier suggested a skill outside the lexicon");
                    Verdict::Unknown
                }
            }
            Ok(ClassifierTag::Inappropriate) => Verdict::blocked(BlockReason::ClassifierFlagged),
            Ok(ClassifierTag::Invalid) => Verdict::Unknown,
            Err(err) => {
                warn!(error = %err, "skill classifier failed; keeping local verdict");
                Verdict::Unknown
            }
        }
    }

    fn finish(&self, candidate: &str, verdict: Verdict) -> Verdict {
        debug!(
            candidate_len = candidate.chars().count(),
            verdict = verdict.kind(),
            "skill candidate validated"
        );
        verdict
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{ModerationFailurePolicy, SkillValidator, ValidationPolicy};
    use crate::gibberish::GibberishRule;
    use crate::lexicon::Lexicon;
    use crate::verdict::{BlockReason, Verdict};

    const SKILLS: &[&str] = &[
        "python",
        "java",
        "javascript",
        "rust",
        "graphic design",
        "machine learning",
        "c++",
    ];
    const NAMES: &[&str] = &["john", "mary", "priya"];

    fn validator() -> SkillValidator {
        SkillValidator::new(
            Arc::new(Lexicon::with_default_filters(SKILLS, NAMES)),
            ValidationPolicy::default(),
        )
    }

    #[test]
    fn exact_skill_is_valid() {
        assert_eq!(validator().validate_offline("python"), Verdict::valid("python"));
        assert_eq!(validator().validate_offline("  PyThOn "), Verdict::valid("python"));
    }

    #[test]
    fn every_skill_validates_as_itself() {
        let validator = validator();
        for skill in SKILLS {
            assert_eq!(validator.validate_offline(skill), Verdict::valid(*skill), "{skill}");
        }
    }

    #[test]
    fn blocked_term_is_reported() {
        assert_eq!(
            validator().validate_offline("sex"),
            Verdict::blocked(BlockReason::BlockedTerm("sex".to_string()))
        );
        assert!(validator().validate_offline("sex").message().contains("sex"));
    }

    #[test]
    fn blocklist_runs_before_skill_substring_match() {
        // Contains both "python" and "hack".
        assert_eq!(
            validator().validate_offline("python hacking"),
            Verdict::blocked(BlockReason::BlockedTerm("hack".to_string()))
        );
    }

    #[test]
    fn every_blocklist_term_is_blocked() {
        let validator = validator();
        for term in validator.lexicon().blocklist().iter() {
            assert!(
                matches!(validator.validate_offline(term), Verdict::Blocked { .. }),
                "{term}"
            );
        }
    }

    #[test]
    fn single_characters_and_empty_input_are_gibberish() {
        let validator = validator();
        for candidate in ["a", "z", "", "   ", "é"] {
            assert!(
                matches!(validator.validate_offline(candidate), Verdict::Gibberish { .. }),
                "{candidate:?}"
            );
        }
    }

    #[test]
    fn name_is_detected() {
        assert_eq!(validator().validate_offline("John"), Verdict::NameDetected);
    }

    #[test]
    fn vowelless_noise_is_gibberish() {
        assert_eq!(
            validator().validate_offline("zzxqy"),
            Verdict::Gibberish {
                rule: GibberishRule::NoVowels
            }
        );
    }

    #[test]
    fn typo_gets_a_suggestion() {
        assert_eq!(
            validator().validate_offline("pythn"),
            Verdict::SuggestionOffered {
                suggestion: "python".to_string()
            }
        );
        // Consonant-heavy, rescued by the suggestion lookup.
        assert_eq!(
            validator().validate_offline("javascrpt"),
            Verdict::SuggestionOffered {
                suggestion: "javascript".to_string()
            }
        );
        assert_eq!(
            validator().validate_offline("machine lerning"),
            Verdict::SuggestionOffered {
                suggestion: "machine learning".to_string()
            }
        );
    }

    #[test]
    fn oddly_shaped_lexicon_skills_validate_as_themselves() {
        const ODD_SKILLS: &[&str] = &["scripting", "rhythm", "r&d", "3d"];

        for suggestions_enabled in [true, false] {
            let validator = SkillValidator::new(
                Arc::new(Lexicon::with_default_filters(ODD_SKILLS, NAMES)),
                ValidationPolicy {
                    suggestions_enabled,
                    ..ValidationPolicy::default()
                },
            );
            for skill in ODD_SKILLS {
                assert_eq!(
                    validator.validate_offline(skill),
                    Verdict::valid(*skill),
                    "{skill} with suggestions_enabled={suggestions_enabled}"
                );
            }
        }
    }

    #[test]
    fn near_miss_of_blocked_term_is_blocked() {
        assert_eq!(
            validator().validate_offline("cocain"),
            Verdict::blocked(BlockReason::FuzzyMatch("cocaine".to_string()))
        );
    }

    #[test]
    fn disabling_suggestions_restores_gibberish_and_unknown() {
        let validator = SkillValidator::new(
            Arc::new(Lexicon::with_default_filters(SKILLS, NAMES)),
            ValidationPolicy {
                suggestions_enabled: false,
                ..ValidationPolicy::default()
            },
        );
        assert_eq!(
            validator.validate_offline("pythn"),
            Verdict::Gibberish {
                rule: GibberishRule::NoVowels
            }
        );
        assert_eq!(validator.validate_offline("machine lerning"), Verdict::Unknown);
    }

    #[test]
    fn substring_match_names_the_contained_skill() {
        assert_eq!(
            validator().validate_offline("advanced javascript"),
            Verdict::valid("javascript")
        );
    }

    #[test]
    fn unrelated_text_is_unknown() {
        assert_eq!(validator().validate_offline("cooking"), Verdict::Unknown);
    }

    #[test]
    fn allowlisted_terms_are_never_gibberish() {
        let validator = validator();
        for term in validator.lexicon().short_allowlist().iter() {
            assert!(
                !matches!(validator.validate_offline(term), Verdict::Gibberish { .. }),
                "{term}"
            );
        }
    }

    #[test]
    fn failure_policy_parses_named_values() {
        assert_eq!(
            "fail_open".parse::<ModerationFailurePolicy>(),
            Ok(ModerationFailurePolicy::FailOpen)
        );
        assert_eq!(
            " FAIL_CLOSED ".parse::<ModerationFailurePolicy>(),
            Ok(ModerationFailurePolicy::FailClosed)
        );
        assert!("sometimes".parse::<ModerationFailurePolicy>().is_err());
    }
}
