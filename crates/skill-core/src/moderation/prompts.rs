pub const CLASSIFIER_SYSTEM_PROMPT: &str = "You review short strings that users enter as skills on a skill-swap platform. \
Reply with exactly one line and nothing else: \
VALID if the text is a real skill, \
SUGGESTION: <closest skill> if it is a likely typo of a listed skill, \
INAPPROPRIATE if it is unsafe or offensive, \
INVALID if it is not a skill.";

/// Number of lexicon skills quoted in the prompt.
pub const MAX_PROMPT_SKILLS: usize = 200;

pub fn classifier_user_prompt(candidate: &str, known_skills: &[&str]) -> String {
    let listed = known_skills
        .iter()
        .take(MAX_PROMPT_SKILLS)
        .copied()
        .collect::<Vec<_>>()
        .join(", ");

    format!("User typed: \"{candidate}\"\n\nKnown skills: {listed}")
}
