pub mod blocklist;
pub mod config;
mod config_env;
pub mod gibberish;
pub mod lexicon;
pub mod models;
pub mod moderation;
pub mod names;
pub mod similarity;
pub mod skills;
pub mod validation;
pub mod verdict;

pub use lexicon::{Lexicon, LexiconError, LexiconSources};
pub use validation::{ModerationFailurePolicy, SkillValidator, ValidationPolicy, normalize};
pub use verdict::{BlockReason, ValidationOutcome, Verdict};
