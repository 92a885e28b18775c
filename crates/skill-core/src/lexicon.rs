use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

pub const DEFAULT_BLOCKLIST: &[&str] = &[
    // sexual content
    "sex", "sexual", "nude", "naked", "porn", "pornography", "xxx", "strip", "escort", "fetish",
    "nsfw", "erotic", "hardcore", "adult", "incest", "rape", "molest", "orgy", "bang",
    "kamasutra", "nudity",
    // violence
    "terrorist", "terrorism", "bomb", "explosive", "murder", "kill", "slaughter", "massacre",
    "genocide", "execute", "assassinate", "behead", "hang", "shoot", "stab", "decapitate",
    "lynch", "molotov", "torture",
    // drugs
    "drug", "cocaine", "heroin", "marijuana", "weed", "meth", "lsd", "ecstasy", "narcotic",
    "opium", "overdose", "addict", "dealer", "crack",
    // weapons
    "gun", "rifle", "pistol", "weapon", "grenade", "firearm", "sniper", "ak47", "bullet",
    "shooter", "ammo", "munition",
    // cybercrime
    "hack", "hacker", "phish", "phishing", "scam", "fraud", "darkweb", "ransomware", "malware",
    "spyware", "exploit", "breach", "ddos",
    // hate
    "racist", "nazi", "hitler", "kkk", "homophobic", "antisemitic", "islamophobic", "slur",
    "bigot",
];

pub const DEFAULT_SHORT_ALLOWLIST: &[&str] = &[
    "c", "c++", "c#", "r", "go", "js", "ts", "sql", "html", "css", "php", "asp", "jsx", "tsx",
    "python", "ai", "ml", "dl", "cv", "nlp", "ocr", "rl", "pca", "eda", "cnn", "rnn", "lstm",
    "gpt", "bert", "xgboost", "svm", "qa", "ci", "cd", "tdd", "bdd", "api", "sdk", "devops",
    "sdet", "jest", "pip", "npm", "yarn", "git", "ui", "ux", "dom", "svg", "xml", "json", "http",
    "rest", "soap", "spa", "mvc", "css3", "html5", "aws", "gcp", "az", "cli", "ssh", "tcp", "udp",
    "ftp", "dns", "cdn", "vm", "kvm", "gpu", "etl", "jwt", "sso", "seo", "cms", "crm", "erp",
    "nosql",
];

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("failed to read lexicon source {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("lexicon source {path} has no entries")]
    Empty { path: PathBuf },
}

/// Lowercases and trims a candidate or lexicon entry. Idempotent.
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase().trim().to_string()
}

/// Deduplicated, normalized terms with a sorted iteration order and O(1)
/// membership.
#[derive(Debug, Clone, Default)]
pub struct TermSet {
    ordered: Vec<String>,
    index: HashSet<String>,
}

impl TermSet {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ordered = entries
            .into_iter()
            .map(|entry| normalize(entry.as_ref()))
            .filter(|entry| !entry.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        let index = ordered.iter().cloned().collect();

        Self { ordered, index }
    }

    pub fn contains(&self, term: &str) -> bool {
        self.index.contains(term)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    fn union(&self, other: &TermSet) -> TermSet {
        TermSet::from_entries(self.iter().chain(other.iter()))
    }
}

#[derive(Debug, Clone)]
pub struct LexiconSources {
    pub skills_path: PathBuf,
    pub male_names_path: PathBuf,
    pub female_names_path: PathBuf,
    pub short_allowlist_path: Option<PathBuf>,
    pub blocklist_path: Option<PathBuf>,
}

/// Immutable word lists consulted by the validation pipeline. Built once at
/// startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct Lexicon {
    skills: TermSet,
    names: TermSet,
    short_allowlist: TermSet,
    blocklist: TermSet,
}

impl Lexicon {
    pub fn load(sources: &LexiconSources) -> Result<Self, LexiconError> {
        let skills = load_term_file(&sources.skills_path)?;
        if skills.is_empty() {
            return Err(LexiconError::Empty {
                path: sources.skills_path.clone(),
            });
        }

        let male_names = load_term_file(&sources.male_names_path)?;
        let female_names = load_term_file(&sources.female_names_path)?;
        let short_allowlist = match sources.short_allowlist_path.as_deref() {
            Some(path) => load_term_file(path)?,
            None => TermSet::from_entries(DEFAULT_SHORT_ALLOWLIST),
        };
        let blocklist = match sources.blocklist_path.as_deref() {
            Some(path) => load_term_file(path)?,
            None => TermSet::from_entries(DEFAULT_BLOCKLIST),
        };

        let lexicon = Self {
            skills,
            names: male_names.union(&female_names),
            short_allowlist,
            blocklist,
        };

        info!(
            skills = lexicon.skills.len(),
            names = lexicon.names.len(),
            short_allowlist = lexicon.short_allowlist.len(),
            blocklist = lexicon.blocklist.len(),
            "lexicon loaded"
        );

        Ok(lexicon)
    }

    pub fn from_entries(
        skills: &[&str],
        names: &[&str],
        short_allowlist: &[&str],
        blocklist: &[&str],
    ) -> Self {
        Self {
            skills: TermSet::from_entries(skills),
            names: TermSet::from_entries(names),
            short_allowlist: TermSet::from_entries(short_allowlist),
            blocklist: TermSet::from_entries(blocklist),
        }
    }

    /// Uses the built-in allowlist and blocklist.
    pub fn with_default_filters(skills: &[&str], names: &[&str]) -> Self {
        Self::from_entries(skills, names, DEFAULT_SHORT_ALLOWLIST, DEFAULT_BLOCKLIST)
    }

    pub fn is_skill(&self, term: &str) -> bool {
        self.skills.contains(term)
    }

    pub fn is_name(&self, term: &str) -> bool {
        self.names.contains(term)
    }

    pub fn is_allowlisted(&self, term: &str) -> bool {
        self.short_allowlist.contains(term)
    }

    pub fn is_blocked_term(&self, term: &str) -> bool {
        self.blocklist.contains(term)
    }

    pub fn skills(&self) -> &TermSet {
        &self.skills
    }

    pub fn names(&self) -> &TermSet {
        &self.names
    }

    pub fn short_allowlist(&self) -> &TermSet {
        &self.short_allowlist
    }

    pub fn blocklist(&self) -> &TermSet {
        &self.blocklist
    }
}

fn load_term_file(path: &Path) -> Result<TermSet, LexiconError> {
    let raw = fs::read_to_string(path).map_err(|source| LexiconError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(TermSet::from_entries(raw.lines()))
}
