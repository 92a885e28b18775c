#![allow(dead_code)]

pub mod api_app;

use std::fs;
use std::path::Path;

use skill_core::{Lexicon, LexiconSources};
use tempfile::TempDir;

pub const TEST_SKILLS: &[&str] = &[
    "Python",
    "JavaScript",
    "Rust",
    "Graphic Design",
    "Machine Learning",
    "Data Analysis",
    "C++",
];
pub const TEST_MALE_NAMES: &[&str] = &["John", "Ahmed"];
pub const TEST_FEMALE_NAMES: &[&str] = &["Mary", "Priya"];

/// On-disk lexicon fixture. The directory lives as long as the value.
pub struct LexiconFixture {
    dir: TempDir,
    pub sources: LexiconSources,
}

impl LexiconFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let sources = LexiconSources {
            skills_path: write_lines(dir.path(), "skills.txt", TEST_SKILLS),
            male_names_path: write_lines(dir.path(), "male_names.txt", TEST_MALE_NAMES),
            female_names_path: write_lines(dir.path(), "female_names.txt", TEST_FEMALE_NAMES),
            short_allowlist_path: None,
            blocklist_path: None,
        };

        Self { dir, sources }
    }

    pub fn load(&self) -> Lexicon {
        Lexicon::load(&self.sources).expect("fixture lexicon should load")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

fn write_lines(dir: &Path, file_name: &str, lines: &[&str]) -> std::path::PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, lines.join("\n")).expect("fixture file should be written");
    path
}
