//! Keyword overlap between a profile's skills and a job posting.

use std::collections::BTreeSet;

use autofill_core_types::{normalize_text, Profile};
use serde::{Deserialize, Serialize};

/// Skill terms recognised in postings even when the profile lacks them.
const COMMON_SKILLS: &[&str] = &[
    "rust", "go", "python", "java", "kotlin", "swift", "c++", "c#", "typescript", "javascript",
    "react", "vue", "angular", "node.js", "django", "spring", "graphql", "rest", "grpc", "sql",
    "postgresql", "mysql", "mongodb", "redis", "kafka", "docker", "kubernetes", "terraform",
    "aws", "gcp", "azure", "linux", "git", "ci/cd", "machine learning", "data analysis",
    "communication", "leadership", "agile", "scrum",
];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScore {
    /// 0 to 100.
    pub score: u8,
    pub matched: Vec<String>,
    /// Terms the posting asks for that the profile does not list.
    pub missing: Vec<String>,
}

pub fn match_score(profile: &Profile, job_text: &str) -> MatchScore {
    let job = format!(" {} ", tokenize(job_text).join(" "));
    let profile_skills: BTreeSet<String> = profile
        .skills
        .flatten()
        .into_iter()
        .map(normalize_text)
        .filter(|skill| !skill.is_empty())
        .collect();

    let matched: Vec<String> = profile_skills
        .iter()
        .filter(|skill| mentions(&job, skill))
        .cloned()
        .collect();
    let missing: Vec<String> = COMMON_SKILLS
        .iter()
        .map(|term| term.to_string())
        .filter(|term| !profile_skills.contains(term) && mentions(&job, term))
        .collect();

    let wanted = matched.len() + missing.len();
    let score = if wanted == 0 {
        0
    } else {
        ((matched.len() * 100) as f64 / wanted as f64).round() as u8
    };
    MatchScore {
        score,
        matched,
        missing,
    }
}

/// Lowercased words; punctuation that is part of common skill names survives.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '(' | ')' | ':' | '!' | '?'))
        .map(|word| word.trim_end_matches('.').to_lowercase())
        .filter(|word| !word.is_empty())
        .collect()
}

fn mentions(padded_job: &str, term: &str) -> bool {
    let needle = format!(" {} ", tokenize(term).join(" "));
    !needle.trim().is_empty() && padded_job.contains(&needle)
}
