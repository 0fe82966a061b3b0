//! Saved answers to free-text application questions.

use std::collections::HashSet;

use autofill_core_types::Profile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum token overlap for a saved answer to be reused.
const REUSE_THRESHOLD: f64 = 0.3;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "do", "for", "how", "in", "is", "of", "on", "or", "the", "to", "what",
    "why", "with", "you", "your",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAnswer {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub saved_at: DateTime<Utc>,
}

impl SavedAnswer {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            answer: answer.into(),
            saved_at: Utc::now(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnswerSource {
    Library,
    ProfessionalSummary,
    CoverLetter,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAnswer {
    pub answer: String,
    pub source: AnswerSource,
}

/// Replaces an entry with the same question, otherwise appends.
pub fn upsert(library: &mut Vec<SavedAnswer>, entry: SavedAnswer) {
    let key = tokens(&entry.question);
    match library.iter_mut().find(|saved| tokens(&saved.question) == key) {
        Some(saved) => {
            saved.answer = entry.answer;
            saved.saved_at = entry.saved_at;
        }
        None => library.push(entry),
    }
}

/// Saved answer whose question overlaps most with `question`.
pub fn best_match<'a>(library: &'a [SavedAnswer], question: &str) -> Option<&'a SavedAnswer> {
    let wanted = tokens(question);
    if wanted.is_empty() {
        return None;
    }
    library
        .iter()
        .map(|saved| (overlap(&wanted, &tokens(&saved.question)), saved))
        .filter(|(score, _)| *score >= REUSE_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, saved)| saved)
}

/// Library answer first, then the profile summary, then the cover letter.
pub fn generate_answer(
    profile: Option<&Profile>,
    library: &[SavedAnswer],
    question: &str,
) -> Option<GeneratedAnswer> {
    if let Some(saved) = best_match(library, question) {
        return Some(GeneratedAnswer {
            answer: saved.answer.clone(),
            source: AnswerSource::Library,
        });
    }
    let profile = profile?;
    let non_empty = |text: &Option<String>| {
        text.as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    };
    non_empty(&profile.professional_summary)
        .map(|answer| GeneratedAnswer {
            answer,
            source: AnswerSource::ProfessionalSummary,
        })
        .or_else(|| {
            non_empty(&profile.cover_letter).map(|answer| GeneratedAnswer {
                answer,
                source: AnswerSource::CoverLetter,
            })
        })
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|word| !word.is_empty() && !STOP_WORDS.contains(&word.as_str()))
        .collect()
}

/// Jaccard index.
fn overlap(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}
