//! Shared primitives for the autofill engine crates.
//!
//! Everything here is plain data: the profile the engine reads, the field
//! catalog handed over by the detector, the cached resume record and the
//! result accumulated by a fill run.

mod field;
mod profile;
mod result;
mod resume;

pub use field::{
    ClassificationTag, ClassifiedField, ControlKind, FieldCatalog, FieldCategory, NodeId,
    RawClassifiedField, RawFieldCatalog, RejectedField,
};
pub use profile::{Education, Experience, PersonalInfo, Preferences, Profile, Skills};
pub use result::{FieldError, FillPass, FillResult, FilledField, SkipReason, SkippedField};
pub use resume::ResumeFile;

use thiserror::Error;

/// Error shared by the engine crates and the ports they talk to.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("{message}")]
    Message { message: String },
    #[error("unknown classification tag '{0}'")]
    UnknownTag(String),
    #[error("unknown field category '{0}'")]
    UnknownCategory(String),
    #[error("invalid date '{0}'")]
    InvalidDate(String),
}

impl CoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Case-folded, whitespace-collapsed form used for value comparisons.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether two control values are equivalent once normalized.
pub fn is_similar_value(existing: &str, target: &str) -> bool {
    normalize_text(existing) == normalize_text(target)
}
