use std::fmt;

use serde::{Deserialize, Serialize};

use crate::field::FieldCategory;

/// Sub-pass that produced an entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "category")]
pub enum FillPass {
    /// Catalog entries under a category key that is not recognised.
    Catalog,
    Category(FieldCategory),
    ResumeFiles,
    RadioGroups,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SkipReason {
    #[serde(rename = "not visible")]
    NotVisible,
    #[serde(rename = "already filled")]
    AlreadyFilled,
    #[serde(rename = "no resume file stored")]
    NoResumeStored,
    #[serde(rename = "no matching option")]
    NoMatchingOption,
    #[serde(rename = "unsupported control")]
    UnsupportedControl,
    #[serde(rename = "already answered")]
    AlreadyAnswered,
    #[serde(rename = "unrecognized question")]
    UnrecognizedQuestion,
    #[serde(rename = "no matching choice")]
    NoMatchingChoice,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NotVisible => "not visible",
            SkipReason::AlreadyFilled => "already filled",
            SkipReason::NoResumeStored => "no resume file stored",
            SkipReason::NoMatchingOption => "no matching option",
            SkipReason::UnsupportedControl => "unsupported control",
            SkipReason::AlreadyAnswered => "already answered",
            SkipReason::UnrecognizedQuestion => "unrecognized question",
            SkipReason::NoMatchingChoice => "no matching choice",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilledField {
    /// Classification tag, or `radio:<name>` for radio groups.
    pub field: String,
    pub pass: FillPass,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedField {
    pub field: String,
    pub pass: FillPass,
    pub reason: SkipReason,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    pub pass: FillPass,
    pub message: String,
}

/// Outcome of one fill invocation. Built fresh per run, never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub filled_fields: Vec<FilledField>,
    pub skipped_fields: Vec<SkippedField>,
    pub errors: Vec<FieldError>,
}

impl Default for FillResult {
    fn default() -> Self {
        Self::new()
    }
}

impl FillResult {
    pub fn new() -> Self {
        Self {
            success: true,
            error: None,
            filled_fields: Vec::new(),
            skipped_fields: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Whole-run failure; no field was touched.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::new()
        }
    }

    pub fn record_filled(&mut self, field: impl Into<String>, pass: FillPass, value: impl Into<String>) {
        self.filled_fields.push(FilledField {
            field: field.into(),
            pass,
            value: value.into(),
        });
    }

    pub fn record_skipped(&mut self, field: impl Into<String>, pass: FillPass, reason: SkipReason) {
        self.skipped_fields.push(SkippedField {
            field: field.into(),
            pass,
            reason,
        });
    }

    pub fn record_error(&mut self, field: impl Into<String>, pass: FillPass, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            pass,
            message: message.into(),
        });
    }

    /// Number of entries produced by one sub-pass.
    pub fn processed_in(&self, pass: FillPass) -> usize {
        self.filled_fields.iter().filter(|e| e.pass == pass).count()
            + self.skipped_fields.iter().filter(|e| e.pass == pass).count()
            + self.errors.iter().filter(|e| e.pass == pass).count()
    }

    pub fn total_processed(&self) -> usize {
        self.filled_fields.len() + self.skipped_fields.len() + self.errors.len()
    }
}
