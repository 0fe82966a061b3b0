//! Radio group discovery and answer selection.
//!
//! Groups are rebuilt from the run's document snapshot. The question text
//! is matched against a fixed keyword set; any group mentioning a keyword is
//! treated as that question, which can misfire on unrelated labels.

use autofill_core_types::{normalize_text, NodeId, Preferences};

use crate::ports::{DocumentSnapshot, RadioSnapshot};

/// Radios sharing a `name`, in document order.
#[derive(Clone, Debug, PartialEq)]
pub struct RadioGroup {
    pub name: String,
    pub members: Vec<RadioSnapshot>,
    pub inferred_label: String,
}

impl RadioGroup {
    pub fn has_checked_member(&self) -> bool {
        self.members.iter().any(|member| member.checked)
    }
}

/// Intended answer for a group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RadioChoice {
    Yes,
    No,
    Decline,
    /// Free-text answer such as a gender value.
    Text(String),
}

impl RadioChoice {
    fn from_flag(flag: Option<bool>) -> Option<Self> {
        flag.map(|f| if f { RadioChoice::Yes } else { RadioChoice::No })
    }

    fn from_text(raw: Option<&String>) -> Option<Self> {
        let normalized = normalize_text(raw?);
        if normalized.is_empty() {
            return None;
        }
        Some(match normalized.as_str() {
            "yes" | "true" => RadioChoice::Yes,
            "no" | "false" => RadioChoice::No,
            text if DECLINE_SYNONYMS.iter().any(|syn| text.contains(syn)) => RadioChoice::Decline,
            _ => RadioChoice::Text(normalized),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            RadioChoice::Yes => "yes",
            RadioChoice::No => "no",
            RadioChoice::Decline => "decline",
            RadioChoice::Text(text) => text,
        }
    }
}

const YES_SYNONYMS: &[&str] = &["yes", "y", "true", "1"];
const NO_SYNONYMS: &[&str] = &["no", "n", "false", "0"];
const NO_PHRASES: &[&str] = &["i am not", "i do not", "i don't", "i will not", "not a "];
const DECLINE_SYNONYMS: &[&str] = &[
    "decline",
    "prefer not",
    "not wish",
    "don't wish",
    "do not wish",
    "choose not",
    "not to say",
    "not to answer",
    "not want to answer",
    "not to disclose",
];
const YES_PHRASES: &[&str] = &["i am ", "i have ", "i do ", "i will ", "i identify as "];

/// Groups radios by `name`, limited to `scope_form` when given.
pub fn discover_groups(snapshot: &DocumentSnapshot, scope_form: Option<NodeId>) -> Vec<RadioGroup> {
    let mut groups: Vec<RadioGroup> = Vec::new();
    for radio in &snapshot.radios {
        if radio.name.is_empty() {
            continue;
        }
        if scope_form.is_some() && radio.form != scope_form {
            continue;
        }
        match groups.iter_mut().find(|group| group.name == radio.name) {
            Some(group) => group.members.push(radio.clone()),
            None => groups.push(RadioGroup {
                name: radio.name.clone(),
                members: vec![radio.clone()],
                inferred_label: String::new(),
            }),
        }
    }
    for group in &mut groups {
        group.inferred_label = infer_label(&group.members);
    }
    groups
}

/// Legend, then container label, then the first member's aria-label.
pub fn infer_label(members: &[RadioSnapshot]) -> String {
    first_text(members, |m| m.legend.as_ref())
        .or_else(|| first_text(members, |m| m.container_label.as_ref()))
        .or_else(|| {
            members
                .first()
                .and_then(|m| m.aria_label.as_deref())
                .map(|t| t.trim().to_string())
        })
        .unwrap_or_default()
}

fn first_text<F>(members: &[RadioSnapshot], pick: F) -> Option<String>
where
    F: Fn(&RadioSnapshot) -> Option<&String>,
{
    members
        .iter()
        .filter_map(pick)
        .map(|text| text.trim())
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

/// Maps the question text onto a preference; unrecognized questions yield `None`.
pub fn decide_choice(label: &str, prefs: &Preferences) -> Option<RadioChoice> {
    let text = normalize_text(label);
    if text.is_empty() {
        return None;
    }
    if text.contains("sponsor") {
        RadioChoice::from_flag(prefs.sponsorship_required)
    } else if ["authorized", "authorised", "authorization", "legally", "eligible to work", "right to work"]
        .iter()
        .any(|kw| text.contains(kw))
    {
        RadioChoice::from_flag(prefs.work_authorized)
    } else if text.contains("relocat") {
        RadioChoice::from_flag(prefs.willing_to_relocate)
    } else if text.contains("remote") {
        RadioChoice::from_flag(prefs.remote_preferred)
    } else if text.contains("veteran") {
        RadioChoice::from_text(prefs.veteran.as_ref())
    } else if text.contains("disabilit") {
        RadioChoice::from_text(prefs.disability.as_ref())
    } else if text.contains("gender") {
        RadioChoice::from_text(prefs.gender.as_ref())
    } else {
        None
    }
}

/// First member whose value or label matches `choice`.
pub fn pick_member<'g>(group: &'g RadioGroup, choice: &RadioChoice) -> Option<&'g RadioSnapshot> {
    group.members.iter().find(|member| {
        [Some(&member.value), member.label.as_ref()]
            .into_iter()
            .flatten()
            .map(|text| normalize_text(text))
            .any(|text| member_matches(&text, choice))
    })
}

fn member_matches(text: &str, choice: &RadioChoice) -> bool {
    if text.is_empty() {
        return false;
    }
    match choice {
        RadioChoice::Yes => {
            YES_SYNONYMS.iter().any(|syn| word_prefix(text, syn))
                || (YES_PHRASES.iter().any(|p| text.starts_with(p))
                    && !text.contains(" not ")
                    && !text.contains("n't"))
        }
        RadioChoice::No => {
            NO_SYNONYMS.iter().any(|syn| word_prefix(text, syn))
                || (NO_PHRASES.iter().any(|p| text.contains(p)) && !is_decline(text))
        }
        RadioChoice::Decline => is_decline(text),
        RadioChoice::Text(wanted) => word_prefix(text, wanted),
    }
}

fn is_decline(text: &str) -> bool {
    DECLINE_SYNONYMS.iter().any(|syn| text.contains(syn))
}

/// `text` equals `word` or starts with it followed by a non-alphanumeric char.
fn word_prefix(text: &str, word: &str) -> bool {
    match text.strip_prefix(word) {
        Some(rest) => rest.chars().next().map_or(true, |c| !c.is_alphanumeric()),
        None => false,
    }
}
