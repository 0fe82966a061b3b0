use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// The stored applicant profile. The engine only ever reads it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub personal_info: PersonalInfo,
    /// Most recent position first.
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Skills,
    pub preferences: Preferences,
    pub cover_letter: Option<String>,
    pub professional_summary: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub portfolio: Option<String>,
    pub website: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    /// `YYYY-MM` or `YYYY-MM-DD`.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub current: bool,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub school: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub start_date: Option<String>,
    pub graduation_date: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub gpa: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Skills {
    /// Category name to skill list, e.g. `languages -> [Rust, Go]`, in the
    /// order the profile lists them.
    pub technical: IndexMap<String, Vec<String>>,
    pub soft: Vec<String>,
}

impl Skills {
    /// Every technical skill followed by the soft skills, in stored order.
    pub fn flatten(&self) -> Vec<&str> {
        self.technical
            .values()
            .flatten()
            .chain(self.soft.iter())
            .map(String::as_str)
            .filter(|skill| !skill.trim().is_empty())
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    #[serde(deserialize_with = "text_or_number")]
    pub salary_expectation: Option<String>,
    pub notice_period: Option<String>,
    pub job_types: Vec<String>,
    pub work_arrangement: Vec<String>,
    pub sponsorship_required: Option<bool>,
    pub willing_to_relocate: Option<bool>,
    pub work_authorized: Option<bool>,
    pub remote_preferred: Option<bool>,
    /// `yes`, `no`, `decline` or free text; booleans are accepted on input.
    #[serde(deserialize_with = "choice_text")]
    pub veteran: Option<String>,
    #[serde(deserialize_with = "choice_text")]
    pub disability: Option<String>,
    pub gender: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Text(text)) => Some(text),
        Some(Loose::Number(number)) => Some(number.to_string()),
        Some(Loose::Flag(flag)) => Some(flag.to_string()),
        None => None,
    })
}

fn choice_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Text(text)) => Some(text),
        Some(Loose::Flag(true)) => Some("yes".to_string()),
        Some(Loose::Flag(false)) => Some("no".to_string()),
        Some(Loose::Number(number)) => Some(number.to_string()),
        None => None,
    })
}
