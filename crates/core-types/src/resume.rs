use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cached resume upload, stored by the control surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeFile {
    pub name: String,
    pub mime_type: String,
    #[serde(default)]
    pub size: u64,
    /// Data URL (`data:<mime>;base64,...`) or bare base64.
    pub encoded_data: String,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}
