use std::time::Duration;

use async_trait::async_trait;
use autofill_core_types::{ControlKind, CoreError, NodeId, ResumeFile};
use serde::{Deserialize, Serialize};

/// Events replayed on written controls so reactive frameworks notice the change.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomEvent {
    Input,
    Change,
    KeyDown,
    KeyUp,
    Blur,
    Click,
}

impl DomEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomEvent::Input => "input",
            DomEvent::Change => "change",
            DomEvent::KeyDown => "keydown",
            DomEvent::KeyUp => "keyup",
            DomEvent::Blur => "blur",
            DomEvent::Click => "click",
        }
    }
}

/// Transient visual state applied around a write.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Highlight {
    Pending,
    Filled,
    /// File input with no stored resume.
    MissingResume,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxRect {
    pub width: f64,
    pub height: f64,
}

/// Point-in-time view of one control.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementState {
    pub node: NodeId,
    pub tag_name: String,
    pub kind: ControlKind,
    pub value: String,
    pub checked: bool,
    pub options: Vec<SelectOption>,
    pub selected_index: Option<usize>,
    pub required: bool,
    pub disabled: bool,
    pub label: Option<String>,
    pub form: Option<NodeId>,
    pub style: ComputedStyle,
    pub rect: BoxRect,
}

impl ElementState {
    /// Hidden by computed style, or rendered with a collapsed box.
    pub fn is_visible(&self) -> bool {
        let hidden_style = self.style.display.eq_ignore_ascii_case("none")
            || self.style.visibility.eq_ignore_ascii_case("hidden");
        let collapsed = self.rect.width <= 0.0 && self.rect.height <= 0.0;
        !hidden_style && !collapsed
    }

    pub fn selected_option(&self) -> Option<&SelectOption> {
        self.selected_index.and_then(|idx| self.options.get(idx))
    }
}

/// Radio input as seen in a document snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioSnapshot {
    pub node: NodeId,
    pub name: String,
    pub value: String,
    pub checked: bool,
    pub form: Option<NodeId>,
    /// Text of the member's own `<label>`.
    pub label: Option<String>,
    pub aria_label: Option<String>,
    /// Legend of the enclosing `<fieldset>`.
    pub legend: Option<String>,
    /// Label found inside the nearest field container.
    pub container_label: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonSnapshot {
    pub node: NodeId,
    pub text: String,
    pub kind: String,
    pub visible: bool,
    pub disabled: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlSnapshot {
    pub node: NodeId,
    pub kind: ControlKind,
    pub label: Option<String>,
    pub name: Option<String>,
    pub value: String,
    pub checked: bool,
    pub required: bool,
    pub visible: bool,
}

/// Read-only view of the document, taken once per run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub radios: Vec<RadioSnapshot>,
    pub controls: Vec<ControlSnapshot>,
    pub buttons: Vec<ButtonSnapshot>,
    /// Multi-step progress text such as "Step 2 of 4".
    pub progress_text: Option<String>,
}

/// Decoded file ready to be placed in a file input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePayload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Narrow port onto the live page. A browser binding implements this in
/// production; `MemoryDom` implements it for headless runs.
#[async_trait]
pub trait DomPort: Send + Sync {
    async fn snapshot(&self) -> Result<DocumentSnapshot, CoreError>;
    async fn element_state(&self, node: NodeId) -> Result<ElementState, CoreError>;
    async fn scroll_into_view(&self, node: NodeId) -> Result<(), CoreError>;
    async fn focus(&self, node: NodeId) -> Result<(), CoreError>;
    /// Applies a visual state; `clear_after` asks the page to remove it later.
    async fn highlight(
        &self,
        node: NodeId,
        highlight: Highlight,
        clear_after: Option<Duration>,
    ) -> Result<(), CoreError>;
    /// Resets a framework value tracker. Returns false when none is attached.
    async fn reset_value_tracker(&self, node: NodeId) -> Result<bool, CoreError>;
    /// Assigns through the prototype-level `value` setter.
    async fn set_native_value(&self, node: NodeId, value: &str) -> Result<(), CoreError>;
    async fn select_index(&self, node: NodeId, index: usize) -> Result<(), CoreError>;
    async fn set_checked(&self, node: NodeId, checked: bool) -> Result<(), CoreError>;
    async fn set_files(&self, node: NodeId, files: Vec<FilePayload>) -> Result<(), CoreError>;
    async fn dispatch(&self, node: NodeId, event: DomEvent) -> Result<(), CoreError>;
}

/// Source of the cached resume record.
#[async_trait]
pub trait ResumeSource: Send + Sync {
    async fn load_resume(&self) -> Result<Option<ResumeFile>, CoreError>;
}

/// Resume source that always reports a fixed record (or none).
#[derive(Clone, Debug, Default)]
pub struct StaticResume(pub Option<ResumeFile>);

#[async_trait]
impl ResumeSource for StaticResume {
    async fn load_resume(&self) -> Result<Option<ResumeFile>, CoreError> {
        Ok(self.0.clone())
    }
}
