//! In-memory document used for headless runs and tests.
//!
//! Elements come from a JSON page fixture. Controls marked `tracked` carry a
//! model of a reactive framework's value tracker: an `input` or `change`
//! event only reaches the framework when the tracker disagrees with the
//! element value, which is the behavior the engine's write path has to
//! defeat.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use autofill_core_types::{ControlKind, CoreError, NodeId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::ports::{
    BoxRect, ButtonSnapshot, ComputedStyle, ControlSnapshot, DocumentSnapshot, DomEvent, DomPort,
    ElementState, FilePayload, Highlight, RadioSnapshot, SelectOption,
};

const EVENT_BUFFER: usize = 256;

/// Page description loaded by [`MemoryDom::from_fixture`].
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageFixture {
    pub elements: Vec<FixtureElement>,
    pub progress_text: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FixtureElement {
    pub id: u64,
    pub tag_name: String,
    #[serde(rename = "type")]
    pub input_type: Option<String>,
    pub name: Option<String>,
    pub value: String,
    pub checked: bool,
    pub options: Vec<SelectOption>,
    pub selected_index: Option<usize>,
    pub required: bool,
    pub disabled: bool,
    pub label: Option<String>,
    pub aria_label: Option<String>,
    pub legend: Option<String>,
    pub container_label: Option<String>,
    pub form: Option<u64>,
    pub display: String,
    pub visibility: String,
    pub width: f64,
    pub height: f64,
    /// Button caption.
    pub text: Option<String>,
    /// Attach a framework value tracker.
    pub tracked: bool,
}

impl Default for FixtureElement {
    fn default() -> Self {
        Self {
            id: 0,
            tag_name: "input".into(),
            input_type: None,
            name: None,
            value: String::new(),
            checked: false,
            options: Vec::new(),
            selected_index: None,
            required: false,
            disabled: false,
            label: None,
            aria_label: None,
            legend: None,
            container_label: None,
            form: None,
            display: "block".into(),
            visibility: "visible".into(),
            width: 120.0,
            height: 24.0,
            text: None,
            tracked: false,
        }
    }
}

/// Event observed on the in-memory document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedEvent {
    pub node: NodeId,
    pub event: DomEvent,
    /// Element value at dispatch time.
    pub value: String,
}

#[derive(Clone, Debug)]
struct Element {
    source: FixtureElement,
    kind: ControlKind,
    value: String,
    checked: bool,
    selected_index: Option<usize>,
    files: Vec<FilePayload>,
    /// Last value the framework saw; `None` means reset.
    tracker: Option<String>,
    /// Value held in framework state.
    framework_value: Option<String>,
    highlight: Option<Highlight>,
}

impl Element {
    fn new(source: FixtureElement) -> Self {
        let kind = ControlKind::from_parts(&source.tag_name, source.input_type.as_deref());
        let selected_index = match kind {
            ControlKind::Select => source.selected_index.or(if source.options.is_empty() {
                None
            } else {
                Some(0)
            }),
            _ => None,
        };
        let value = match selected_index.and_then(|idx| source.options.get(idx)) {
            Some(opt) => opt.value.clone(),
            None => source.value.clone(),
        };
        let (tracker, framework_value) = if source.tracked {
            (Some(value.clone()), Some(value.clone()))
        } else {
            (None, None)
        };
        Self {
            kind,
            checked: source.checked,
            selected_index,
            value,
            files: Vec::new(),
            tracker,
            framework_value,
            highlight: None,
            source,
        }
    }

    fn node(&self) -> NodeId {
        NodeId(self.source.id)
    }

    fn is_button(&self) -> bool {
        self.source.tag_name.eq_ignore_ascii_case("button")
            || matches!(
                self.source.input_type.as_deref(),
                Some("submit") | Some("button")
            )
    }

    fn style(&self) -> ComputedStyle {
        ComputedStyle {
            display: self.source.display.clone(),
            visibility: self.source.visibility.clone(),
        }
    }

    fn rect(&self) -> BoxRect {
        BoxRect {
            width: self.source.width,
            height: self.source.height,
        }
    }

    fn state(&self) -> ElementState {
        ElementState {
            node: self.node(),
            tag_name: self.source.tag_name.to_ascii_lowercase(),
            kind: self.kind,
            value: self.value.clone(),
            checked: self.checked,
            options: self.source.options.clone(),
            selected_index: self.selected_index,
            required: self.source.required,
            disabled: self.source.disabled,
            label: self.source.label.clone(),
            form: self.source.form.map(NodeId),
            style: self.style(),
            rect: self.rect(),
        }
    }

    /// Framework-side reaction to a value event.
    fn observe_value_event(&mut self) {
        if !self.source.tracked {
            return;
        }
        if self.tracker.as_deref() != Some(self.value.as_str()) {
            self.tracker = Some(self.value.clone());
            self.framework_value = Some(self.value.clone());
        }
    }
}

#[derive(Default)]
struct Page {
    order: Vec<NodeId>,
    elements: BTreeMap<NodeId, Element>,
    progress_text: Option<String>,
    events: Vec<RecordedEvent>,
    focused: Option<NodeId>,
    failing: HashSet<NodeId>,
}

impl Page {
    fn element(&self, node: NodeId) -> Result<&Element, CoreError> {
        self.elements
            .get(&node)
            .ok_or_else(|| CoreError::new(format!("no element {node}")))
    }

    fn writable(&mut self, node: NodeId) -> Result<&mut Element, CoreError> {
        if self.failing.contains(&node) {
            return Err(CoreError::new(format!("write to {node} rejected")));
        }
        self.elements
            .get_mut(&node)
            .ok_or_else(|| CoreError::new(format!("no element {node}")))
    }

    fn in_order(&self) -> impl Iterator<Item = &Element> {
        self.order.iter().filter_map(|node| self.elements.get(node))
    }
}

pub struct MemoryDom {
    page: RwLock<Page>,
    events_tx: broadcast::Sender<RecordedEvent>,
}

impl MemoryDom {
    pub fn new(fixture: PageFixture) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);
        let mut page = Page {
            progress_text: fixture.progress_text,
            ..Page::default()
        };
        for source in fixture.elements {
            let element = Element::new(source);
            let node = element.node();
            if page.elements.insert(node, element).is_none() {
                page.order.push(node);
            }
        }
        Self {
            page: RwLock::new(page),
            events_tx,
        }
    }

    pub fn from_fixture(json: &str) -> Result<Self, CoreError> {
        let fixture: PageFixture = serde_json::from_str(json)
            .map_err(|err| CoreError::new(format!("invalid page fixture: {err}")))?;
        Ok(Self::new(fixture))
    }

    /// Live feed of dispatched events, like a page-level listener.
    pub fn subscribe(&self) -> broadcast::Receiver<RecordedEvent> {
        self.events_tx.subscribe()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.page.read().events.clone()
    }

    pub fn events_for(&self, node: NodeId) -> Vec<DomEvent> {
        self.page
            .read()
            .events
            .iter()
            .filter(|rec| rec.node == node)
            .map(|rec| rec.event)
            .collect()
    }

    pub fn value(&self, node: NodeId) -> Option<String> {
        self.page.read().elements.get(&node).map(|el| el.value.clone())
    }

    pub fn is_checked(&self, node: NodeId) -> bool {
        self.page
            .read()
            .elements
            .get(&node)
            .map(|el| el.checked)
            .unwrap_or(false)
    }

    /// Value held by the modelled framework state, for tracked controls.
    pub fn framework_value(&self, node: NodeId) -> Option<String> {
        self.page
            .read()
            .elements
            .get(&node)
            .and_then(|el| el.framework_value.clone())
    }

    pub fn files(&self, node: NodeId) -> Vec<FilePayload> {
        self.page
            .read()
            .elements
            .get(&node)
            .map(|el| el.files.clone())
            .unwrap_or_default()
    }

    pub fn highlight_of(&self, node: NodeId) -> Option<Highlight> {
        self.page.read().elements.get(&node).and_then(|el| el.highlight)
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.page.read().focused
    }

    /// Makes every write to `node` fail.
    pub fn fail_writes_to(&self, node: NodeId) {
        self.page.write().failing.insert(node);
    }

    /// Simulates the user typing into a control.
    pub fn user_input(&self, node: NodeId, value: &str) -> Result<(), CoreError> {
        {
            let mut page = self.page.write();
            let element = page.writable(node)?;
            element.value = value.to_string();
        }
        self.record(node, DomEvent::Input)
    }

    fn record(&self, node: NodeId, event: DomEvent) -> Result<(), CoreError> {
        let recorded = {
            let mut page = self.page.write();
            let element = page
                .elements
                .get_mut(&node)
                .ok_or_else(|| CoreError::new(format!("no element {node}")))?;
            if matches!(event, DomEvent::Input | DomEvent::Change) {
                element.observe_value_event();
            }
            let recorded = RecordedEvent {
                node,
                event,
                value: element.value.clone(),
            };
            if event == DomEvent::Blur && page.focused == Some(node) {
                page.focused = None;
            }
            page.events.push(recorded.clone());
            recorded
        };
        // No subscribers is fine.
        let _ = self.events_tx.send(recorded);
        Ok(())
    }
}

#[async_trait]
impl DomPort for MemoryDom {
    async fn snapshot(&self) -> Result<DocumentSnapshot, CoreError> {
        let page = self.page.read();
        let mut snapshot = DocumentSnapshot {
            progress_text: page.progress_text.clone(),
            ..DocumentSnapshot::default()
        };
        for element in page.in_order() {
            let visible = element.state().is_visible();
            if element.is_button() {
                snapshot.buttons.push(ButtonSnapshot {
                    node: element.node(),
                    text: element
                        .source
                        .text
                        .clone()
                        .unwrap_or_else(|| element.value.clone()),
                    kind: element
                        .source
                        .input_type
                        .clone()
                        .unwrap_or_else(|| "submit".into()),
                    visible,
                    disabled: element.source.disabled,
                });
                continue;
            }
            if element.kind == ControlKind::Radio {
                snapshot.radios.push(RadioSnapshot {
                    node: element.node(),
                    name: element.source.name.clone().unwrap_or_default(),
                    value: element.value.clone(),
                    checked: element.checked,
                    form: element.source.form.map(NodeId),
                    label: element.source.label.clone(),
                    aria_label: element.source.aria_label.clone(),
                    legend: element.source.legend.clone(),
                    container_label: element.source.container_label.clone(),
                });
            }
            snapshot.controls.push(ControlSnapshot {
                node: element.node(),
                kind: element.kind,
                label: element
                    .source
                    .label
                    .clone()
                    .or_else(|| element.source.aria_label.clone()),
                name: element.source.name.clone(),
                value: element.value.clone(),
                checked: element.checked,
                required: element.source.required,
                visible,
            });
        }
        Ok(snapshot)
    }

    async fn element_state(&self, node: NodeId) -> Result<ElementState, CoreError> {
        Ok(self.page.read().element(node)?.state())
    }

    async fn scroll_into_view(&self, node: NodeId) -> Result<(), CoreError> {
        self.page.read().element(node)?;
        Ok(())
    }

    async fn focus(&self, node: NodeId) -> Result<(), CoreError> {
        let mut page = self.page.write();
        page.element(node)?;
        page.focused = Some(node);
        Ok(())
    }

    async fn highlight(
        &self,
        node: NodeId,
        highlight: Highlight,
        _clear_after: Option<Duration>,
    ) -> Result<(), CoreError> {
        let mut page = self.page.write();
        let element = page
            .elements
            .get_mut(&node)
            .ok_or_else(|| CoreError::new(format!("no element {node}")))?;
        element.highlight = Some(highlight);
        Ok(())
    }

    async fn reset_value_tracker(&self, node: NodeId) -> Result<bool, CoreError> {
        let mut page = self.page.write();
        let element = page.writable(node)?;
        if !element.source.tracked {
            return Ok(false);
        }
        element.tracker = None;
        Ok(true)
    }

    async fn set_native_value(&self, node: NodeId, value: &str) -> Result<(), CoreError> {
        let mut page = self.page.write();
        let element = page.writable(node)?;
        element.value = value.to_string();
        Ok(())
    }

    async fn select_index(&self, node: NodeId, index: usize) -> Result<(), CoreError> {
        let mut page = self.page.write();
        let element = page.writable(node)?;
        if element.kind != ControlKind::Select {
            return Err(CoreError::new(format!("{node} is not a select")));
        }
        let option = element
            .source
            .options
            .get(index)
            .ok_or_else(|| CoreError::new(format!("{node} has no option {index}")))?;
        element.value = option.value.clone();
        element.selected_index = Some(index);
        Ok(())
    }

    async fn set_checked(&self, node: NodeId, checked: bool) -> Result<(), CoreError> {
        let mut page = self.page.write();
        let (kind, name, form) = {
            let element = page.writable(node)?;
            element.checked = checked;
            (element.kind, element.source.name.clone(), element.source.form)
        };
        if kind == ControlKind::Radio && checked {
            for (other_node, other) in page.elements.iter_mut() {
                if *other_node != node
                    && other.kind == ControlKind::Radio
                    && other.source.name == name
                    && other.source.form == form
                {
                    other.checked = false;
                }
            }
        }
        Ok(())
    }

    async fn set_files(&self, node: NodeId, files: Vec<FilePayload>) -> Result<(), CoreError> {
        let mut page = self.page.write();
        let element = page.writable(node)?;
        if element.kind != ControlKind::File {
            return Err(CoreError::new(format!("{node} is not a file input")));
        }
        element.value = files
            .first()
            .map(|file| format!("C:\\fakepath\\{}", file.name))
            .unwrap_or_default();
        element.files = files;
        Ok(())
    }

    async fn dispatch(&self, node: NodeId, event: DomEvent) -> Result<(), CoreError> {
        self.record(node, event)
    }
}
