//! Multi-step application forms: progress parsing and the "next" button.

use autofill_core_types::{normalize_text, NodeId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::EngineError;
use crate::ports::{ButtonSnapshot, DocumentSnapshot, DomEvent, DomPort};

const ADVANCE_WORDS: &[&str] = &["next", "continue", "proceed", "review"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInfo {
    pub current: u32,
    pub total: u32,
}

/// Parses `Step X of Y` (or a bare `X of Y`) out of progress text.
pub fn parse_step_info(text: &str) -> Option<StepInfo> {
    let normalized = normalize_text(text);
    let words: Vec<&str> = normalized.split(' ').collect();
    words.windows(3).find_map(|window| {
        if window[1] != "of" {
            return None;
        }
        let current = window[0].parse::<u32>().ok()?;
        let total = window[2]
            .trim_end_matches(|c: char| !c.is_ascii_digit())
            .parse::<u32>()
            .ok()?;
        (1..=total).contains(&current).then_some(StepInfo { current, total })
    })
}

/// First visible, enabled button that moves forward without submitting.
pub fn find_advance_button(snapshot: &DocumentSnapshot) -> Option<&ButtonSnapshot> {
    snapshot.buttons.iter().find(|button| {
        let text = normalize_text(&button.text);
        button.visible
            && !button.disabled
            && !text.contains("submit")
            && ADVANCE_WORDS.iter().any(|word| text.contains(word))
    })
}

/// Clicks the advance button; `None` when the page has none.
pub async fn advance_step(dom: &dyn DomPort) -> Result<Option<NodeId>, EngineError> {
    let snapshot = dom.snapshot().await?;
    let Some(button) = find_advance_button(&snapshot) else {
        debug!("no advance button on page");
        return Ok(None);
    };
    dom.scroll_into_view(button.node).await?;
    dom.dispatch(button.node, DomEvent::Click).await?;
    info!(node = %button.node, text = %button.text, "advanced form step");
    Ok(Some(button.node))
}
