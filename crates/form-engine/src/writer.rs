//! Framework-safe element writes.
//!
//! Reactive UI libraries track the last value they rendered and shadow the
//! instance `value` setter. A write only sticks when it goes through the
//! prototype setter after the tracker has been reset, followed by the event
//! sequence those libraries listen for.

use autofill_core_types::NodeId;
use tokio::time::Duration;
use tracing::trace;

use crate::errors::EngineError;
use crate::ports::{DomEvent, DomPort};
use crate::tempo::pause;

/// Events replayed after a value assignment, before the settle delay.
pub const VALUE_EVENTS: [DomEvent; 4] = [
    DomEvent::Input,
    DomEvent::Change,
    DomEvent::KeyDown,
    DomEvent::KeyUp,
];

pub struct DomWriter<'a> {
    dom: &'a dyn DomPort,
    blur_settle: Duration,
}

impl<'a> DomWriter<'a> {
    pub fn new(dom: &'a dyn DomPort, blur_settle: Duration) -> Self {
        Self { dom, blur_settle }
    }

    /// Clears the control, assigns `value` and replays the event sequence.
    pub async fn write(&self, node: NodeId, value: &str) -> Result<(), EngineError> {
        self.dom.set_native_value(node, "").await?;
        let tracked = self.dom.reset_value_tracker(node).await?;
        trace!(%node, tracked, "writing value");
        self.dom.set_native_value(node, value).await?;
        self.replay(node).await
    }

    /// Commits an already chosen `<select>` option.
    pub async fn commit_select(&self, node: NodeId, index: usize) -> Result<(), EngineError> {
        self.dom.reset_value_tracker(node).await?;
        self.dom.select_index(node, index).await?;
        self.replay(node).await
    }

    /// Checkbox and radio path: `change` then a synthetic click.
    pub async fn check(&self, node: NodeId, checked: bool) -> Result<(), EngineError> {
        self.dom.set_checked(node, checked).await?;
        self.dom.dispatch(node, DomEvent::Change).await?;
        self.dom.dispatch(node, DomEvent::Click).await?;
        Ok(())
    }

    async fn replay(&self, node: NodeId) -> Result<(), EngineError> {
        for event in VALUE_EVENTS {
            self.dom.dispatch(node, event).await?;
        }
        pause(self.blur_settle).await;
        self.dom.dispatch(node, DomEvent::Blur).await?;
        Ok(())
    }
}
