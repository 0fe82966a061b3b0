use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pacing applied around every write so the user can follow the fill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PacingPolicy {
    /// Wait after scrolling and the "about to fill" highlight.
    pub pre_focus_ms: u64,
    /// Wait between focusing and writing.
    pub post_focus_ms: u64,
    /// Wait after a field completes, before the next one starts.
    pub inter_field_ms: u64,
    /// How long the "filled" highlight stays before the page clears it.
    pub highlight_clear_ms: u64,
    /// Framework settle delay before the trailing `blur`.
    pub blur_settle_ms: u64,
}

impl PacingPolicy {
    /// No waits at all; used by headless runs and tests.
    pub fn immediate() -> Self {
        Self {
            pre_focus_ms: 0,
            post_focus_ms: 0,
            inter_field_ms: 0,
            highlight_clear_ms: 0,
            blur_settle_ms: 0,
        }
    }

    pub fn pre_focus(&self) -> Duration {
        Duration::from_millis(self.pre_focus_ms)
    }

    pub fn post_focus(&self) -> Duration {
        Duration::from_millis(self.post_focus_ms)
    }

    pub fn inter_field(&self) -> Duration {
        Duration::from_millis(self.inter_field_ms)
    }

    pub fn highlight_clear(&self) -> Duration {
        Duration::from_millis(self.highlight_clear_ms)
    }

    pub fn blur_settle(&self) -> Duration {
        Duration::from_millis(self.blur_settle_ms)
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            pre_focus_ms: 120,
            post_focus_ms: 80,
            inter_field_ms: 150,
            highlight_clear_ms: 1500,
            blur_settle_ms: 50,
        }
    }
}
