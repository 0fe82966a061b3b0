//! Command channel retry policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelPolicy {
    /// Attach-and-retry rounds after the first failed delivery.
    pub max_retries: u32,
    /// Wait after each attach before delivering again.
    pub attach_settle_ms: u64,
}

impl ChannelPolicy {
    pub fn attach_settle(&self) -> Duration {
        Duration::from_millis(self.attach_settle_ms)
    }
}

impl Default for ChannelPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            attach_settle_ms: 500,
        }
    }
}
