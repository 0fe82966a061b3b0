use autofill_core_types::{CoreError, NodeId};
use tokio::time::{sleep, Duration};

use crate::policy::PacingPolicy;
use crate::ports::{DomPort, Highlight};

/// Suspends the current field; zero durations return immediately.
pub async fn pause(duration: Duration) {
    if !duration.is_zero() {
        sleep(duration).await;
    }
}

/// Visible pacing around a single write.
pub struct Pacer<'a> {
    dom: &'a dyn DomPort,
    policy: &'a PacingPolicy,
}

impl<'a> Pacer<'a> {
    pub fn new(dom: &'a dyn DomPort, policy: &'a PacingPolicy) -> Self {
        Self { dom, policy }
    }

    /// Scroll, mark as pending, wait, focus, wait.
    pub async fn before_write(&self, node: NodeId) -> Result<(), CoreError> {
        self.dom.scroll_into_view(node).await?;
        self.dom.highlight(node, Highlight::Pending, None).await?;
        pause(self.policy.pre_focus()).await;
        self.dom.focus(node).await?;
        pause(self.policy.post_focus()).await;
        Ok(())
    }

    /// Mark as filled (self-clearing) and hold the inter-field delay.
    pub async fn after_write(&self, node: NodeId) -> Result<(), CoreError> {
        self.dom
            .highlight(
                node,
                Highlight::Filled,
                Some(self.policy.highlight_clear()),
            )
            .await?;
        pause(self.policy.inter_field()).await;
        Ok(())
    }
}
