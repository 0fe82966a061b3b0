use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{ChannelError, Command, CommandRequest, CommandResponse, Transport};

/// Page-side command dispatcher. [`ChannelError::Handler`] messages are
/// passed to the caller verbatim in the failure response.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, command: Command) -> Result<serde_json::Value, ChannelError>;
}

/// Transport whose page side lives in the same process. The handler only
/// receives messages once [`Transport::attach`] has installed it, and every
/// request crosses a JSON boundary the way a browser message would.
pub struct InProcessTransport {
    handler: Arc<dyn CommandHandler>,
    attached: AtomicBool,
    installs: AtomicUsize,
}

impl InProcessTransport {
    pub fn new(handler: Arc<dyn CommandHandler>) -> Arc<Self> {
        Arc::new(Self {
            handler,
            attached: AtomicBool::new(false),
            installs: AtomicUsize::new(0),
        })
    }

    /// Starts with the page side already installed.
    pub fn attached(handler: Arc<dyn CommandHandler>) -> Arc<Self> {
        let transport = Self::new(handler);
        transport.attached.store(true, Ordering::SeqCst);
        transport
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    /// Number of attaches that actually installed the page side.
    pub fn installs(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }

    /// Simulates navigation: the page side is gone until the next attach.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for InProcessTransport {
    async fn deliver(&self, request: &CommandRequest) -> Result<CommandResponse, ChannelError> {
        if !self.is_attached() {
            return Err(ChannelError::NotAttached(
                "could not establish connection".into(),
            ));
        }
        let wire = serde_json::to_string(request)?;
        let received: CommandRequest = serde_json::from_str(&wire)?;
        debug!(req_id = %received.req_id, command = received.command.name(), "dispatching");
        let response = match self.handler.handle(received.command).await {
            Ok(data) => CommandResponse::ok(received.req_id, data),
            Err(ChannelError::Handler(message)) => CommandResponse::failure(received.req_id, message),
            Err(err) => CommandResponse::failure(received.req_id, err.to_string()),
        };
        let wire = serde_json::to_string(&response)?;
        Ok(serde_json::from_str(&wire)?)
    }

    async fn attach(&self) -> Result<(), ChannelError> {
        if self.attached.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.installs.fetch_add(1, Ordering::SeqCst);
        info!("page side attached");
        Ok(())
    }
}
