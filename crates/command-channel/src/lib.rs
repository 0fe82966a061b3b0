//! Request/response channel between the control surface and the engine
//! running inside a page.
//!
//! The page side may not be attached yet when a command is sent (fresh tab,
//! navigation, reload). [`CommandChannel::send`] attaches it on demand and
//! retries a bounded number of times with a fixed settle delay.

pub mod config;
pub mod transport;

use std::sync::Arc;

use async_trait::async_trait;
use autofill_core_types::{NodeId, Profile, RawFieldCatalog};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

pub use config::ChannelPolicy;
pub use transport::{CommandHandler, InProcessTransport};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillFormPayload {
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub fields: RawFieldCatalog,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickFillPayload {
    #[serde(default)]
    pub fields: RawFieldCatalog,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScorePayload {
    pub job_text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    pub question: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAnswerPayload {
    pub node: NodeId,
    pub answer: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAnswerPayload {
    pub question: String,
    pub answer: String,
}

/// Commands understood by the page-side engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Command {
    #[serde(rename = "FILL_FORM")]
    FillForm(FillFormPayload),
    #[serde(rename = "GET_STATUS")]
    GetStatus,
    #[serde(rename = "QUICK_FILL")]
    QuickFill(QuickFillPayload),
    #[serde(rename = "GET_MATCH_SCORE")]
    GetMatchScore(MatchScorePayload),
    #[serde(rename = "GENERATE_ANSWER")]
    GenerateAnswer(QuestionPayload),
    #[serde(rename = "INSERT_ANSWER")]
    InsertAnswer(InsertAnswerPayload),
    #[serde(rename = "SAVE_ANSWER")]
    SaveAnswer(SaveAnswerPayload),
    #[serde(rename = "GET_ANSWER_LIBRARY")]
    GetAnswerLibrary,
    #[serde(rename = "VALIDATE_FORM")]
    ValidateForm,
    #[serde(rename = "get_checklist")]
    GetChecklist,
    #[serde(rename = "advance_step")]
    AdvanceStep,
    #[serde(rename = "get_step_info")]
    GetStepInfo,
}

impl Command {
    /// Wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::FillForm(_) => "FILL_FORM",
            Command::GetStatus => "GET_STATUS",
            Command::QuickFill(_) => "QUICK_FILL",
            Command::GetMatchScore(_) => "GET_MATCH_SCORE",
            Command::GenerateAnswer(_) => "GENERATE_ANSWER",
            Command::InsertAnswer(_) => "INSERT_ANSWER",
            Command::SaveAnswer(_) => "SAVE_ANSWER",
            Command::GetAnswerLibrary => "GET_ANSWER_LIBRARY",
            Command::ValidateForm => "VALIDATE_FORM",
            Command::GetChecklist => "get_checklist",
            Command::AdvanceStep => "advance_step",
            Command::GetStepInfo => "get_step_info",
        }
    }
}

/// Request envelope crossing the page boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    pub req_id: Uuid,
    pub command: Command,
}

impl CommandRequest {
    pub fn new(command: Command) -> Self {
        Self {
            req_id: Uuid::new_v4(),
            command,
        }
    }
}

/// Response from the page side. Always carries `success`; failures carry `error`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub req_id: Uuid,
    pub success: bool,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResponse {
    pub fn ok(req_id: Uuid, data: serde_json::Value) -> Self {
        Self {
            req_id,
            success: true,
            data,
            error: None,
        }
    }

    pub fn failure(req_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            req_id,
            success: false,
            data: serde_json::Value::Null,
            error: Some(error.into()),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    /// No receiver in the target page; attaching may help.
    #[error("receiving end does not exist: {0}")]
    NotAttached(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("handler error: {0}")]
    Handler(String),
    #[error("message codec error: {0}")]
    Codec(String),
}

impl ChannelError {
    pub fn is_not_attached(&self) -> bool {
        matches!(self, ChannelError::NotAttached(_))
    }
}

impl From<serde_json::Error> for ChannelError {
    fn from(err: serde_json::Error) -> Self {
        ChannelError::Codec(err.to_string())
    }
}

pub type ChannelEventBus = broadcast::Sender<ChannelEvent>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ChannelEvent {
    Delivered {
        req_id: Uuid,
        command: String,
        attempts: u32,
    },
    AttachAttempted {
        attempt: u32,
        ok: bool,
    },
    Failed {
        req_id: Uuid,
        command: String,
        error: String,
    },
}

/// Delivery path into the page.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, request: &CommandRequest) -> Result<CommandResponse, ChannelError>;
    /// Installs the engine in the page. Must be idempotent.
    async fn attach(&self) -> Result<(), ChannelError>;
}

pub struct CommandChannel {
    transport: Arc<dyn Transport>,
    policy: ChannelPolicy,
    events: ChannelEventBus,
}

impl CommandChannel {
    pub fn new(transport: Arc<dyn Transport>, policy: ChannelPolicy, events: ChannelEventBus) -> Self {
        Self {
            transport,
            policy,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.events.subscribe()
    }

    /// Delivers `command`, attaching the page side on demand. After
    /// `max_retries` attach rounds the first delivery error is returned.
    #[instrument(skip_all, fields(command = command.name()))]
    pub async fn send(&self, command: Command) -> Result<CommandResponse, ChannelError> {
        let request = CommandRequest::new(command);
        let name = request.command.name();
        let mut first_error: Option<ChannelError> = None;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let err = match self.transport.deliver(&request).await {
                Ok(response) => {
                    debug!(attempt, "command delivered");
                    let _ = self.events.send(ChannelEvent::Delivered {
                        req_id: request.req_id,
                        command: name.to_string(),
                        attempts: attempt,
                    });
                    return Ok(response);
                }
                Err(err) => err,
            };

            let retries_used = attempt - 1;
            if !err.is_not_attached() || retries_used >= self.policy.max_retries {
                let err = match first_error {
                    Some(original) if err.is_not_attached() => original,
                    _ => err,
                };
                warn!(attempt, error = %err, "command delivery failed");
                let _ = self.events.send(ChannelEvent::Failed {
                    req_id: request.req_id,
                    command: name.to_string(),
                    error: err.to_string(),
                });
                return Err(err);
            }

            warn!(attempt, error = %err, "page side not attached; attaching");
            first_error.get_or_insert(err);
            let attached = self.transport.attach().await;
            if let Err(attach_err) = &attached {
                warn!(error = %attach_err, "attach failed");
            }
            let _ = self.events.send(ChannelEvent::AttachAttempted {
                attempt: retries_used + 1,
                ok: attached.is_ok(),
            });
            let settle = self.policy.attach_settle();
            if !settle.is_zero() {
                tokio::time::sleep(settle).await;
            }
        }
    }
}
