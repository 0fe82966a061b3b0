//! Page-side dispatcher: turns channel commands into engine calls.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use autofill_core_types::{FieldCatalog, Profile, RawFieldCatalog};
use command_channel::{ChannelError, Command, CommandHandler};
use form_engine::{
    advance_step, build_checklist, match_score, parse_step_info, DomPort, DomWriter,
    FormFillerBuilder, PacingPolicy,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::answers::{self, SavedAnswer};
use crate::storage::{self, LocalStore, StoredResume};

pub struct ContentHost {
    dom: Arc<dyn DomPort>,
    store: Arc<dyn LocalStore>,
    pacing: PacingPolicy,
}

impl ContentHost {
    pub fn new(dom: Arc<dyn DomPort>, store: Arc<dyn LocalStore>, pacing: PacingPolicy) -> Self {
        Self { dom, store, pacing }
    }

    #[instrument(skip_all, fields(command = command.name()))]
    pub async fn dispatch(&self, command: Command) -> Result<Value> {
        match command {
            Command::FillForm(payload) => self.fill(payload.profile, payload.fields).await,
            Command::QuickFill(payload) => {
                let profile = storage::load_profile(self.store.as_ref())
                    .await?
                    .ok_or_else(|| anyhow!("No saved profile; open the popup and save one first"))?;
                self.fill(Some(profile), payload.fields).await
            }
            Command::GetStatus => {
                let snapshot = self.dom.snapshot().await?;
                let field_count = snapshot.controls.iter().filter(|c| c.visible).count();
                Ok(json!({"ready": true, "fieldCount": field_count}))
            }
            Command::GetMatchScore(payload) => {
                let profile = storage::load_profile(self.store.as_ref())
                    .await?
                    .unwrap_or_default();
                Ok(serde_json::to_value(match_score(&profile, &payload.job_text))?)
            }
            Command::GenerateAnswer(payload) => {
                let profile = storage::load_profile(self.store.as_ref()).await?;
                let library = storage::answer_library(self.store.as_ref()).await?;
                let generated =
                    answers::generate_answer(profile.as_ref(), &library, &payload.question)
                        .ok_or_else(|| anyhow!("No saved answer or profile text to draw from"))?;
                Ok(serde_json::to_value(generated)?)
            }
            Command::InsertAnswer(payload) => {
                let writer = DomWriter::new(self.dom.as_ref(), self.pacing.blur_settle());
                writer
                    .write(payload.node, &payload.answer)
                    .await
                    .with_context(|| format!("Could not write answer into {}", payload.node))?;
                Ok(json!({"node": payload.node}))
            }
            Command::SaveAnswer(payload) => {
                let mut library = storage::answer_library(self.store.as_ref()).await?;
                answers::upsert(
                    &mut library,
                    SavedAnswer::new(payload.question, payload.answer),
                );
                storage::save_answer_library(self.store.as_ref(), &library).await?;
                Ok(json!({"count": library.len()}))
            }
            Command::GetAnswerLibrary => {
                let library = storage::answer_library(self.store.as_ref()).await?;
                Ok(json!({"answers": library}))
            }
            Command::ValidateForm | Command::GetChecklist => {
                let snapshot = self.dom.snapshot().await?;
                Ok(serde_json::to_value(build_checklist(&snapshot))?)
            }
            Command::AdvanceStep => {
                let clicked = advance_step(self.dom.as_ref())
                    .await?
                    .ok_or_else(|| anyhow!("No next or continue button found"))?;
                Ok(json!({"clicked": clicked}))
            }
            Command::GetStepInfo => {
                let snapshot = self.dom.snapshot().await?;
                let info = snapshot
                    .progress_text
                    .as_deref()
                    .and_then(parse_step_info)
                    .ok_or_else(|| anyhow!("Page shows no step progress"))?;
                Ok(serde_json::to_value(info)?)
            }
        }
    }

    async fn fill(&self, profile: Option<Profile>, fields: RawFieldCatalog) -> Result<Value> {
        let catalog = FieldCatalog::from_raw(fields);
        let filler = FormFillerBuilder::new(self.pacing.clone())
            .with_dom(self.dom.clone())
            .with_resumes(Arc::new(StoredResume(self.store.clone())))
            .build()?;
        let result = filler.fill(profile.as_ref(), &catalog).await;
        if !result.success {
            return Err(anyhow!(result
                .error
                .unwrap_or_else(|| "Fill failed".to_string())));
        }
        let filled = result.filled_fields.len() as u64;
        let total = storage::add_to_fill_count(self.store.as_ref(), filled).await?;
        info!(filled, total, "fill counted");
        Ok(serde_json::to_value(result)?)
    }
}

#[async_trait]
impl CommandHandler for ContentHost {
    async fn handle(&self, command: Command) -> Result<Value, ChannelError> {
        self.dispatch(command)
            .await
            .map_err(|err| ChannelError::Handler(format!("{err:#}")))
    }
}
