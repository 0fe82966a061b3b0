use std::collections::HashSet;
use std::time::Instant;

use autofill_core_types::{
    is_similar_value, normalize_text, ClassificationTag, ClassifiedField, ControlKind,
    FieldCatalog, FieldCategory, FillPass, FillResult, NodeId, Profile, ResumeFile, SkipReason,
};
use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::errors::EngineError;
use crate::policy::PacingPolicy;
use crate::ports::{DomPort, ElementState, ResumeSource};
use crate::radio::{decide_choice, discover_groups, pick_member, RadioGroup};
use crate::resolver::{resolve, ResolveContext, Resolution};
use crate::resume::{attach_resume, AttachOutcome};
use crate::select::match_option;
use crate::tempo::Pacer;
use crate::writer::DomWriter;

pub struct RuntimeDeps<'a> {
    pub dom: &'a dyn DomPort,
    pub resumes: Option<&'a dyn ResumeSource>,
    pub policy: &'a PacingPolicy,
    pub today: NaiveDate,
}

enum FieldOutcome {
    Filled(String),
    Skipped(SkipReason),
    /// Handled by the resume or radio sub-pass; not counted here.
    Deferred,
    /// Resolver had nothing to write; the field is never visited.
    NotVisited,
}

struct Run<'a> {
    profile: &'a Profile,
    deps: &'a RuntimeDeps<'a>,
    writer: DomWriter<'a>,
    pacer: Pacer<'a>,
}

#[instrument(skip_all, fields(fields = catalog.len()))]
pub async fn execute(
    profile: Option<&Profile>,
    catalog: &FieldCatalog,
    deps: RuntimeDeps<'_>,
) -> FillResult {
    let Some(profile) = profile else {
        warn!("fill requested without a profile");
        return FillResult::failed("No profile data provided");
    };

    let started = Instant::now();
    let run = Run {
        profile,
        deps: &deps,
        writer: DomWriter::new(deps.dom, deps.policy.blur_settle()),
        pacer: Pacer::new(deps.dom, deps.policy),
    };
    let mut result = FillResult::new();
    let resume = load_resume(deps.resumes).await;

    for rejected in catalog.rejected() {
        let pass = match rejected.category {
            Some(FieldCategory::Resume) => FillPass::ResumeFiles,
            Some(category) => FillPass::Category(category),
            None => FillPass::Catalog,
        };
        warn!(field = %rejected.classification, error = %rejected.reason, "field rejected");
        result.record_error(&rejected.classification, pass, rejected.reason.to_string());
    }

    for category in FieldCategory::ORDER {
        if category == FieldCategory::Resume {
            continue;
        }
        let pass = FillPass::Category(category);
        for field in catalog.fields(category) {
            let tag = field.classification.as_str();
            match run.fill_field(field).await {
                Ok(FieldOutcome::Filled(value)) => {
                    debug!(field = tag, "filled");
                    result.record_filled(tag, pass, value);
                }
                Ok(FieldOutcome::Skipped(reason)) => {
                    debug!(field = tag, %reason, "skipped");
                    result.record_skipped(tag, pass, reason);
                }
                Ok(FieldOutcome::Deferred) | Ok(FieldOutcome::NotVisited) => {}
                Err(err) => {
                    warn!(field = tag, error = %err, "field failed");
                    result.record_error(tag, pass, err.to_string());
                }
            }
        }
    }

    run.resume_pass(catalog, resume.as_ref(), &mut result).await;
    run.radio_pass(catalog, &mut result).await;

    info!(
        filled = result.filled_fields.len(),
        skipped = result.skipped_fields.len(),
        errors = result.errors.len(),
        latency_ms = started.elapsed().as_millis() as u64,
        "fill run finished"
    );
    result
}

async fn load_resume(source: Option<&dyn ResumeSource>) -> Option<ResumeFile> {
    let source = source?;
    match source.load_resume().await {
        Ok(resume) => resume,
        Err(err) => {
            warn!(error = %err, "could not load cached resume");
            None
        }
    }
}

impl<'a> Run<'a> {
    async fn fill_field(&self, field: &ClassifiedField) -> Result<FieldOutcome, EngineError> {
        match field.kind {
            ControlKind::Radio => return Ok(FieldOutcome::Deferred),
            ControlKind::File if field.classification == ClassificationTag::Resume => {
                return Ok(FieldOutcome::Deferred)
            }
            ControlKind::File => return Ok(FieldOutcome::Skipped(SkipReason::UnsupportedControl)),
            _ => {}
        }

        let ctx = ResolveContext {
            today: self.deps.today,
            kind: field.kind,
        };
        let resolution = resolve(self.profile, field.classification, &ctx)?;
        if resolution == Resolution::Nothing {
            return Ok(FieldOutcome::NotVisited);
        }

        let state = self.deps.dom.element_state(field.element).await?;
        if !state.is_visible() {
            return Ok(FieldOutcome::Skipped(SkipReason::NotVisible));
        }

        match (field.kind, resolution) {
            (ControlKind::Checkbox, Resolution::Checked(wanted)) => {
                self.fill_checkbox(&state, wanted).await
            }
            (ControlKind::Checkbox, Resolution::Text(text)) => match truthy(&text) {
                Some(wanted) => self.fill_checkbox(&state, wanted).await,
                None => Ok(FieldOutcome::Skipped(SkipReason::UnsupportedControl)),
            },
            (kind, Resolution::Checked(flag)) => {
                let text = if flag { "Yes" } else { "No" };
                self.fill_value(kind, &state, text).await
            }
            (kind, Resolution::Text(text)) => self.fill_value(kind, &state, &text).await,
            (_, Resolution::Nothing) => Ok(FieldOutcome::NotVisited),
        }
    }

    async fn fill_value(
        &self,
        kind: ControlKind,
        state: &ElementState,
        target: &str,
    ) -> Result<FieldOutcome, EngineError> {
        if kind == ControlKind::Select {
            return self.fill_select(state, target).await;
        }
        if !state.value.trim().is_empty() && is_similar_value(&state.value, target) {
            return Ok(FieldOutcome::Skipped(SkipReason::AlreadyFilled));
        }
        self.pacer.before_write(state.node).await?;
        self.writer.write(state.node, target).await?;
        self.pacer.after_write(state.node).await?;
        Ok(FieldOutcome::Filled(target.to_string()))
    }

    async fn fill_select(
        &self,
        state: &ElementState,
        target: &str,
    ) -> Result<FieldOutcome, EngineError> {
        if let Some(current) = state.selected_option() {
            let holds_target = !current.value.trim().is_empty()
                && (is_similar_value(&current.value, target)
                    || is_similar_value(&current.text, target));
            if holds_target {
                return Ok(FieldOutcome::Skipped(SkipReason::AlreadyFilled));
            }
        }
        let Some((index, rule)) = match_option(&state.options, target) else {
            warn!(node = %state.node, wanted = target, "no select option matched");
            return Ok(FieldOutcome::Skipped(SkipReason::NoMatchingOption));
        };
        debug!(node = %state.node, index, ?rule, "select option matched");
        self.pacer.before_write(state.node).await?;
        self.writer.commit_select(state.node, index).await?;
        self.pacer.after_write(state.node).await?;
        let chosen = state
            .options
            .get(index)
            .map(|opt| opt.text.trim().to_string())
            .unwrap_or_default();
        Ok(FieldOutcome::Filled(chosen))
    }

    async fn fill_checkbox(
        &self,
        state: &ElementState,
        wanted: bool,
    ) -> Result<FieldOutcome, EngineError> {
        if state.checked == wanted {
            return Ok(FieldOutcome::Skipped(SkipReason::AlreadyFilled));
        }
        self.pacer.before_write(state.node).await?;
        self.writer.check(state.node, wanted).await?;
        self.pacer.after_write(state.node).await?;
        Ok(FieldOutcome::Filled(wanted.to_string()))
    }

    async fn resume_pass(
        &self,
        catalog: &FieldCatalog,
        resume: Option<&ResumeFile>,
        result: &mut FillResult,
    ) {
        let pass = FillPass::ResumeFiles;
        let mut seen: HashSet<NodeId> = HashSet::new();
        let targets = catalog.iter().filter(|(category, field)| {
            *category == FieldCategory::Resume
                || (field.kind == ControlKind::File
                    && field.classification == ClassificationTag::Resume)
        });
        for (_, field) in targets {
            if !seen.insert(field.element) {
                continue;
            }
            let tag = field.classification.as_str();
            if field.kind != ControlKind::File {
                result.record_skipped(tag, pass, SkipReason::UnsupportedControl);
                continue;
            }
            match attach_resume(self.deps.dom, field.element, resume).await {
                Ok(AttachOutcome::Attached { name, bytes }) => {
                    info!(file = %name, bytes, "resume attached");
                    result.record_filled(tag, pass, name);
                }
                Ok(AttachOutcome::Flagged) => {
                    result.record_skipped(tag, pass, SkipReason::NoResumeStored);
                }
                Err(err) => {
                    warn!(error = %err, "resume attach failed");
                    result.record_error(tag, pass, err.to_string());
                }
            }
        }
    }

    async fn radio_pass(&self, catalog: &FieldCatalog, result: &mut FillResult) {
        let pass = FillPass::RadioGroups;
        let snapshot = match self.deps.dom.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "document snapshot failed; radio pass skipped");
                result.record_error("radio:*", pass, err.to_string());
                return;
            }
        };
        let scope = self.radio_scope(catalog).await;
        for group in discover_groups(&snapshot, scope) {
            let field = format!("radio:{}", group.name);
            match self.answer_group(&group).await {
                Ok(FieldOutcome::Filled(value)) => result.record_filled(field, pass, value),
                Ok(FieldOutcome::Skipped(reason)) => result.record_skipped(field, pass, reason),
                Ok(FieldOutcome::Deferred) | Ok(FieldOutcome::NotVisited) => {}
                Err(err) => {
                    warn!(group = %group.name, error = %err, "radio group failed");
                    result.record_error(field, pass, err.to_string());
                }
            }
        }
    }

    /// The form enclosing the catalog's first field, if any.
    async fn radio_scope(&self, catalog: &FieldCatalog) -> Option<NodeId> {
        let (_, first) = catalog.iter().next()?;
        match self.deps.dom.element_state(first.element).await {
            Ok(state) => state.form,
            Err(_) => None,
        }
    }

    async fn answer_group(&self, group: &RadioGroup) -> Result<FieldOutcome, EngineError> {
        if group.has_checked_member() {
            return Ok(FieldOutcome::Skipped(SkipReason::AlreadyAnswered));
        }
        let Some(choice) = decide_choice(&group.inferred_label, &self.profile.preferences) else {
            debug!(group = %group.name, label = %group.inferred_label, "unrecognized radio question");
            return Ok(FieldOutcome::Skipped(SkipReason::UnrecognizedQuestion));
        };
        let Some(member) = pick_member(group, &choice) else {
            return Ok(FieldOutcome::Skipped(SkipReason::NoMatchingChoice));
        };
        debug!(group = %group.name, choice = choice.as_str(), node = %member.node, "answering radio group");
        self.deps.dom.scroll_into_view(member.node).await?;
        self.writer.check(member.node, true).await?;
        self.pacer.after_write(member.node).await?;
        let value = if member.value.is_empty() {
            member.label.clone().unwrap_or_default()
        } else {
            member.value.clone()
        };
        Ok(FieldOutcome::Filled(value))
    }
}

fn truthy(text: &str) -> Option<bool> {
    match normalize_text(text).as_str() {
        "yes" | "true" | "1" | "on" | "checked" => Some(true),
        "no" | "false" | "0" | "off" => Some(false),
        _ => None,
    }
}
