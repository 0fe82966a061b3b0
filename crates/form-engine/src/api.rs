use std::sync::Arc;

use async_trait::async_trait;
use autofill_core_types::{FieldCatalog, FillResult, Profile};
use chrono::{Local, NaiveDate};

use crate::errors::EngineError;
use crate::policy::PacingPolicy;
use crate::ports::{DomPort, ResumeSource};
use crate::runner::{execute, RuntimeDeps};

#[async_trait]
pub trait FormFiller: Send + Sync {
    /// Fills every catalogued field from `profile`. Field-level failures are
    /// reported inside the result; only a missing profile fails the run.
    async fn fill(&self, profile: Option<&Profile>, catalog: &FieldCatalog) -> FillResult;
}

pub struct FormFillerBuilder {
    policy: PacingPolicy,
    dom: Option<Arc<dyn DomPort>>,
    resumes: Option<Arc<dyn ResumeSource>>,
    today: Option<NaiveDate>,
}

impl FormFillerBuilder {
    pub fn new(policy: PacingPolicy) -> Self {
        Self {
            policy,
            dom: None,
            resumes: None,
            today: None,
        }
    }

    pub fn with_dom(mut self, port: Arc<dyn DomPort>) -> Self {
        self.dom = Some(port);
        self
    }

    pub fn with_resumes(mut self, source: Arc<dyn ResumeSource>) -> Self {
        self.resumes = Some(source);
        self
    }

    /// Pins the date used for "currently working" experience arithmetic.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn build(self) -> Result<Arc<dyn FormFiller>, EngineError> {
        Ok(Arc::new(FormFillerImpl {
            policy: self.policy,
            dom: self.dom.ok_or(EngineError::MissingPort("dom"))?,
            resumes: self.resumes,
            today: self.today,
        }))
    }
}

struct FormFillerImpl {
    policy: PacingPolicy,
    dom: Arc<dyn DomPort>,
    resumes: Option<Arc<dyn ResumeSource>>,
    today: Option<NaiveDate>,
}

#[async_trait]
impl FormFiller for FormFillerImpl {
    async fn fill(&self, profile: Option<&Profile>, catalog: &FieldCatalog) -> FillResult {
        let runtime = RuntimeDeps {
            dom: self.dom.as_ref(),
            resumes: self.resumes.as_deref(),
            policy: &self.policy,
            today: self.today.unwrap_or_else(|| Local::now().date_naive()),
        };
        execute(profile, catalog, runtime).await
    }
}
