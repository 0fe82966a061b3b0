//! Form autofill execution engine.
//!
//! Given a classified field catalog and an applicant profile, the engine
//! resolves a value per field and writes it through a [`DomPort`] in a way
//! reactive front-end frameworks accept, then handles file inputs and
//! radio-button groups in dedicated passes.

pub mod api;
pub mod checklist;
pub mod errors;
pub mod match_score;
pub mod memory;
pub mod policy;
pub mod ports;
pub mod radio;
pub mod resolver;
pub mod resume;
pub mod select;
pub mod steps;
pub mod writer;

mod runner;
mod tempo;

pub use api::{FormFiller, FormFillerBuilder};
pub use checklist::{build_checklist, Checklist, MissingControl};
pub use errors::EngineError;
pub use match_score::{match_score, MatchScore};
pub use memory::{FixtureElement, MemoryDom, PageFixture, RecordedEvent};
pub use policy::PacingPolicy;
pub use ports::{DomEvent, DomPort, Highlight, ResumeSource, StaticResume};
pub use steps::{advance_step, parse_step_info, StepInfo};
pub use writer::DomWriter;
