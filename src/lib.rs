//! Autofill command-line host.
//!
//! Exposes modules for integration testing

pub mod answers;
pub mod config;
pub mod host;
pub mod storage;

pub use config::{load_config, AutofillConfig};
pub use host::ContentHost;
pub use storage::{JsonFileStore, LocalStore, MemoryStore};
