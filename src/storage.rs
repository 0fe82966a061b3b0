//! Local key/value store holding the profile, cached resume, fill counter
//! and saved answers.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use autofill_core_types::{CoreError, Profile, ResumeFile};
use dashmap::DashMap;
use form_engine::ResumeSource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::answers::SavedAnswer;

pub const PROFILE_KEY: &str = "userProfile";
pub const RESUME_KEY: &str = "resumeFile";
pub const FILL_COUNT_KEY: &str = "fillCount";
pub const ANSWER_LIBRARY_KEY: &str = "answerLibrary";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed entry '{key}': {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// All entries in one JSON object file. Writes rewrite the whole file.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| StoreError::Codec {
            key: "*".into(),
            source,
        })
    }
}

#[async_trait]
impl LocalStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value);
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let body = serde_json::to_string_pretty(&entries).map_err(|source| StoreError::Codec {
            key: key.to_string(),
            source,
        })?;
        fs::write(&self.path, body).await.map_err(io_err)?;
        debug!(key, path = %self.path.display(), "store entry written");
        Ok(())
    }
}

async fn get_typed<T: DeserializeOwned>(
    store: &dyn LocalStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key).await? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| StoreError::Codec {
                key: key.to_string(),
                source,
            }),
    }
}

async fn set_typed<T: Serialize>(
    store: &dyn LocalStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(value).map_err(|source| StoreError::Codec {
        key: key.to_string(),
        source,
    })?;
    store.set(key, value).await
}

pub async fn load_profile(store: &dyn LocalStore) -> Result<Option<Profile>, StoreError> {
    get_typed(store, PROFILE_KEY).await
}

pub async fn save_profile(store: &dyn LocalStore, profile: &Profile) -> Result<(), StoreError> {
    set_typed(store, PROFILE_KEY, profile).await
}

pub async fn save_resume(store: &dyn LocalStore, resume: &ResumeFile) -> Result<(), StoreError> {
    set_typed(store, RESUME_KEY, resume).await
}

pub async fn fill_count(store: &dyn LocalStore) -> Result<u64, StoreError> {
    Ok(get_typed(store, FILL_COUNT_KEY).await?.unwrap_or(0))
}

/// Adds `filled` to the running counter and returns the new total.
pub async fn add_to_fill_count(store: &dyn LocalStore, filled: u64) -> Result<u64, StoreError> {
    let total = fill_count(store).await? + filled;
    set_typed(store, FILL_COUNT_KEY, &total).await?;
    Ok(total)
}

pub async fn answer_library(store: &dyn LocalStore) -> Result<Vec<SavedAnswer>, StoreError> {
    Ok(get_typed(store, ANSWER_LIBRARY_KEY).await?.unwrap_or_default())
}

pub async fn save_answer_library(
    store: &dyn LocalStore,
    library: &[SavedAnswer],
) -> Result<(), StoreError> {
    set_typed(store, ANSWER_LIBRARY_KEY, &library).await
}

/// Reads the cached resume record for the engine's resume pass.
pub struct StoredResume(pub Arc<dyn LocalStore>);

#[async_trait]
impl ResumeSource for StoredResume {
    async fn load_resume(&self) -> Result<Option<ResumeFile>, CoreError> {
        get_typed(self.0.as_ref(), RESUME_KEY)
            .await
            .map_err(|err| CoreError::new(err.to_string()))
    }
}
