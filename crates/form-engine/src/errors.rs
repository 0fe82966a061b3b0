use autofill_core_types::CoreError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum EngineError {
    #[error("dom port failure: {0}")]
    Dom(String),
    #[error("resume decode failed: {0}")]
    ResumeDecode(String),
    #[error("missing dependency: {0}")]
    MissingPort(&'static str),
    #[error(transparent)]
    Core(CoreError),
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Message { message } => EngineError::Dom(message),
            other => EngineError::Core(other),
        }
    }
}

impl From<base64::DecodeError> for EngineError {
    fn from(err: base64::DecodeError) -> Self {
        EngineError::ResumeDecode(err.to_string())
    }
}
