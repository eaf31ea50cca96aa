//! Error types for luacloak

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ObfuscateError>;

#[derive(Error, Debug)]
pub enum ObfuscateError {
    #[error("empty input: source is empty or all whitespace")]
    EmptyInput,

    #[error("rename namespace exhausted: no free identifier up to length {length}")]
    NamespaceExhausted { length: usize },

    #[error("stage '{stage}' failed: {message}")]
    StageFailure {
        stage: &'static str,
        message: String,
    },

    #[error("options error: {0}")]
    Options(#[from] serde_json::Error),
}
