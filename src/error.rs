//! Error types for the typed access layer.

use std::fmt;

use thiserror::Error;

/// Opaque failure raised by a SQL engine implementation.
///
/// Passed through to callers untouched; the layer never inspects or
/// translates it.
pub type EngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type returned by [`SqlEngine`](crate::SqlEngine) implementations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Database error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("engine error: {0}")]
    Engine(#[source] EngineError),

    #[error("not found: query returned no rows: {sql}")]
    NotFound { sql: String },

    #[error("row does not match the requested shape for '{sql}': {source}")]
    Decode {
        sql: String,
        #[source]
        source: DecodeError,
    },

    #[error("no plugin registered under global name '{global_object_name}'")]
    PluginNotRegistered { global_object_name: String },

    #[error(
        "plugin '{global_object_name}' registered with entry point '{found}', expected '{expected}'"
    )]
    EntryPointMismatch {
        global_object_name: String,
        expected: String,
        found: String,
    },

    #[error("failed to open database '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl Error {
    /// True for the Not-Found condition raised by `query_one`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a row could not be decoded into the requested type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DecodeError(String);

impl serde::de::Error for DecodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}
