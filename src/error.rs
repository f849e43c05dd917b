// src/error.rs
//! Errors surfaced by answer persistence.
//!
//! Everything else in the engine is total: malformed announcements are skipped
//! and "no eligible campaign" is an absent result, not an error.

use thiserror::Error;

/// Failure of the persisted answer store behind `exists` / `set`.
#[derive(Error, Debug)]
pub enum AnswerStoreError {
    /// Reading or writing the backing file failed.
    #[error("answer store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but does not hold a valid answer map.
    #[error("answer store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend-specific failure (custom stores, poisoned state, ...).
    #[error("answer store unavailable: {0}")]
    Unavailable(String),
}

impl AnswerStoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}
