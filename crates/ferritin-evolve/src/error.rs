//! Error types.
//!
//! Every failure carries the pipeline [`Stage`] it came from so callers can tell
//! a bad checkpoint key apart from a crashed search or an inconsistent result.

use strum::Display;
use thiserror::Error;

/// Pipeline stage that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    Registry,
    Load,
    Search,
    Format,
}

#[derive(Debug, Error)]
pub enum EvoError {
    /// Unknown checkpoint or expert name, or an invalid search configuration.
    #[error("[{stage}] configuration error: {reason}")]
    Configuration { stage: Stage, reason: String },

    /// Model store, network or weight failures.
    #[error("[load] failed to load `{identifier}`: {reason}")]
    ModelLoad { identifier: String, reason: String },

    /// The input sequence was rejected.
    #[error("[search] invalid input sequence: {0}")]
    SequenceFormat(String),

    /// The search engine failed internally.
    #[error("[search] directed evolution failed: {0}")]
    Evolution(String),

    /// Device memory or compute exhaustion. Never retried here.
    #[error("[{stage}] resource exhausted: {reason}")]
    ResourceExhausted { stage: Stage, reason: String },

    /// Search output inconsistent with the input.
    #[error("[format] inconsistent search result: {0}")]
    Format(String),
}

pub type Result<T> = std::result::Result<T, EvoError>;

impl EvoError {
    pub fn stage(&self) -> Stage {
        match self {
            EvoError::Configuration { stage, .. } => *stage,
            EvoError::ModelLoad { .. } => Stage::Load,
            EvoError::SequenceFormat(_) | EvoError::Evolution(_) => Stage::Search,
            EvoError::ResourceExhausted { stage, .. } => *stage,
            EvoError::Format(_) => Stage::Format,
        }
    }

    pub(crate) fn config(stage: Stage, reason: impl Into<String>) -> Self {
        EvoError::Configuration {
            stage,
            reason: reason.into(),
        }
    }

    pub(crate) fn model_load(identifier: &str, reason: impl ToString) -> Self {
        EvoError::ModelLoad {
            identifier: identifier.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Classify a runtime failure from the model backend. Allocation failures
    /// become [`EvoError::ResourceExhausted`]; anything else goes to `fallback`.
    pub(crate) fn from_runtime(
        stage: Stage,
        err: impl ToString,
        fallback: impl FnOnce(String) -> EvoError,
    ) -> Self {
        let reason = err.to_string();
        if is_out_of_memory(&reason) {
            EvoError::ResourceExhausted { stage, reason }
        } else {
            fallback(reason)
        }
    }
}

fn is_out_of_memory(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    ["out of memory", "out_of_memory", "failed to allocate"]
        .iter()
        .any(|needle| message.contains(needle))
}
