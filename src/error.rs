//! Typed failures of the prediction pipeline.
//!
//! Functions return [`anyhow::Result`]; callers that need to branch on the
//! failure kind recover it with `err.downcast_ref::<PipelineError>()`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Session {session} unavailable: {reason}")]
    SourceUnavailable { session: String, reason: String },

    #[error("Dataset is empty after joining {session} with the grid. Check data sources and driver codes")]
    EmptyDataset { session: String },

    #[error("Invalid grid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Model error: {reason}")]
    Model { reason: String },
}

impl PipelineError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        PipelineError::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub fn model(reason: impl std::fmt::Display) -> Self {
        PipelineError::Model {
            reason: reason.to_string(),
        }
    }
}
