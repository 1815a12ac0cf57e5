//! Crate-level error type
//!
//! Each component keeps its own error enum next to the code that raises it.
//! [`PipelineError`] wraps them so a run fails with one typed error, and maps
//! each failure to a stable [`ErrorCode`] an orchestrator can act on.

use crate::issues::DataIssue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable failure categories reported to callers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    DataLoad,
    Configuration,
    StoreKeyMissing,
    InvalidRouteDraft,
    GeoIndex,
    StrictMode,
    Internal,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Data load failed: {0}")]
    DataLoad(#[from] crate::loader::DataLoadError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Route draft rejected: {0}")]
    RouteDraft(#[from] crate::model::RouteDraftError),

    #[error("Geo index error: {0}")]
    GeoIndex(#[from] crate::geo::GeoIndexError),

    #[error("Strict mode: {} data issue(s), first: {}", issues.len(), first_issue(issues))]
    StrictModeViolation { issues: Vec<DataIssue> },
}

fn first_issue(issues: &[DataIssue]) -> String {
    issues
        .first()
        .map(|issue| truncate_message(&issue.to_string()))
        .unwrap_or_else(|| "none".to_string())
}

impl PipelineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PipelineError::DataLoad(_) => ErrorCode::DataLoad,
            PipelineError::Config(_) => ErrorCode::Configuration,
            PipelineError::Store(crate::store::StoreError::KeyMissing { .. }) => {
                ErrorCode::StoreKeyMissing
            }
            PipelineError::Store(_) => ErrorCode::Internal,
            PipelineError::RouteDraft(_) => ErrorCode::InvalidRouteDraft,
            PipelineError::GeoIndex(_) => ErrorCode::GeoIndex,
            PipelineError::StrictModeViolation { .. } => ErrorCode::StrictMode,
        }
    }

    /// Whether rerunning the whole pipeline could succeed without input changes
    ///
    /// Only I/O failures while reading sources qualify; everything else is
    /// deterministic in its inputs.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::DataLoad(crate::loader::DataLoadError::Io { .. })
        )
    }

    pub fn strict_mode_violation(issues: Vec<DataIssue>) -> Self {
        Self::StrictModeViolation { issues }
    }
}

/// Cap a message at 500 bytes on a char boundary
pub(crate) fn truncate_message(message: &str) -> String {
    const LIMIT: usize = 500;
    const SUFFIX: &str = "...[truncated]";

    if message.len() <= LIMIT {
        return message.to_string();
    }

    let mut end = LIMIT - SUFFIX.len();
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &message[..end], SUFFIX)
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
