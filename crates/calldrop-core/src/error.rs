//! Error types shared by the classifier, batch analyzer and aggregator.

use thiserror::Error;

/// Error type for analysis operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The transcript could not be read as text
    #[error("cannot read transcript {id}: {reason}")]
    Input { id: String, reason: String },

    /// A verdict claims both an intentional end and a transfer drop
    #[error("inconsistent verdict for {id}: {detail}")]
    Consistency { id: String, detail: String },

    /// Drops and intentional ends of a bucket do not add up to its total
    #[error(
        "{bucket} counts do not add up: {drops} drops + {intentional} intentional != {total} calls"
    )]
    CountMismatch {
        bucket: &'static str,
        drops: usize,
        intentional: usize,
        total: usize,
    },

    /// Transcripts were not handed over in ascending open-time order
    #[error("transcript {id} opens before the preceding transcript {previous}")]
    OutOfOrder { id: String, previous: String },
}

impl AnalysisError {
    /// Whether this error points at a classifier or pattern-table defect
    /// rather than at an unreadable input
    pub fn is_internal(&self) -> bool {
        !matches!(self, AnalysisError::Input { .. })
    }

    /// Identifier of the transcript involved, if any
    pub fn transcript_id(&self) -> Option<&str> {
        match self {
            AnalysisError::Input { id, .. }
            | AnalysisError::Consistency { id, .. }
            | AnalysisError::OutOfOrder { id, .. } => Some(id),
            AnalysisError::CountMismatch { .. } => None,
        }
    }
}

/// Result alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
