//! Structured diagnostics returned by the batch analyzer.
//!
//! The core never writes to a log. Callers receive these records and decide
//! where they go (tracing, an NDJSON file, a test assertion).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classifier::{DecisionReason, Verdict};

/// One diagnostic record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum Diagnostic {
    /// A transcript was classified
    Classified {
        id: String,
        open_time: DateTime<Utc>,
        verdict: Verdict,
        reasons: Vec<DecisionReason>,
    },
    /// A transfer drop whose file type could not be determined
    TransferIndeterminate { id: String },
    /// A transcript was left out of the verdict set
    Skipped { id: String, error: String },
}

impl Diagnostic {
    /// Identifier of the transcript the record is about
    pub fn transcript_id(&self) -> &str {
        match self {
            Diagnostic::Classified { id, .. }
            | Diagnostic::TransferIndeterminate { id }
            | Diagnostic::Skipped { id, .. } => id,
        }
    }
}
