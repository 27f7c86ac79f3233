//! Classification of glider Iridium call transcripts.
//!
//! Each terminal transcript is classified as intentionally ended or dropped,
//! with the vehicle's mission context and any file transfer that was cut
//! off. A deployment's verdicts reduce to dropped-call statistics.
//!
//! Everything here is synchronous and free of file I/O; callers hand over
//! text and get verdicts, diagnostics and errors back.

pub mod batch;
pub mod classifier;
pub mod clock;
pub mod diagnostics;
pub mod error;
pub mod patterns;
pub mod summary;

pub use batch::{
    analyze, BatchAnalyzer, BatchReport, FailurePolicy, SessionVerdict, Transcript, VerdictSet,
};
pub use classifier::{
    classify, normalize_line_endings, Classification, ConsistencyViolation, DecisionReason, Rule,
    RuleOutcome, SessionClassifier, TransferKind, Verdict,
};
pub use clock::estimate_close_time;
pub use diagnostics::Diagnostic;
pub use error::{AnalysisError, Result};
pub use patterns::{PatternEntry, PatternLibrary, PatternRole, PATTERN_LIBRARY_VERSION};
pub use summary::{summarize, BucketCounts, KindCounts, KindRates, StatValue, Summary};
