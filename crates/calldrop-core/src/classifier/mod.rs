//! Session classifier: turns one transcript into a structured verdict.
//!
//! The decision is an ordered list of guarded rules (see [`Rule`]). Each
//! rule reads the transcript, may settle part of the verdict, and leaves a
//! [`DecisionReason`] behind so callers can audit why a call was counted
//! the way it was.

mod rules;
mod transfer;
#[cfg(test)]
mod tests;

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

use crate::patterns::{PatternLibrary, PatternRole};

pub use rules::{Rule, RuleOutcome};
pub use transfer::classify_extension;

/// Subtype of a transfer drop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Flight data file (sbd/scd family)
    Flight,
    /// Science data file (tbd/tcd family)
    Science,
    /// Any other captured extension
    Other,
    /// No transfer drop, or a transfer drop whose file could not be found
    #[default]
    None,
}

impl TransferKind {
    /// Short label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            TransferKind::Flight => "flight",
            TransferKind::Science => "science",
            TransferKind::Other => "other",
            TransferKind::None => "none",
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How one call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Verdict {
    /// The call was ended deliberately
    pub intentional: bool,
    /// The vehicle stayed in its autonomous task for the whole call
    pub in_task: bool,
    /// The call dropped while a file transfer was running
    pub transfer_drop: bool,
    /// Subtype of the transfer drop
    pub transfer_kind: TransferKind,
}

impl Verdict {
    /// The call dropped unexpectedly
    pub fn is_drop(&self) -> bool {
        !self.intentional
    }

    /// A transfer drop whose file type could not be determined
    pub fn is_indeterminate_transfer(&self) -> bool {
        self.transfer_drop && self.transfer_kind == TransferKind::None
    }
}

/// Why a rule produced its outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionReason {
    /// Rule that ran
    pub rule: Rule,
    /// What the rule concluded
    pub outcome: RuleOutcome,
    /// Pattern entry that decided the outcome, if any
    pub pattern: Option<&'static str>,
    /// Matched text (truncated)
    pub matched_text: Option<String>,
}

impl DecisionReason {
    /// Create a reason without a pattern
    pub fn new(rule: Rule, outcome: RuleOutcome) -> Self {
        Self {
            rule,
            outcome,
            pattern: None,
            matched_text: None,
        }
    }

    /// Attach the deciding pattern and its matched text
    pub fn with_match(mut self, pattern: &'static str, text: &str) -> Self {
        self.pattern = Some(pattern);
        let text = text.trim();
        // Truncate to 200 chars
        let truncated = if text.len() > 200 {
            format!("{}...", &text[..text.floor_char_boundary(197)])
        } else {
            text.to_string()
        };
        self.matched_text = Some(truncated);
        self
    }
}

/// Full classifier output for one transcript
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// The verdict
    #[serde(flatten)]
    pub verdict: Verdict,
    /// Last GPS fix printed during the call
    pub position: Option<String>,
    /// One reason per rule, in evaluation order
    pub reasons: Vec<DecisionReason>,
}

/// The verdict contradicts itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyViolation {
    /// What contradicts what
    pub detail: String,
    /// The offending verdict
    pub verdict: Verdict,
}

/// Applies the pattern library to transcripts
#[derive(Debug, Clone, Copy)]
pub struct SessionClassifier<'a> {
    library: &'a PatternLibrary,
}

impl SessionClassifier<'static> {
    /// Classifier over the built-in pattern library
    pub fn new() -> Self {
        Self::with_library(PatternLibrary::global())
    }
}

impl Default for SessionClassifier<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> SessionClassifier<'a> {
    /// Classifier over a specific library
    pub fn with_library(library: &'a PatternLibrary) -> Self {
        Self { library }
    }

    /// Library in use
    pub fn library(&self) -> &'a PatternLibrary {
        self.library
    }

    /// Classify one transcript.
    ///
    /// Pure and deterministic. Fails only when the rules produce a verdict
    /// that is both intentional and a transfer drop.
    pub fn classify(&self, text: &str) -> Result<Classification, ConsistencyViolation> {
        let normalized = normalize_line_endings(text);
        let text: &str = &normalized;
        let mut draft = rules::Draft::default();
        let mut reasons = Vec::with_capacity(Rule::ORDER.len());

        for rule in Rule::ORDER {
            reasons.push(rules::apply(rule, self.library, text, &mut draft));
        }

        let verdict = draft.finish();
        if verdict.intentional && verdict.transfer_drop {
            return Err(ConsistencyViolation {
                detail: "call ended intentionally but also dropped during a file transfer"
                    .to_string(),
                verdict,
            });
        }

        Ok(Classification {
            verdict,
            position: self.last_position(text),
            reasons,
        })
    }

    /// Last GPS fix in the transcript
    fn last_position(&self, text: &str) -> Option<String> {
        self.library
            .by_role(PatternRole::Position)
            .filter_map(|entry| entry.regex.captures_iter(text).last())
            .filter_map(|caps| {
                let end = caps.get(0)?.end();
                let fix = caps.get(1)?.as_str().to_string();
                Some((end, fix))
            })
            .max_by_key(|(end, _)| *end)
            .map(|(_, fix)| fix)
    }
}

/// Turn `\r\n` and lone `\r` into `\n`.
///
/// The termination commands are anchored on `\n` and the transfer check
/// reads the last line, so CRLF transcripts must be read the same way as
/// LF ones.
pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Classify with the built-in library
pub fn classify(text: &str) -> Result<Classification, ConsistencyViolation> {
    SessionClassifier::new().classify(text)
}
