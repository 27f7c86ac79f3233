use std::fmt;

use serde::Serialize;

use crate::patterns::{PatternLibrary, PatternRole};

use super::transfer;
use super::{DecisionReason, TransferKind, Verdict};

/// A step of the classification procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Any task-exit prompt means the call was (at least partly) out of task
    TaskContext,
    /// The last task-start attempt ends the call unless cancelled afterwards
    TaskStartRevalidation,
    /// Any intentional-termination phrase ends the call deliberately
    IntentionalScan,
    /// A transfer line as the very last line means a transfer drop
    TransferDrop,
}

impl Rule {
    /// Evaluation order. Later rules may read what earlier ones settled.
    pub const ORDER: [Rule; 4] = [
        Rule::TaskContext,
        Rule::TaskStartRevalidation,
        Rule::IntentionalScan,
        Rule::TransferDrop,
    ];

    /// Short label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Rule::TaskContext => "task_context",
            Rule::TaskStartRevalidation => "task_start_revalidation",
            Rule::IntentionalScan => "intentional_scan",
            Rule::TransferDrop => "transfer_drop",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a rule concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOutcome {
    /// The rule's pattern was found and it set its part of the verdict
    Matched,
    /// Nothing found; the rule set its negative value
    NoMatch,
    /// A task start was found but cancellation evidence followed it
    Revoked,
    /// Not evaluated because an earlier rule already decided
    Skipped,
}

/// Partially decided verdict
#[derive(Debug, Default)]
pub(super) struct Draft {
    in_task: Option<bool>,
    intentional: Option<bool>,
    transfer_drop: bool,
    transfer_kind: TransferKind,
}

impl Draft {
    pub(super) fn finish(self) -> Verdict {
        Verdict {
            intentional: self.intentional.unwrap_or(false),
            in_task: self.in_task.unwrap_or(true),
            transfer_drop: self.transfer_drop,
            transfer_kind: self.transfer_kind,
        }
    }
}

/// Run one rule against the full transcript
pub(super) fn apply(
    rule: Rule,
    library: &PatternLibrary,
    text: &str,
    draft: &mut Draft,
) -> DecisionReason {
    match rule {
        Rule::TaskContext => task_context(library, text, draft),
        Rule::TaskStartRevalidation => task_start_revalidation(library, text, draft),
        Rule::IntentionalScan => intentional_scan(library, text, draft),
        Rule::TransferDrop => transfer_drop(library, text, draft),
    }
}

fn task_context(library: &PatternLibrary, text: &str, draft: &mut Draft) -> DecisionReason {
    match library.find_first(PatternRole::TaskExitPrompt, text) {
        Some((entry, m)) => {
            draft.in_task = Some(false);
            DecisionReason::new(Rule::TaskContext, RuleOutcome::Matched)
                .with_match(entry.name, m.as_str())
        }
        None => {
            draft.in_task = Some(true);
            DecisionReason::new(Rule::TaskContext, RuleOutcome::NoMatch)
        }
    }
}

/// Only the outcome of the most recent task start matters, so cancellation
/// evidence is searched for in the text after the last attempt only.
fn task_start_revalidation(
    library: &PatternLibrary,
    text: &str,
    draft: &mut Draft,
) -> DecisionReason {
    let Some((start, m)) = library.find_last(PatternRole::TaskStart, text) else {
        return DecisionReason::new(Rule::TaskStartRevalidation, RuleOutcome::NoMatch);
    };

    let after_start = &text[m.end()..];
    match library.find_first(PatternRole::CancellationEvidence, after_start) {
        Some((cancel, c)) => {
            // Leave `intentional` open: other termination evidence still counts
            DecisionReason::new(Rule::TaskStartRevalidation, RuleOutcome::Revoked)
                .with_match(cancel.name, c.as_str())
        }
        None => {
            draft.intentional = Some(true);
            DecisionReason::new(Rule::TaskStartRevalidation, RuleOutcome::Matched)
                .with_match(start.name, m.as_str())
        }
    }
}

fn intentional_scan(library: &PatternLibrary, text: &str, draft: &mut Draft) -> DecisionReason {
    if draft.intentional == Some(true) {
        return DecisionReason::new(Rule::IntentionalScan, RuleOutcome::Skipped);
    }

    match library.find_first(PatternRole::IntentionalTermination, text) {
        Some((entry, m)) => {
            draft.intentional = Some(true);
            DecisionReason::new(Rule::IntentionalScan, RuleOutcome::Matched)
                .with_match(entry.name, m.as_str())
        }
        None => {
            draft.intentional = Some(false);
            DecisionReason::new(Rule::IntentionalScan, RuleOutcome::NoMatch)
        }
    }
}

fn transfer_drop(library: &PatternLibrary, text: &str, draft: &mut Draft) -> DecisionReason {
    let Some(detected) = transfer::detect(library, text) else {
        draft.transfer_drop = false;
        draft.transfer_kind = TransferKind::None;
        return DecisionReason::new(Rule::TransferDrop, RuleOutcome::NoMatch);
    };

    draft.transfer_drop = true;
    draft.transfer_kind = detected.kind;

    let reason = DecisionReason::new(Rule::TransferDrop, RuleOutcome::Matched);
    match detected.marker {
        Some((pattern, line)) => reason.with_match(pattern, line),
        None => reason.with_match(detected.progress_pattern, detected.last_line),
    }
}
