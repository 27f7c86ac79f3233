//! Pattern library: the fixed, versioned set of terminal phrases the
//! classifier looks for.
//!
//! Every entry has a role. The classifier never matches on entry names,
//! only on roles, so adding a phrase to an existing role is enough to make
//! the classifier see it.

mod builtin;

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Version of the built-in pattern table.
///
/// Bump whenever a phrase is added, removed or changed so that stored
/// results can be traced back to the table that produced them.
pub const PATTERN_LIBRARY_VERSION: &str = "2024.10-1";

/// What a pattern means when it appears in a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternRole {
    /// An attempt to start the autonomous task (mission)
    TaskStart,
    /// A deliberate end of the call (command or protocol signal)
    IntentionalTermination,
    /// The interactive prompt, only shown outside the autonomous task
    TaskExitPrompt,
    /// Progress line printed while a file transfer runs
    TransferOccurred,
    /// Start of a file transfer, capturing the file extension
    TransferType,
    /// Evidence that a task start was interrupted or failed
    CancellationEvidence,
    /// GPS fix line, capturing the position text
    Position,
}

impl PatternRole {
    /// All roles in table order
    pub const ALL: [PatternRole; 7] = [
        PatternRole::TaskStart,
        PatternRole::IntentionalTermination,
        PatternRole::TaskExitPrompt,
        PatternRole::TransferOccurred,
        PatternRole::TransferType,
        PatternRole::CancellationEvidence,
        PatternRole::Position,
    ];

    /// Short label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            PatternRole::TaskStart => "task-start",
            PatternRole::IntentionalTermination => "intentional-termination",
            PatternRole::TaskExitPrompt => "task-exit-prompt",
            PatternRole::TransferOccurred => "transfer-occurred",
            PatternRole::TransferType => "transfer-type",
            PatternRole::CancellationEvidence => "cancellation-evidence",
            PatternRole::Position => "position",
        }
    }
}

impl fmt::Display for PatternRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A named, compiled pattern with its role
#[derive(Debug, Clone)]
pub struct PatternEntry {
    /// Stable name (e.g., "callback_command")
    pub name: &'static str,
    /// Role of the pattern
    pub role: PatternRole,
    /// Compiled expression
    pub regex: Regex,
}

impl PatternEntry {
    /// Source text of the expression
    pub fn source(&self) -> &str {
        self.regex.as_str()
    }
}

/// The immutable set of patterns used for classification
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    version: &'static str,
    entries: Vec<PatternEntry>,
}

static BUILTIN: Lazy<PatternLibrary> = Lazy::new(PatternLibrary::builtin);

impl PatternLibrary {
    /// Build the built-in library
    pub fn builtin() -> Self {
        Self {
            version: PATTERN_LIBRARY_VERSION,
            entries: builtin::entries(),
        }
    }

    /// Process-wide shared instance, compiled on first use
    pub fn global() -> &'static PatternLibrary {
        &BUILTIN
    }

    /// Version tag of this table
    pub fn version(&self) -> &'static str {
        self.version
    }

    /// All entries in table order
    pub fn entries(&self) -> &[PatternEntry] {
        &self.entries
    }

    /// Entries with the given role, in table order
    pub fn by_role(&self, role: PatternRole) -> impl Iterator<Item = &PatternEntry> {
        self.entries.iter().filter(move |e| e.role == role)
    }

    /// First entry of `role` that matches anywhere in `text`, with the match
    pub fn find_first<'t>(
        &self,
        role: PatternRole,
        text: &'t str,
    ) -> Option<(&PatternEntry, regex::Match<'t>)> {
        self.by_role(role)
            .find_map(|entry| entry.regex.find(text).map(|m| (entry, m)))
    }

    /// The occurrence of `role` that ends last in `text`
    ///
    /// Considers every occurrence of every entry with that role, so a task
    /// restarted several times yields its final attempt.
    pub fn find_last<'t>(
        &self,
        role: PatternRole,
        text: &'t str,
    ) -> Option<(&PatternEntry, regex::Match<'t>)> {
        self.by_role(role)
            .filter_map(|entry| entry.regex.find_iter(text).last().map(|m| (entry, m)))
            .max_by_key(|(_, m)| m.end())
    }

    /// Whether any entry of `role` matches `text`
    pub fn any_match(&self, role: PatternRole, text: &str) -> bool {
        self.by_role(role).any(|entry| entry.regex.is_match(text))
    }
}
