use once_cell::sync::Lazy;
use regex::Regex;

use crate::patterns::{PatternLibrary, PatternRole};

use super::TransferKind;

/// sbd / scd: flight computer data
static FLIGHT_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^s[bc]d").unwrap());

/// tbd / tcd: science computer data
static SCIENCE_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^t[bc]d").unwrap());

/// A transfer in progress on the last line of a transcript
#[derive(Debug)]
pub(super) struct DetectedTransfer<'t> {
    pub(super) kind: TransferKind,
    pub(super) progress_pattern: &'static str,
    pub(super) last_line: &'t str,
    /// Nearest preceding transfer-start marker: (pattern name, line)
    pub(super) marker: Option<(&'static str, &'t str)>,
}

/// Map a captured file extension to a transfer kind
pub fn classify_extension(extension: &str) -> TransferKind {
    if FLIGHT_EXTENSION.is_match(extension) {
        TransferKind::Flight
    } else if SCIENCE_EXTENSION.is_match(extension) {
        TransferKind::Science
    } else {
        TransferKind::Other
    }
}

/// Detect a drop during a file transfer.
///
/// The last line is taken literally: a transcript ending in a line feed has
/// an empty last line and therefore never counts as a transfer drop.
pub(super) fn detect<'t>(library: &PatternLibrary, text: &'t str) -> Option<DetectedTransfer<'t>> {
    let last_line = text.rsplit('\n').next().unwrap_or(text);
    let (progress, _) = library.find_first(PatternRole::TransferOccurred, last_line)?;

    let marker = text.split('\n').rev().find_map(|line| {
        library
            .by_role(PatternRole::TransferType)
            .find_map(|entry| {
                let caps = entry.regex.captures(line)?;
                let extension = caps.get(1)?.as_str();
                Some((entry.name, line, extension))
            })
    });

    let (kind, marker) = match marker {
        Some((pattern, line, extension)) => (classify_extension(extension), Some((pattern, line))),
        // Transfer drop of indeterminate kind
        None => (TransferKind::None, None),
    };

    Some(DetectedTransfer {
        kind,
        progress_pattern: progress.name,
        last_line,
        marker,
    })
}
