//! Batch analyzer: classifies every transcript of a deployment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::{normalize_line_endings, Classification, SessionClassifier, Verdict};
use crate::clock::estimate_close_time;
use crate::diagnostics::Diagnostic;
use crate::error::{AnalysisError, Result};

/// Raw text of one call plus when the call opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    /// Identifier (usually the file name)
    pub id: String,
    /// Decoded transcript text
    pub text: String,
    /// When the session began
    pub open_time: DateTime<Utc>,
}

impl Transcript {
    /// Create a transcript from already decoded text; line endings become `\n`
    pub fn new(id: impl Into<String>, text: impl Into<String>, open_time: DateTime<Utc>) -> Self {
        let mut text: String = text.into();
        if text.contains('\r') {
            text = normalize_line_endings(&text).into_owned();
        }
        Self {
            id: id.into(),
            text,
            open_time,
        }
    }

    /// Create a transcript from raw bytes.
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD; that alone is not
    /// an error.
    pub fn from_bytes(id: impl Into<String>, bytes: &[u8], open_time: DateTime<Utc>) -> Self {
        Self::new(id, String::from_utf8_lossy(bytes).into_owned(), open_time)
    }
}

/// Verdict for one call of a deployment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionVerdict {
    /// Transcript identifier
    pub id: String,
    /// When the session began
    pub open_time: DateTime<Utc>,
    /// How the call ended
    #[serde(flatten)]
    pub verdict: Verdict,
    /// Last GPS fix printed during the call
    pub position: Option<String>,
    /// Estimated end of the call, from the transcript's clock lines
    pub close_time: Option<DateTime<Utc>>,
}

impl SessionVerdict {
    /// Estimated call length in seconds
    pub fn duration_secs(&self) -> Option<i64> {
        self.close_time
            .map(|close| (close - self.open_time).num_seconds())
    }
}

/// Verdicts of one deployment, ascending by open time
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VerdictSet {
    entries: Vec<SessionVerdict>,
}

impl VerdictSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from verdicts, checking the ordering
    pub fn from_verdicts(verdicts: Vec<SessionVerdict>) -> Result<Self> {
        let mut set = Self::new();
        for verdict in verdicts {
            set.push(verdict)?;
        }
        Ok(set)
    }

    /// Append a verdict; it must not open before the last one
    pub fn push(&mut self, verdict: SessionVerdict) -> Result<()> {
        if let Some(last) = self.entries.last() {
            if verdict.open_time < last.open_time {
                return Err(AnalysisError::OutOfOrder {
                    id: verdict.id,
                    previous: last.id.clone(),
                });
            }
        }
        self.entries.push(verdict);
        Ok(())
    }

    /// Verdicts in open-time order
    pub fn iter(&self) -> std::slice::Iter<'_, SessionVerdict> {
        self.entries.iter()
    }

    /// Number of verdicts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set holds no verdict
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest call
    pub fn first(&self) -> Option<&SessionVerdict> {
        self.entries.first()
    }

    /// Latest call
    pub fn last(&self) -> Option<&SessionVerdict> {
        self.entries.last()
    }

    /// Verdicts as a slice
    pub fn as_slice(&self) -> &[SessionVerdict] {
        &self.entries
    }
}

impl<'a> IntoIterator for &'a VerdictSet {
    type Item = &'a SessionVerdict;
    type IntoIter = std::slice::Iter<'a, SessionVerdict>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// What to do when one transcript of a batch fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the whole batch at the first failing transcript
    #[default]
    Abort,
    /// Record the error, leave the transcript out and carry on
    Skip,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Verdicts of every transcript that made it through
    pub verdicts: VerdictSet,
    /// Per-transcript errors recorded under [`FailurePolicy::Skip`]
    pub errors: Vec<AnalysisError>,
    /// Structured diagnostics in processing order
    pub diagnostics: Vec<Diagnostic>,
}

impl BatchReport {
    /// Number of transcripts left out
    pub fn skipped(&self) -> usize {
        self.errors.len()
    }
}

/// Runs the session classifier over a deployment's transcripts
#[derive(Debug, Clone, Copy)]
pub struct BatchAnalyzer<'a> {
    classifier: SessionClassifier<'a>,
    policy: FailurePolicy,
}

impl BatchAnalyzer<'static> {
    /// Analyzer over the built-in pattern library
    pub fn new(policy: FailurePolicy) -> Self {
        Self::with_classifier(SessionClassifier::new(), policy)
    }
}

impl<'a> BatchAnalyzer<'a> {
    /// Analyzer over a specific classifier
    pub fn with_classifier(classifier: SessionClassifier<'a>, policy: FailurePolicy) -> Self {
        Self { classifier, policy }
    }

    /// Failure policy in use
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Classify a single transcript, naming it in any error
    pub fn classify_transcript(
        &self,
        transcript: &Transcript,
    ) -> Result<(SessionVerdict, Classification)> {
        let classification = self.classifier.classify(&transcript.text).map_err(|v| {
            AnalysisError::Consistency {
                id: transcript.id.clone(),
                detail: v.detail,
            }
        })?;

        let verdict = SessionVerdict {
            id: transcript.id.clone(),
            open_time: transcript.open_time,
            verdict: classification.verdict,
            position: classification.position.clone(),
            close_time: estimate_close_time(&transcript.text),
        };
        Ok((verdict, classification))
    }

    /// Analyze a batch.
    ///
    /// Inputs must arrive in ascending open-time order; the output keeps
    /// that order. Inputs that already failed to load are passed in as
    /// errors so the failure policy covers them too. An ordering violation
    /// always aborts, whatever the policy.
    pub fn analyze<I>(&self, inputs: I) -> Result<BatchReport>
    where
        I: IntoIterator<Item = Result<Transcript>>,
    {
        let mut report = BatchReport::default();

        for input in inputs {
            let outcome = input.and_then(|transcript| {
                let (verdict, classification) = self.classify_transcript(&transcript)?;
                Ok((transcript, verdict, classification))
            });

            let (transcript, verdict, classification) = match outcome {
                Ok(done) => done,
                Err(err) => match self.policy {
                    FailurePolicy::Abort => return Err(err),
                    FailurePolicy::Skip => {
                        report.diagnostics.push(Diagnostic::Skipped {
                            id: err.transcript_id().unwrap_or_default().to_string(),
                            error: err.to_string(),
                        });
                        report.errors.push(err);
                        continue;
                    }
                },
            };

            let indeterminate = verdict.verdict.is_indeterminate_transfer();
            report.verdicts.push(verdict)?;

            report.diagnostics.push(Diagnostic::Classified {
                id: transcript.id.clone(),
                open_time: transcript.open_time,
                verdict: classification.verdict,
                reasons: classification.reasons,
            });
            if indeterminate {
                report
                    .diagnostics
                    .push(Diagnostic::TransferIndeterminate { id: transcript.id });
            }
        }

        Ok(report)
    }
}

/// Classify an ordered batch with the built-in library, aborting on the
/// first failure
pub fn analyze<I>(transcripts: I) -> Result<VerdictSet>
where
    I: IntoIterator<Item = Transcript>,
{
    BatchAnalyzer::new(FailurePolicy::Abort)
        .analyze(transcripts.into_iter().map(Ok))
        .map(|report| report.verdicts)
}
