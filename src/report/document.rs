//! JSON summary document

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use calldrop_core::{Summary, PATTERN_LIBRARY_VERSION};
use serde::Serialize;
use serde_json::{Map, Value};

/// Deployment summary as written to `<stem>.json`
#[derive(Debug, Serialize)]
pub struct SummaryDocument<'a> {
    /// Pattern library the verdicts were produced with
    pub pattern_library: &'static str,
    /// `--meta` pairs
    pub metadata: Map<String, Value>,
    /// Transcripts left out under the skip policy
    pub skipped: usize,
    /// Flat statistics
    pub summary: &'a Summary,
}

impl<'a> SummaryDocument<'a> {
    pub fn new(meta: &[(String, String)], skipped: usize, summary: &'a Summary) -> Self {
        let metadata = meta
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Self {
            pattern_library: PATTERN_LIBRARY_VERSION,
            metadata,
            skipped,
            summary,
        }
    }
}

/// Write the summary document as pretty-printed JSON
pub fn write_json(path: &Path, document: &SummaryDocument<'_>) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create JSON file: {:?}", path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), document)
        .with_context(|| format!("Failed to write JSON file: {:?}", path))
}
