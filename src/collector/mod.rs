//! Transcript discovery and loading.
//!
//! One terminal transcript per file; the call's open time is encoded in the
//! file name (`unit_507_20240101T120000_network_net_0.log`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use calldrop_core::{AnalysisError, Transcript};
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::config::CollectSettings;

/// Finds transcript files and turns them into ordered transcripts
#[derive(Debug, Clone)]
pub struct Collector {
    extension: String,
    timestamp: Regex,
    timestamp_format: String,
}

impl Collector {
    /// Create a collector from validated settings
    pub fn new(settings: &CollectSettings) -> Result<Self> {
        let timestamp = Regex::new(&settings.timestamp_pattern).with_context(|| {
            format!(
                "Invalid timestamp pattern: {:?}",
                settings.timestamp_pattern
            )
        })?;
        Ok(Self {
            extension: settings.extension.clone(),
            timestamp,
            timestamp_format: settings.timestamp_format.clone(),
        })
    }

    /// List transcript files in `dir` (non-recursive), sorted by name
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read logs directory: {:?}", dir))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("Failed to list {:?}", dir))?;
            let path = entry.path();
            if path.is_file() && self.has_extension(&path) {
                files.push(path);
            }
        }

        if files.is_empty() {
            bail!("no transcripts found in {:?} (*.{})", dir, self.extension);
        }
        files.sort();
        debug!(count = files.len(), dir = %dir.display(), "discovered transcripts");
        Ok(files)
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }

    /// Open time encoded in a transcript file name, as UTC
    pub fn open_time(&self, file_name: &str) -> calldrop_core::Result<DateTime<Utc>> {
        let caps = self
            .timestamp
            .captures(file_name)
            .ok_or_else(|| AnalysisError::Input {
                id: file_name.to_string(),
                reason: "no timestamp in file name".to_string(),
            })?;
        let stamp = caps.get(1).or_else(|| caps.get(0)).map_or("", |m| m.as_str());

        NaiveDateTime::parse_from_str(stamp, &self.timestamp_format)
            .map(|naive| naive.and_utc())
            .map_err(|e| AnalysisError::Input {
                id: file_name.to_string(),
                reason: format!("bad timestamp {stamp:?}: {e}"),
            })
    }

    /// Read and decode one transcript
    pub fn load(&self, path: &Path) -> calldrop_core::Result<Transcript> {
        let id = file_id(path);
        let open_time = self.open_time(&id)?;
        let bytes = fs::read(path).map_err(|e| AnalysisError::Input {
            id: id.clone(),
            reason: e.to_string(),
        })?;
        Ok(Transcript::from_bytes(id, &bytes, open_time))
    }

    /// Load every transcript of a deployment.
    ///
    /// Loaded transcripts come back ascending by (open time, identifier).
    /// Files that failed to load come first, in name order, so the batch
    /// failure policy sees them before any verdict is produced.
    pub fn collect(&self, dir: &Path) -> Result<Vec<calldrop_core::Result<Transcript>>> {
        let mut loaded = Vec::new();
        let mut failed = Vec::new();

        for path in self.discover(dir)? {
            match self.load(&path) {
                Ok(transcript) => loaded.push(transcript),
                Err(err) => failed.push(Err(err)),
            }
        }

        loaded.sort_by(|a, b| (a.open_time, &a.id).cmp(&(b.open_time, &b.id)));
        failed.extend(loaded.into_iter().map(Ok));
        Ok(failed)
    }
}

/// Transcript identifier: the file name
pub fn file_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
