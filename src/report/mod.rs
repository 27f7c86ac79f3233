//! Artifacts and terminal output of an analysis run.

pub mod diagnostics;
pub mod document;
pub mod table;
pub mod terminal;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calldrop_core::{BatchReport, Summary};

use crate::config::OutputSettings;

pub use diagnostics::DiagnosticsLog;
pub use document::{write_json, SummaryDocument};
pub use table::write_csv;
pub use terminal::Colors;

/// Files written by [`write_artifacts`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    pub csv: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub diagnostics: Option<PathBuf>,
}

impl Artifacts {
    /// Every written path
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        [&self.csv, &self.json, &self.diagnostics]
            .into_iter()
            .flatten()
    }
}

/// Write the enabled artifacts as `<out_dir>/<stem>.{csv,json,diagnostics.ndjson}`
pub fn write_artifacts(
    out_dir: &Path,
    stem: &str,
    meta: &[(String, String)],
    report: &BatchReport,
    summary: &Summary,
    output: &OutputSettings,
) -> Result<Artifacts> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", out_dir))?;

    let mut artifacts = Artifacts::default();

    if output.write_csv {
        let path = out_dir.join(format!("{stem}.csv"));
        write_csv(&path, meta, &report.verdicts)?;
        artifacts.csv = Some(path);
    }

    if output.write_json {
        let path = out_dir.join(format!("{stem}.json"));
        let document = SummaryDocument::new(meta, report.skipped(), summary);
        write_json(&path, &document)?;
        artifacts.json = Some(path);
    }

    if output.write_diagnostics {
        let path = out_dir.join(format!("{stem}.diagnostics.ndjson"));
        let mut log = DiagnosticsLog::create(&path)?;
        for diagnostic in &report.diagnostics {
            log.log(diagnostic)?;
        }
        log.finish()?;
        artifacts.diagnostics = Some(path);
    }

    Ok(artifacts)
}
