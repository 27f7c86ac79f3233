//! Subcommand entry points

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calldrop_core::{
    summarize, BatchAnalyzer, BatchReport, Diagnostic, PatternLibrary, SessionClassifier,
    Transcript,
};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::collector::{file_id, Collector};
use crate::config::{AnalyzeArgs, Command, Settings};
use crate::report::{self, terminal, Colors};

/// Run the selected subcommand
pub fn run(command: &Command, settings: &Settings) -> Result<()> {
    match command {
        Command::Analyze(args) => analyze(args, settings),
        Command::Classify { file } => classify(file, settings),
        Command::Patterns => {
            let c = Colors::new(settings.output.color);
            terminal::print_patterns(&c, PatternLibrary::global());
            Ok(())
        }
    }
}

/// Classify a deployment, write its artifacts and print the summary
fn analyze(args: &AnalyzeArgs, settings: &Settings) -> Result<()> {
    let collector = Collector::new(&settings.collect)?;
    let inputs = collector.collect(&args.logs_dir)?;
    info!(
        transcripts = inputs.len(),
        policy = ?settings.analysis.on_error,
        "analyzing {}",
        args.logs_dir.display()
    );

    let report = BatchAnalyzer::new(settings.analysis.on_error)
        .analyze(inputs)
        .context("Batch analysis failed")?;
    forward_diagnostics(&report);

    let summary = summarize(&report.verdicts).context("Aggregation failed")?;

    let stem = artifact_stem(args);
    let out_dir = args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let artifacts = report::write_artifacts(
        &out_dir,
        &stem,
        &args.meta,
        &report,
        &summary,
        &settings.output,
    )?;
    for path in artifacts.paths() {
        info!("wrote {}", path.display());
    }

    let c = Colors::new(settings.output.color);
    terminal::print_summary(&c, &stem, &summary, report.skipped());
    Ok(())
}

/// Send batch diagnostics to the log
fn forward_diagnostics(report: &BatchReport) {
    for diagnostic in &report.diagnostics {
        match diagnostic {
            Diagnostic::Classified { id, verdict, .. } => debug!(
                id = %id,
                intentional = verdict.intentional,
                in_task = verdict.in_task,
                transfer_drop = verdict.transfer_drop,
                kind = %verdict.transfer_kind,
                "classified"
            ),
            Diagnostic::TransferIndeterminate { id } => {
                info!(id = %id, "transfer drop without a transfer marker")
            }
            Diagnostic::Skipped { id, error } => warn!(id = %id, "skipped: {error}"),
        }
    }
}

/// `--name`, else the logs directory name
fn artifact_stem(args: &AnalyzeArgs) -> String {
    if let Some(name) = args.name.as_deref().filter(|n| !n.trim().is_empty()) {
        return name.trim().to_string();
    }
    args.logs_dir
        .canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .or_else(|| args.logs_dir.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "calldrop".to_string())
}

/// Classify one transcript and explain the verdict
fn classify(file: &Path, settings: &Settings) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {:?}", file))?;
    let id = file_id(file);

    // A missing timestamp does not matter for a single verdict
    let open_time = Collector::new(&settings.collect)?
        .open_time(&id)
        .unwrap_or_else(|_| Utc::now());
    let transcript = Transcript::from_bytes(id, &bytes, open_time);

    let classification = SessionClassifier::new()
        .classify(&transcript.text)
        .map_err(|v| anyhow::anyhow!("{}: {}", transcript.id, v.detail))?;

    let c = Colors::new(settings.output.color);
    terminal::print_classification(&c, &transcript.id, &classification);
    Ok(())
}
