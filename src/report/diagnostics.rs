use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calldrop_core::Diagnostic;

/// Writer for diagnostics in ndjson format
pub struct DiagnosticsLog {
    file_path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl DiagnosticsLog {
    /// Create (or truncate) the log file
    pub fn create(file_path: &Path) -> Result<Self> {
        // Ensure directory exists
        if let Some(dir) = file_path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {:?}", dir))?;
        }

        let file = File::create(file_path)
            .with_context(|| format!("Failed to create diagnostics log: {:?}", file_path))?;

        Ok(Self {
            file_path: file_path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Append one diagnostic as a single JSON line
    pub fn log(&mut self, diagnostic: &Diagnostic) -> Result<()> {
        let json = serde_json::to_string(diagnostic)?;
        writeln!(self.writer, "{}", json)
            .with_context(|| format!("Failed to write diagnostics log: {:?}", self.file_path))?;
        self.written += 1;
        Ok(())
    }

    /// Flush and close, returning the number of records written
    pub fn finish(mut self) -> Result<usize> {
        self.writer
            .flush()
            .with_context(|| format!("Failed to write diagnostics log: {:?}", self.file_path))?;
        Ok(self.written)
    }
}
