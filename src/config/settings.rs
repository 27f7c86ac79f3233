use anyhow::{Context, Result};
use calldrop_core::FailurePolicy;
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Classify glider Iridium calls and report dropped-call statistics"
)]
pub struct Config {
    /// Enable debug mode
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Classify every transcript of a deployment and write the statistics
    Analyze(AnalyzeArgs),
    /// Classify a single transcript and explain the verdict
    Classify {
        /// Transcript file
        file: PathBuf,
    },
    /// List the built-in pattern library
    Patterns,
}

/// Arguments of `calldrop analyze`
#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Directory holding the deployment's terminal transcripts
    pub logs_dir: PathBuf,

    /// Directory the artifacts are written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Artifact file stem (default: name of the logs directory)
    #[arg(short, long)]
    pub name: Option<String>,

    /// What to do with a transcript that cannot be analyzed (abort, skip)
    #[arg(long, value_name = "POLICY", value_parser = parse_failure_policy)]
    pub on_error: Option<FailurePolicy>,

    /// Deployment metadata attached to the artifacts (repeatable)
    #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_meta)]
    pub meta: Vec<(String, String)>,

    /// Do not write the per-call CSV
    #[arg(long)]
    pub no_csv: bool,

    /// Do not write the JSON summary
    #[arg(long)]
    pub no_json: bool,

    /// Write diagnostics as NDJSON next to the other artifacts
    #[arg(long)]
    pub diagnostics: bool,

    /// Disable colored terminal output
    #[arg(long)]
    pub no_color: bool,
}

fn parse_failure_policy(value: &str) -> Result<FailurePolicy, String> {
    match value.to_ascii_lowercase().as_str() {
        "abort" => Ok(FailurePolicy::Abort),
        "skip" => Ok(FailurePolicy::Skip),
        other => Err(format!("unknown policy '{other}' (expected abort or skip)")),
    }
}

fn parse_meta(value: &str) -> Result<(String, String), String> {
    let (key, val) = value
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{value}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{value}'"));
    }
    Ok((key.to_string(), val.trim().to_string()))
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Analyze arguments, when running `analyze`
    pub fn analyze_args(&self) -> Option<&AnalyzeArgs> {
        match &self.command {
            Command::Analyze(args) => Some(args),
            _ => None,
        }
    }
}

/// Application settings (from config file)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Transcript discovery settings
    #[serde(default)]
    pub collect: CollectSettings,

    /// Batch analysis settings
    #[serde(default)]
    pub analysis: AnalysisSettings,

    /// Artifact and terminal output settings
    #[serde(default)]
    pub output: OutputSettings,
}

/// Transcript discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectSettings {
    /// Extension of transcript files, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Regex locating the open timestamp in a file name; group 1 if present
    #[serde(default = "default_timestamp_pattern")]
    pub timestamp_pattern: String,

    /// chrono format of the located timestamp (UTC)
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

fn default_extension() -> String {
    "log".to_string()
}

fn default_timestamp_pattern() -> String {
    r"(\d{8}T\d{6})".to_string()
}

fn default_timestamp_format() -> String {
    "%Y%m%dT%H%M%S".to_string()
}

impl Default for CollectSettings {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            timestamp_pattern: default_timestamp_pattern(),
            timestamp_format: default_timestamp_format(),
        }
    }
}

/// Batch analysis settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Failure policy for transcripts that cannot be analyzed
    #[serde(default)]
    pub on_error: FailurePolicy,
}

/// Artifact and terminal output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Write the per-call CSV
    #[serde(default = "default_true")]
    pub write_csv: bool,

    /// Write the JSON summary
    #[serde(default = "default_true")]
    pub write_json: bool,

    /// Write diagnostics as NDJSON
    #[serde(default)]
    pub write_diagnostics: bool,

    /// Enable color output
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            write_csv: true,
            write_json: true,
            write_diagnostics: false,
            color: true,
        }
    }
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        // Try custom path first
        if let Some(p) = path {
            if p.exists() {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config file: {:?}", p))?;
                return toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {:?}", p));
            }
        }

        // Try default config locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("calldrop/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/calldrop/config.toml")),
            dirs::home_dir().map(|p| p.join(".calldrop.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                return toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {:?}", path));
            }
        }

        // Return defaults if no config file found
        Ok(Self::default())
    }

    /// Merge CLI config into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Config) {
        let Some(args) = cli.analyze_args() else {
            return;
        };
        if let Some(policy) = args.on_error {
            self.analysis.on_error = policy;
        }
        if args.no_csv {
            self.output.write_csv = false;
        }
        if args.no_json {
            self.output.write_json = false;
        }
        if args.diagnostics {
            self.output.write_diagnostics = true;
        }
        if args.no_color {
            self.output.color = false;
        }
    }

    /// Validate and normalize settings values
    ///
    /// Empty collect values fall back to their defaults and the extension
    /// loses any leading dot.
    pub fn validate(&mut self) {
        let extension = self.collect.extension.trim().trim_start_matches('.');
        self.collect.extension = if extension.is_empty() {
            default_extension()
        } else {
            extension.to_string()
        };
        if self.collect.timestamp_pattern.trim().is_empty() {
            self.collect.timestamp_pattern = default_timestamp_pattern();
        }
        if self.collect.timestamp_format.trim().is_empty() {
            self.collect.timestamp_format = default_timestamp_format();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.collect.extension, "log");
        assert_eq!(settings.analysis.on_error, FailurePolicy::Abort);
        assert!(settings.output.write_csv);
        assert!(settings.output.write_json);
        assert!(!settings.output.write_diagnostics);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [collect]
            extension = "txt"

            [analysis]
            on_error = "skip"

            [output]
            write_json = false
        "#;

        let settings: Settings = toml::from_str(toml).expect("Should parse TOML");
        assert_eq!(settings.collect.extension, "txt");
        assert_eq!(settings.collect.timestamp_format, "%Y%m%dT%H%M%S");
        assert_eq!(settings.analysis.on_error, FailurePolicy::Skip);
        assert!(!settings.output.write_json);
        assert!(settings.output.write_csv);
    }

    #[test]
    fn test_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[output]\nwrite_diagnostics = true\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert!(settings.output.write_diagnostics);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[analysis]\non_error = \"retry\"\n").unwrap();

        assert!(Settings::load(Some(&path)).is_err());
    }

    #[test]
    fn test_merge_cli_overrides_file() {
        let cli = Config::parse_from([
            "calldrop",
            "analyze",
            "logs",
            "--on-error",
            "skip",
            "--no-csv",
            "--diagnostics",
            "--meta",
            "glider=unit_507",
        ]);
        let mut settings = Settings::default();
        settings.merge_cli(&cli);

        assert_eq!(settings.analysis.on_error, FailurePolicy::Skip);
        assert!(!settings.output.write_csv);
        assert!(settings.output.write_diagnostics);
        let args = cli.analyze_args().unwrap();
        assert_eq!(
            args.meta,
            vec![("glider".to_string(), "unit_507".to_string())]
        );
    }

    #[test]
    fn test_rejects_bad_meta_and_policy() {
        assert!(Config::try_parse_from(["calldrop", "analyze", "logs", "--meta", "glider"]).is_err());
        assert!(
            Config::try_parse_from(["calldrop", "analyze", "logs", "--on-error", "retry"]).is_err()
        );
    }

    #[test]
    fn test_validate_normalizes_extension() {
        let mut settings = Settings::default();
        settings.collect.extension = ".LOG".to_string();
        settings.collect.timestamp_format = String::new();
        settings.validate();
        assert_eq!(settings.collect.extension, "LOG");
        assert_eq!(settings.collect.timestamp_format, "%Y%m%dT%H%M%S");

        settings.collect.extension = " ".to_string();
        settings.validate();
        assert_eq!(settings.collect.extension, "log");
    }
}
