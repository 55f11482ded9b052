//! Configuration management for sln
//!
//! Settings are layered, lowest to highest: built-in defaults, the first
//! config file found in the standard locations, `SLN_*` environment variables,
//! an explicit `--config` file, and finally command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sln_core::aggregate::{DEFAULT_HISTOGRAM_BINS, DEFAULT_TOP_N};
use sln_core::error::{Error, Result};
use sln_core::{ReadOptions, ViewSettings, DEFAULT_DATA_PATH};

use crate::cli::Cli;

const CONFIG_NAMES: [&str; 4] = ["sln.toml", ".sln.toml", "sln.yaml", ".sln.yaml"];

/// Main configuration structure for sln
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Dataset location and parsing
    pub data: DataConfig,
    /// Report layout
    pub display: DisplayConfig,
    /// Debug and diagnostic configuration
    pub debug: DebugConfig,
}

/// Dataset location and parsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Salary CSV path
    pub path: PathBuf,
    /// Field separator (single character)
    pub separator: String,
    /// Rows used for schema inference
    pub infer_schema_length: Option<usize>,
}

/// Report layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Entries in each top-N ranking
    pub top_n: usize,
    /// Bins in the salary distribution
    pub histogram_bins: usize,
    /// Output format
    pub format: OutputFormat,
    /// Filtered rows printed after the panels
    pub row_limit: usize,
}

/// Debug and diagnostic configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    /// Log verbosity (0 warn, 1 info, 2 debug, 3+ trace)
    pub verbosity: u8,
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable panels
    #[default]
    Text,
    /// One JSON document
    Json,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATA_PATH),
            separator: ",".to_string(),
            infer_schema_length: ReadOptions::default().infer_schema_length,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            format: OutputFormat::Text,
            row_limit: 20,
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(Error::config(format!("Unknown output format: {s}"))),
        }
    }
}

impl Config {
    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.merge_file(path)?;
        Ok(config)
    }

    /// Load configuration from the standard file locations and environment
    ///
    /// Also returns a message for every environment value that was rejected,
    /// so the caller can report them once logging is set up.
    pub fn load() -> Result<(Self, Vec<String>)> {
        let mut config = Self::default();

        let current_dir = std::env::current_dir().ok();
        let home = dirs::home_dir();
        if let Some(config_path) = Self::find_config_file(current_dir.as_deref(), home.as_deref())
        {
            log::debug!("Using config file {}", config_path.display());
            config.merge_file(&config_path)?;
        }

        let rejected = config.merge_env();
        Ok((config, rejected))
    }

    /// Find configuration file in standard locations
    ///
    /// Looks in `current_dir`, then `<home>/.config/sln`, then `home`.
    pub(crate) fn find_config_file(
        current_dir: Option<&Path>,
        home: Option<&Path>,
    ) -> Option<PathBuf> {
        let mut dirs = Vec::new();
        if let Some(dir) = current_dir {
            dirs.push(dir.to_path_buf());
        }
        if let Some(home) = home {
            dirs.push(home.join(".config").join("sln"));
            dirs.push(home.to_path_buf());
        }

        dirs.iter()
            .flat_map(|dir| CONFIG_NAMES.iter().map(move |name| dir.join(name)))
            .find(|path| path.is_file())
    }

    /// Merge configuration from file
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {e}")))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        let file_config: Config = match extension {
            "toml" => toml::from_str(&content)
                .map_err(|e| Error::config(format!("Invalid TOML config: {e}")))?,
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| Error::config(format!("Invalid YAML config: {e}")))?,
            _ => return Err(Error::config("Unsupported config file format")),
        };
        self.merge(file_config);
        Ok(())
    }

    fn merge_env(&mut self) -> Vec<String> {
        self.merge_env_with_reader(|key| std::env::var(key).ok())
    }

    /// Merge configuration from environment variables with custom reader
    ///
    /// Unparseable values are left out and described in the returned list.
    fn merge_env_with_reader<F>(&mut self, env_reader: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut rejected = Vec::new();

        if let Some(val) = env_reader("SLN_DATA") {
            self.data.path = PathBuf::from(val);
        }

        if let Some(val) = env_reader("SLN_SEPARATOR") {
            self.data.separator = val;
        }

        if let Some(val) = env_reader("SLN_TOP_N") {
            match val.parse() {
                Ok(top_n) => self.display.top_n = top_n,
                Err(_) => rejected.push(format!("Ignoring invalid SLN_TOP_N: {val}")),
            }
        }

        if let Some(val) = env_reader("SLN_BINS") {
            match val.parse() {
                Ok(bins) => self.display.histogram_bins = bins,
                Err(_) => rejected.push(format!("Ignoring invalid SLN_BINS: {val}")),
            }
        }

        if let Some(val) = env_reader("SLN_FORMAT") {
            match val.parse() {
                Ok(format) => self.display.format = format,
                Err(_) => rejected.push(format!("Ignoring invalid SLN_FORMAT: {val}")),
            }
        }

        if let Some(val) = env_reader("SLN_VERBOSITY") {
            match val.parse() {
                Ok(level) => self.debug.verbosity = level,
                Err(_) => rejected.push(format!("Ignoring invalid SLN_VERBOSITY: {val}")),
            }
        }

        rejected
    }

    /// Merge another config into this one
    ///
    /// Only values that differ from the defaults override.
    fn merge(&mut self, other: Config) {
        let data = DataConfig::default();
        if other.data.path != data.path {
            self.data.path = other.data.path;
        }
        if other.data.separator != data.separator {
            self.data.separator = other.data.separator;
        }
        if other.data.infer_schema_length != data.infer_schema_length {
            self.data.infer_schema_length = other.data.infer_schema_length;
        }

        let display = DisplayConfig::default();
        if other.display.top_n != display.top_n {
            self.display.top_n = other.display.top_n;
        }
        if other.display.histogram_bins != display.histogram_bins {
            self.display.histogram_bins = other.display.histogram_bins;
        }
        if other.display.format != display.format {
            self.display.format = other.display.format;
        }
        if other.display.row_limit != display.row_limit {
            self.display.row_limit = other.display.row_limit;
        }

        if other.debug.verbosity != DebugConfig::default().verbosity {
            self.debug.verbosity = other.debug.verbosity;
        }
    }

    /// Apply CLI overrides
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(path) = &cli.file {
            self.data.path = path.clone();
        }
        if let Some(top_n) = cli.top {
            self.display.top_n = top_n;
        }
        if let Some(bins) = cli.bins {
            self.display.histogram_bins = bins;
        }
        if let Some(format) = cli.format {
            self.display.format = format;
        }
        if let Some(rows) = cli.rows {
            self.display.row_limit = rows;
        }
        if cli.verbose > 0 {
            self.debug.verbosity = cli.verbose;
        }
    }

    /// CSV read options for the loader
    pub fn to_read_options(&self) -> Result<ReadOptions> {
        Ok(ReadOptions {
            separator: separator_byte(&self.data.separator)?,
            infer_schema_length: self.data.infer_schema_length,
        })
    }

    /// Panel sizing for the dashboard
    pub fn to_view_settings(&self) -> ViewSettings {
        ViewSettings {
            top_n: self.display.top_n,
            histogram_bins: self.display.histogram_bins,
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("toml");

        let content = match extension {
            "toml" => toml::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize config: {e}")))?,
            "yaml" | "yml" => serde_yaml::to_string(self)
                .map_err(|e| Error::config(format!("Failed to serialize config: {e}")))?,
            _ => return Err(Error::config("Unsupported config file format")),
        };

        fs::write(path, content)
            .map_err(|e| Error::config(format!("Failed to write config file: {e}")))?;

        Ok(())
    }
}

fn separator_byte(separator: &str) -> Result<u8> {
    match separator.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(Error::config(format!(
            "CSV separator must be a single byte character, got {separator:?}"
        ))),
    }
}

/// Create a default config file template
pub fn create_default_config_file(path: &Path) -> Result<()> {
    Config::default().save(path)
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    config.to_view_settings().validate()?;
    separator_byte(&config.data.separator)?;
    if config.data.infer_schema_length == Some(0) {
        return Err(Error::config("infer_schema_length must be greater than 0"));
    }
    Ok(())
}
