//! Command-line interface for sln
//!
//! Argument parsing for the `sln` binary. Filter flags map one-to-one onto a
//! [`FilterSelection`]; display flags override the layered configuration.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sln_core::{FilterSelection, Result, SalaryRange};

use crate::config::OutputFormat;

/// sln - salary dashboards over technology-industry compensation data
///
/// sln loads a salary CSV, narrows it with the given filters and prints the
/// headline statistics, rankings, trend and distributions of the matching rows.
#[derive(Parser, Debug)]
#[command(name = "sln")]
#[command(author, version, about)]
#[command(after_help = "EXAMPLES:\n  \
    # Dashboard over the whole dataset\n  \
    sln salaries.csv\n\n  \
    # Senior engineers in Germany, as JSON\n  \
    sln --experience Senior-level --country Germany --format json\n\n  \
    # Salaries between 100k and 200k in 2023, top 5 only\n  \
    sln --year 2023 --min-salary 100000 --max-salary 200000 --top 5\n\n  \
    # Values accepted by each filter\n  \
    sln options salaries.csv")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Salary CSV to load (defaults to the configured path)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Only rows from this work year
    #[arg(long, value_name = "YEAR")]
    pub year: Option<i32>,

    /// Only rows with this experience label (e.g. Senior-level)
    #[arg(long, value_name = "LABEL")]
    pub experience: Option<String>,

    /// Only rows with this employment type label (e.g. Full-Time)
    #[arg(long, value_name = "LABEL")]
    pub employment: Option<String>,

    /// Only rows with this company size (S, M, L)
    #[arg(long, value_name = "SIZE")]
    pub size: Option<String>,

    /// Only rows from this country (e.g. Germany)
    #[arg(long, value_name = "NAME")]
    pub country: Option<String>,

    /// Lower salary bound in USD (defaults to the dataset minimum)
    #[arg(long, value_name = "USD")]
    pub min_salary: Option<f64>,

    /// Upper salary bound in USD (defaults to the dataset maximum)
    #[arg(long, value_name = "USD")]
    pub max_salary: Option<f64>,

    /// Entries in each top-N ranking
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Bins in the salary distribution
    #[arg(long, value_name = "N")]
    pub bins: Option<usize>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Filtered rows to print (0 prints none)
    #[arg(long, value_name = "N")]
    pub rows: Option<usize>,

    /// Verbose output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the values accepted by each filter
    Options {
        /// Salary CSV to load
        file: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Create default configuration file
    Init {
        /// Path to create config file
        #[arg(default_value = "sln.toml")]
        path: PathBuf,

        /// Force overwrite if file exists
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Build the filter selection described by the flags
    ///
    /// A salary bound given on one side only is completed from `bounds`.
    pub fn selection(&self, bounds: SalaryRange) -> Result<FilterSelection> {
        let mut selection = FilterSelection::all();
        if let Some(year) = self.year {
            selection = selection.with_year(year);
        }
        if let Some(label) = &self.experience {
            selection = selection.with_experience_level(label.as_str());
        }
        if let Some(label) = &self.employment {
            selection = selection.with_employment_type(label.as_str());
        }
        if let Some(size) = &self.size {
            selection = selection.with_company_size(size.as_str());
        }
        if let Some(country) = &self.country {
            selection = selection.with_country(country.as_str());
        }

        match (self.min_salary, self.max_salary) {
            (None, None) => Ok(selection),
            (Some(min), None) => selection.with_salary_range(min, bounds.max().max(min)),
            (None, Some(max)) => selection.with_salary_range(bounds.min().min(max), max),
            (Some(min), Some(max)) => selection.with_salary_range(min, max),
        }
    }
}

/// Parse command-line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Parse command-line arguments from a vector (for testing)
pub fn parse_args_from<I, T>(args: I) -> std::result::Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}
