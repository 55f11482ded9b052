//! sln-cli library
//!
//! Provides the argument parser, layered configuration and report writer used
//! by the `sln` binary.

pub mod cli;
pub mod config;
pub mod output;

pub use cli::{Cli, Commands, ConfigCommands};
pub use config::{create_default_config_file, validate_config, Config, OutputFormat};
pub use output::OutputWriter;
