use std::io::{self, Write};
use std::process;

use anyhow::{bail, Context, Result};
use sln_cli::cli::parse_args;
use sln_cli::{
    create_default_config_file, validate_config, Cli, Commands, Config, ConfigCommands,
    OutputWriter,
};
use sln_core::{Dashboard, DatasetCache};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = parse_args();

    let (mut config, rejected) = Config::load()?;
    if let Some(path) = &args.config {
        config.merge_file(path)?;
    }
    config.apply_cli(&args);
    validate_config(&config)?;

    setup_logging(&config);
    for message in &rejected {
        log::warn!("{message}");
    }

    match &args.command {
        Some(command) => handle_command(command, &config),
        None => show_dashboard(&args, &config),
    }
}

fn handle_command(command: &Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Options { file } => {
            let mut config = config.clone();
            if let Some(path) = file {
                config.data.path = path.clone();
            }
            let dashboard = open_dashboard(&config)?;
            let mut stdout = io::stdout().lock();
            OutputWriter::new(&config).write_options(&mut stdout, dashboard.options())?;
            stdout.flush()?;
            Ok(())
        }
        Commands::Config { command } => handle_config_command(command, config),
    }
}

fn handle_config_command(command: &ConfigCommands, config: &Config) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let toml = toml::to_string_pretty(config).context("Failed to serialize config")?;
            println!("{toml}");
            Ok(())
        }
        ConfigCommands::Init { path, force } => {
            if path.exists() && !force {
                bail!(
                    "Config file already exists: {} (use --force to overwrite)",
                    path.display()
                );
            }
            create_default_config_file(path)?;
            println!("Created config file: {}", path.display());
            Ok(())
        }
    }
}

fn show_dashboard(args: &Cli, config: &Config) -> Result<()> {
    let dashboard = open_dashboard(config)?;
    let selection = args.selection(dashboard.table().salary_bounds())?;
    let view = dashboard.view(&selection)?;

    let mut stdout = io::stdout().lock();
    OutputWriter::new(config).write_view(&mut stdout, &view)?;
    stdout.flush()?;
    Ok(())
}

fn open_dashboard(config: &Config) -> Result<Dashboard> {
    let cache = DatasetCache::new(&config.data.path, config.to_read_options()?);
    let table = cache.get()?;
    log::debug!("Dataset cached from {}", cache.path().display());

    Ok(Dashboard::new(table, config.to_view_settings())?)
}

fn setup_logging(config: &Config) {
    let log_level = match config.debug.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new().filter_level(log_level).init();
}
