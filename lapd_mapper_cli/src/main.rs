//! # lapd_mapper_cli
//!
//! Part of the lapd_mapper crate family.
//!
//! Maps a LaPD HDF5 file from the command line and reports what was found.
//!
//! ## Use
//!
//! ```bash
//! lapd_mapper_cli -p config.yml          # map the configured file
//! lapd_mapper_cli -p config.yml new      # write a template configuration
//! lapd_mapper_cli -p config.yml --log mapper.log --verbose
//! ```
//!
//! Without an `output_path` in the configuration the summary is printed to stdout.
use clap::{Arg, ArgAction, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use liblapd_mapper::config::Config;
use liblapd_mapper::process::process;
use liblapd_mapper::summary::MapSummary;

fn make_template_config(path: &Path) {
    match Config::default().write_config_file(path) {
        Ok(()) => spdlog::info!("Done."),
        Err(e) => spdlog::error!("Could not write template config: {e}"),
    }
}

/// Build the default logger: the terminal, plus a log file if asked for
fn setup_logging(log_path: Option<&PathBuf>, verbose: bool) -> Result<(), spdlog::Error> {
    let level = if verbose {
        spdlog::Level::Debug
    } else {
        spdlog::Level::Info
    };
    let mut builder = spdlog::Logger::builder();
    builder
        .sinks(spdlog::default_logger().sinks().iter().cloned())
        .level_filter(spdlog::LevelFilter::MoreSevereEqual(level))
        .flush_level_filter(spdlog::LevelFilter::MoreSevereEqual(spdlog::Level::Warn));
    if let Some(path) = log_path {
        let file_sink = Arc::new(
            spdlog::sink::FileSink::builder()
                .path(path.clone())
                .formatter(Box::new(spdlog::formatter::PatternFormatter::new(
                    spdlog::formatter::pattern!(
                        "[{date_short} {time_short}] - [{^{level}}] - {payload}{eol}"
                    ),
                )))
                .truncate(true)
                .build()?,
        );
        builder.sink(file_sink);
    }
    spdlog::set_default_logger(Arc::new(builder.build()?));
    Ok(())
}

fn report(summary: &MapSummary) {
    spdlog::info!("File: {}", summary.file);
    spdlog::info!("LaPD HDF5 software version: {}", summary.version);
    spdlog::info!("Data run: {}", summary.run_info.run_name);
    spdlog::info!("MSI diagnostics: {:?}", summary.msi.names());
    spdlog::info!("Digitizers: {:?}", summary.digitizers.names());
    if let Some(main) = &summary.main_digitizer {
        spdlog::info!("Main digitizer: {main}");
    }
    spdlog::info!("Control devices: {:?}", summary.controls.names());
    for unknown in summary.unknowns.iter() {
        spdlog::info!("Unknown: {unknown}");
    }
    if !summary.warnings.is_empty() {
        spdlog::warn!("Mapping raised {} warning(s)", summary.warnings.len());
    }
}

fn main() {
    // Create a cli
    let matches = Command::new("lapd_mapper_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .required(true)
                .help("Path to the configuration file"),
        )
        .arg(
            Arg::new("log")
                .short('l')
                .long("log")
                .help("Also write the log to this file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log debug messages"),
        )
        .get_matches();

    // Initialize feedback
    let log_path = matches.get_one::<String>("log").map(PathBuf::from);
    if let Err(e) = setup_logging(log_path.as_ref(), matches.get_flag("verbose")) {
        spdlog::error!("Could not create logger: {e}");
        return;
    }

    // Parse the cli
    let Some(config_path) = matches.get_one::<String>("path").map(PathBuf::from) else {
        spdlog::error!("A configuration path is required");
        return;
    };

    if let Some(("new", _)) = matches.subcommand() {
        spdlog::info!("Making a template config at {}...", config_path.display());
        make_template_config(&config_path);
        return;
    }

    // Load our config
    spdlog::info!("Loading config from {}...", config_path.display());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            spdlog::error!("{e}");
            return;
        }
    };
    spdlog::info!("Config successfully loaded.");
    spdlog::info!("HDF5 Path: {}", config.hdf_path.display());
    if let Some(output) = config.get_output_file_name() {
        spdlog::info!("Summary Path: {}", output.display());
    }
    spdlog::info!("Custom state patterns: {}", config.state_patterns.len());

    match process(&config) {
        Ok(summary) => {
            report(&summary);
            if config.output_path.is_none() {
                match summary.to_yaml() {
                    Ok(yaml) => println!("{yaml}"),
                    Err(e) => spdlog::error!("{e}"),
                }
            }
            spdlog::info!("Successfully mapped file!");
        }
        Err(e) => spdlog::error!("Mapping failed with error: {e}"),
    }
    spdlog::default_logger().flush();
}
