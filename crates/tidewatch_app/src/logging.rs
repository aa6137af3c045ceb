//! Logger initialization for the tidewatch binary.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Destination for log output.
pub enum LogDestination {
    /// Write to stderr/stdout only.
    Terminal,
    /// Append to the given file only.
    File(PathBuf),
    /// Write to the terminal and append to the given file.
    Both(PathBuf),
}

/// Installs the global logger. Calling it twice leaves the first logger in
/// place.
pub fn initialize(destination: LogDestination, verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = build_config();
    let terminal = || -> Box<dyn SharedLogger> {
        TermLogger::new(level, config.clone(), TerminalMode::Mixed, ColorChoice::Auto)
    };

    let loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::Terminal => vec![terminal()],
        LogDestination::File(path) => match create_file_logger(&path, level, config.clone()) {
            Some(file_logger) => vec![file_logger],
            None => vec![terminal()],
        },
        LogDestination::Both(path) => {
            let mut loggers = vec![terminal()];
            if let Some(file_logger) = create_file_logger(&path, level, config.clone()) {
                loggers.push(file_logger);
            }
            loggers
        }
    };

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        // Records from dependencies are dropped.
        .add_filter_allow_str("tidewatch")
        .build()
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<WriteLogger<File>>> {
    let file = File::options().create(true).append(true).open(path);
    match file {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not open log file at {}: {}", path.display(), err);
            None
        }
    }
}
