//! Logger initialization: terminal plus file sinks, driven by the `log`
//! section of the configuration.

use std::fs::File;

use anyhow::{Context, Result};
use simplelog::{ColorChoice, CombinedLogger, LevelFilter, TermLogger, TerminalMode, WriteLogger};

use crate::config::LogConfig;

/// Initializes the combined terminal + file logger. Called once, before the
/// gateway connection is opened.
pub fn init(config: &LogConfig) -> Result<()> {
    let log_file = File::create(&config.path)
        .with_context(|| format!("failed to create log file {}", config.path))?;

    let color = if config.colorize {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            simplelog::Config::default(),
            TerminalMode::Mixed,
            color,
        ),
        WriteLogger::new(LevelFilter::Info, simplelog::Config::default(), log_file),
    ])
    .context("failed to initialize logger")?;

    Ok(())
}
