use std::path::PathBuf;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::non_blocking;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogRotation, LoggingConfig};
use crate::error::{Result, DubError};

/// HTTP stack crates that are chatty at debug level
const QUIET_TARGETS: &[&str] = &["hyper=warn", "reqwest=info", "h2=warn"];

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

pub fn level_for(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::INFO }
}

/// Where the active log file lives, relative paths resolved against the cwd
pub fn log_path(config: &LoggingConfig) -> Result<PathBuf> {
    Ok(std::path::absolute(&config.dir)?.join(&config.file_name))
}

fn build_filter(verbose: bool) -> Result<EnvFilter> {
    let mut filter = EnvFilter::builder()
        .with_default_directive(level_for(verbose).into())
        .from_env_lossy();
    for target in QUIET_TARGETS {
        let directive = target
            .parse()
            .map_err(|e| DubError::Config(format!("Bad log directive '{}': {}", target, e)))?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

/// Install console and file logging.
///
/// Log lines are written to the file by a background worker; keep the
/// returned guard alive until exit so buffered lines get flushed.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.dir)?;
    let appender = RollingFileAppender::new(config.rotation.into(), &config.dir, &config.file_name);
    let (file_writer, guard) = non_blocking(appender);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time()
        .compact();

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(build_filter(verbose)?)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| DubError::Config(format!("Failed to initialize logging: {}", e)))?;

    info!("Logging {} and above to {}", level_for(verbose), log_path(config)?.display());
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_follows_verbose_flag() {
        assert_eq!(level_for(true), Level::DEBUG);
        assert_eq!(level_for(false), Level::INFO);
    }

    #[test]
    fn test_log_path_joins_configured_file() {
        let config = LoggingConfig {
            dir: PathBuf::from("/var/log/dubclient"),
            file_name: "client.log".to_string(),
            rotation: LogRotation::Never,
        };
        assert_eq!(log_path(&config).unwrap(), PathBuf::from("/var/log/dubclient/client.log"));
    }

    #[test]
    fn test_quiet_targets_parse() {
        assert!(build_filter(false).is_ok());
        assert!(build_filter(true).is_ok());
    }

    #[test]
    fn test_rotation_mapping() {
        assert_eq!(Rotation::from(LogRotation::Hourly), Rotation::HOURLY);
        assert_eq!(Rotation::from(LogRotation::Never), Rotation::NEVER);
    }
}
