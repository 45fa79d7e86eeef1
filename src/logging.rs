use crate::config::Config;
use anyhow::Context;
use flexi_logger::{detailed_format, FileSpec, Logger, LoggerHandle};

/// Logs to `<log_dir>/paydesk.log`; the terminal belongs to the UI.
pub fn init(config: &Config) -> anyhow::Result<LoggerHandle> {
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("Failed to create log directory {}", config.log_dir.display()))?;
    Logger::try_with_str(&config.log_spec)
        .with_context(|| format!("Invalid log specification '{}'", config.log_spec))?
        .log_to_file(
            FileSpec::default()
                .directory(&config.log_dir)
                .basename("paydesk")
                .suppress_timestamp(),
        )
        .append()
        .format_for_files(detailed_format)
        .start()
        .context("Failed to start logger")
}
