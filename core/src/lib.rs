use log::{LevelFilter, SetLoggerError};
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Root},
    encode::{Encode, pattern::PatternEncoder},
    filter::threshold::ThresholdFilter,
};
use std::{backtrace, env};

pub mod error;
pub mod generator;
pub mod infra;
pub mod models;

pub use error::SetupError;

#[derive(Debug)]
struct BacktracePatternEncoder {
    pattern_encoder: PatternEncoder,
    is_backtrace_enabled: bool,
}

impl BacktracePatternEncoder {
    fn new(pattern: &str) -> Self {
        BacktracePatternEncoder {
            pattern_encoder: PatternEncoder::new(pattern),
            is_backtrace_enabled: env::var("RUST_BACKTRACE").is_ok()
                || env::var("RUST_LIB_BACKTRACE").is_ok(),
        }
    }
}

impl Encode for BacktracePatternEncoder {
    fn encode(
        &self,
        w: &mut dyn log4rs::encode::Write,
        record: &log::Record<'_>,
    ) -> anyhow::Result<()> {
        if record.level() == log::Level::Error && self.is_backtrace_enabled {
            let args = format_args!(
                "{}\nBacktrace:\n{}",
                record.args(),
                backtrace::Backtrace::capture()
            );
            let new_record = log::Record::builder()
                .args(args)
                .level(record.level())
                .target(record.target())
                .module_path(record.module_path())
                .file(record.file())
                .line(record.line())
                .build();
            self.pattern_encoder.encode(w, &new_record)?;
        } else {
            self.pattern_encoder.encode(w, record)?;
        }
        Ok(())
    }
}

/// Errors raised while installing the global logger.
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("failed to open log file {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid logger configuration: {0}")]
    Config(#[from] log4rs::config::runtime::ConfigErrors),
    #[error(transparent)]
    Install(#[from] SetLoggerError),
}

/// Installs the process-wide log4rs logger.
///
/// Records at `log_level` and above go to stderr. When `file_path` is given,
/// the same records are also appended to that file.
pub fn initialize_logger(log_level: LevelFilter, file_path: Option<&str>) -> Result<(), LoggerError> {
    const LOGGING_PATTERN: &str = "{d} {l} {f}:{L} - {m}\n";

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(BacktracePatternEncoder::new(LOGGING_PATTERN)))
        .build();

    let mut config_builder = Config::builder().appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(log_level)))
            .build("stderr", Box::new(stderr)),
    );
    let mut root_builder = Root::builder().appender("stderr");

    if let Some(path) = file_path {
        let logfile = FileAppender::builder()
            .encoder(Box::new(BacktracePatternEncoder::new(LOGGING_PATTERN)))
            .build(path)
            .map_err(|source| LoggerError::File {
                path: path.to_string(),
                source,
            })?;

        config_builder =
            config_builder.appender(Appender::builder().build("logfile", Box::new(logfile)));
        root_builder = root_builder.appender("logfile");
    }

    let config = config_builder.build(root_builder.build(log_level))?;
    let _handle = log4rs::init_config(config)?;

    Ok(())
}

/// Parses a textual log level such as `info` or `WARNING`.
pub fn parse_log_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Interprets a log-file setting; empty and `none` disable the file appender.
pub fn parse_log_file(value: Option<&str>, default: &str) -> Option<String> {
    match value {
        Some(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        None => Some(default.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_log_file, parse_log_level};
    use log::LevelFilter;

    #[test]
    fn log_level_parsing_is_case_insensitive() {
        assert_eq!(parse_log_level("INFO"), Some(LevelFilter::Info));
        assert_eq!(parse_log_level(" warning "), Some(LevelFilter::Warn));
        assert_eq!(parse_log_level("trace"), Some(LevelFilter::Trace));
        assert_eq!(parse_log_level("verbose"), None);
    }

    #[test]
    fn log_file_can_be_disabled() {
        assert_eq!(parse_log_file(None, "bench.log").as_deref(), Some("bench.log"));
        assert_eq!(parse_log_file(Some("none"), "bench.log"), None);
        assert_eq!(parse_log_file(Some("  "), "bench.log"), None);
        assert_eq!(
            parse_log_file(Some("/tmp/run.log"), "bench.log").as_deref(),
            Some("/tmp/run.log")
        );
    }
}
