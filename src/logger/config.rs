/// Logger configuration, seeded from command-line flags
use super::levels::LogLevel;
use super::tags::LogTag;
use crate::arguments::get_cmd_args;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Highest level shown without per-tag flags
    pub min_level: LogLevel,

    /// Tags with --debug-<tag> enabled
    pub debug_tags: HashSet<String>,

    /// Tags with --verbose-<tag> enabled
    pub verbose_tags: HashSet<String>,

    /// Restrict output to these tags (empty = all)
    pub enabled_tags: HashSet<String>,

    /// Mirror output into logs/mist.log
    pub file_logging: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            verbose_tags: HashSet::new(),
            enabled_tags: HashSet::new(),
            file_logging: false,
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

/// Build the logger configuration from the process arguments
///
/// Recognized flags: --quiet, --verbose, --log-file, --debug-<tag>,
/// --verbose-<tag>, --log-level <level>.
pub fn init_from_args() {
    set_logger_config(config_from_args(&get_cmd_args()));
}

pub(crate) fn config_from_args(args: &[String]) -> LoggerConfig {
    let mut config = LoggerConfig::default();

    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--quiet" => config.min_level = LogLevel::Warning,
            "--verbose" => config.min_level = LogLevel::Verbose,
            "--log-file" => config.file_logging = true,
            "--log-level" => {
                if let Some(level) = iter.peek().and_then(|v| LogLevel::parse(v)) {
                    config.min_level = level;
                    iter.next();
                }
            }
            other => {
                if let Some(tag) = other.strip_prefix("--debug-") {
                    config.debug_tags.insert(tag.to_lowercase());
                } else if let Some(tag) = other.strip_prefix("--verbose-") {
                    config.verbose_tags.insert(tag.to_lowercase());
                }
            }
        }
    }

    config
}

pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    let config = LOGGER_CONFIG.read();
    config.min_level >= LogLevel::Debug || config.debug_tags.contains(&tag.to_debug_key())
}

pub fn is_verbose_enabled_for_tag(tag: &LogTag) -> bool {
    LOGGER_CONFIG.read().verbose_tags.contains(&tag.to_debug_key())
}
