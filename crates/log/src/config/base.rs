//! Core configuration types

use serde::{Deserialize, Serialize};

/// Logging configuration
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Level filter directive (e.g. "info", "debug,crossfire_memory=trace")
    pub level: String,

    /// Output format
    pub format: Format,

    /// Output destination
    pub writer: Writer,

    /// Colorize output
    pub ansi: bool,

    /// Show the event target (module path)
    pub target: bool,

    /// Show timestamps
    pub time: bool,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Human-readable multi-line output
    Pretty,
    /// Compact single-line output
    Compact,
    /// Structured JSON output
    Json,
}

/// Output destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Writer {
    /// Write to stderr
    #[default]
    Stderr,
    /// Write to stdout
    Stdout,
    /// Write through the libtest output capture
    Test,
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Trace level
    Trace,
    /// Debug level
    Debug,
    /// Info level
    Info,
    /// Warn level
    Warn,
    /// Error level
    Error,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Trace => write!(f, "trace"),
            Level::Debug => write!(f, "debug"),
            Level::Info => write!(f, "info"),
            Level::Warn => write!(f, "warn"),
            Level::Error => write!(f, "error"),
        }
    }
}

impl From<Level> for tracing::Level {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace => tracing::Level::TRACE,
            Level::Debug => tracing::Level::DEBUG,
            Level::Info => tracing::Level::INFO,
            Level::Warn => tracing::Level::WARN,
            Level::Error => tracing::Level::ERROR,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Compact,
            writer: Writer::Stderr,
            ansi: cfg!(feature = "ansi"),
            target: true,
            time: true,
        }
    }
}

impl Config {
    /// Replace the level directive with a single level
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Level::Trace, "trace")]
    #[case(Level::Debug, "debug")]
    #[case(Level::Info, "info")]
    #[case(Level::Warn, "warn")]
    #[case(Level::Error, "error")]
    fn level_display_matches_filter_syntax(#[case] level: Level, #[case] expected: &str) {
        assert_eq!(level.to_string(), expected);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "level": "debug", "format": "json" }"#).unwrap();

        assert_eq!(config.level, "debug");
        assert_eq!(config.format, Format::Json);
        assert_eq!(config.writer, Writer::Stderr);
        assert!(config.time);
    }

    #[test]
    fn with_level_overrides_directive() {
        let config = Config::default().with_level(Level::Warn);
        assert_eq!(config.level, "warn");
    }
}
