//! Configuration types

use serde::{Deserialize, Serialize};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filter directive (e.g. "info", "debug,tiberius=warn")
    pub level: String,

    /// Output format
    pub format: Format,

    /// Display configuration
    pub display: DisplayConfig,

    /// Service name recorded on the root span
    pub service: Option<String>,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Human-readable, multi-line
    Pretty,
    /// Single-line output
    Compact,
    /// Structured JSON output
    Json,
}

/// Display configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Show timestamps
    pub time: bool,
    /// Show source location (file:line)
    pub source: bool,
    /// Show target module
    pub target: bool,
    /// Use ANSI colors
    pub colors: bool,
    /// Flatten JSON events
    pub flatten: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Compact,
            display: DisplayConfig::default(),
            service: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            time: true,
            source: cfg!(debug_assertions),
            target: true,
            colors: std::io::IsTerminal::is_terminal(&std::io::stderr()),
            flatten: true,
        }
    }
}

impl Config {
    /// Create configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// Reads `AZSECRETS_LOG` (falling back to `RUST_LOG`),
    /// `AZSECRETS_LOG_FORMAT`, `AZSECRETS_LOG_TIME`, `AZSECRETS_LOG_COLORS`
    /// and `AZSECRETS_SERVICE`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(level) = Self::filter_from(&lookup) {
            config.level = level;
        }

        if let Some(format) = lookup("AZSECRETS_LOG_FORMAT") {
            config.format = match format.to_lowercase().as_str() {
                "pretty" => Format::Pretty,
                "json" => Format::Json,
                _ => Format::Compact,
            };
        }

        if let Some(v) = lookup("AZSECRETS_LOG_TIME") {
            config.display.time = flag(&v);
        }
        if let Some(v) = lookup("AZSECRETS_LOG_COLORS") {
            config.display.colors = flag(&v);
        }
        config.service = lookup("AZSECRETS_SERVICE");

        config
    }

    /// The explicit filter directive, if one is configured
    pub fn filter_from<F>(lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup("AZSECRETS_LOG")
            .or_else(|| lookup("RUST_LOG"))
            .filter(|v| !v.trim().is_empty())
    }

    /// Development configuration (pretty, debug level)
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: Format::Pretty,
            display: DisplayConfig {
                source: true,
                ..DisplayConfig::default()
            },
            ..Self::default()
        }
    }

    /// Production configuration (JSON, info level)
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Json,
            display: DisplayConfig {
                colors: false,
                source: false,
                flatten: true,
                ..DisplayConfig::default()
            },
            ..Self::default()
        }
    }
}

fn flag(value: &str) -> bool {
    value != "0" && !value.eq_ignore_ascii_case("false")
}
