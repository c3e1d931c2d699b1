//! Logging setup shared by the azure-secrets binaries.
//!
//! ```rust,no_run
//! fn main() -> Result<(), azsecrets_log::LogError> {
//!     let _guard = azsecrets_log::auto_init()?;
//!     tracing::info!(port = 1433, "connecting");
//!     Ok(())
//! }
//! ```
//!
//! Everything is written to stderr so stdout stays free for program output.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod builder;
mod config;

pub use builder::{LoggerBuilder, LoggerGuard};
pub use config::{Config, DisplayConfig, Format};

/// Error type for logger initialisation
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The filter directive could not be parsed
    #[error("Invalid filter '{filter}': {reason}")]
    Filter {
        /// The rejected filter string
        filter: String,
        /// Parser message
        reason: String,
    },

    /// A global subscriber was already installed
    #[error("Logger already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Pick a configuration from the environment and install it.
///
/// An explicit filter in `AZSECRETS_LOG` or `RUST_LOG` wins; otherwise debug
/// builds get [`Config::development`] and release builds [`Config::production`].
pub fn auto_init() -> Result<LoggerGuard, LogError> {
    let lookup = |name: &str| std::env::var(name).ok();
    if Config::filter_from(lookup).is_some() {
        init_with(Config::from_lookup(lookup))
    } else if cfg!(debug_assertions) {
        init_with(Config::development())
    } else {
        init_with(Config::production())
    }
}

/// Install the default configuration
pub fn init() -> Result<LoggerGuard, LogError> {
    init_with(Config::default())
}

/// Install a custom configuration
pub fn init_with(config: Config) -> Result<LoggerGuard, LogError> {
    LoggerBuilder::from_config(config).build()
}
