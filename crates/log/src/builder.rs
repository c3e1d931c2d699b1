//! Logger builder

use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::LogError;
use crate::config::{Config, Format};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Applies the shared display options and the filter, then boxes the layer.
macro_rules! fmt_layer {
    ($layer:expr, $display:expr, $filter:ident) => {{
        let layer = $layer
            .with_writer(std::io::stderr)
            .with_ansi($display.colors)
            .with_target($display.target)
            .with_file($display.source)
            .with_line_number($display.source);
        if $display.time {
            layer.with_filter($filter).boxed()
        } else {
            layer.without_time().with_filter($filter).boxed()
        }
    }};
}

/// Logger builder
pub struct LoggerBuilder {
    config: Config,
}

/// Guard that keeps the root span entered for the lifetime of the program
pub struct LoggerGuard {
    _root_span: Option<tracing::span::EnteredSpan>,
}

impl LoggerBuilder {
    /// Create builder from config
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// The filter this builder will install
    pub fn filter(&self) -> Result<EnvFilter, LogError> {
        EnvFilter::try_new(&self.config.level).map_err(|e| LogError::Filter {
            filter: self.config.level.clone(),
            reason: e.to_string(),
        })
    }

    /// Build and install the global subscriber
    ///
    /// # Errors
    ///
    /// Returns error if the filter cannot be parsed or a subscriber is
    /// already installed.
    pub fn build(self) -> Result<LoggerGuard, LogError> {
        let filter = self.filter()?;
        let display = &self.config.display;

        let layer: BoxedLayer = match self.config.format {
            Format::Pretty => fmt_layer!(tracing_subscriber::fmt::layer().pretty(), display, filter),
            Format::Compact => {
                fmt_layer!(tracing_subscriber::fmt::layer().compact(), display, filter)
            }
            Format::Json => fmt_layer!(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .flatten_event(display.flatten),
                display,
                filter
            ),
        };

        Registry::default()
            .with(layer)
            .try_init()
            .map_err(|e| LogError::AlreadyInitialized(e.to_string()))?;

        let root_span = self
            .config
            .service
            .as_deref()
            .map(|service| tracing::info_span!("app", service).entered());

        Ok(LoggerGuard {
            _root_span: root_span,
        })
    }
}
