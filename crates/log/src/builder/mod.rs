//! Logger builder implementation

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, Format, Writer};
use crate::error::{LogError, LogResult};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Applies the display options shared by every format and boxes the result
macro_rules! fmt_layer {
    ($layer:expr, $config:expr, $writer:expr) => {{
        let layer = $layer
            .with_writer($writer)
            .with_ansi($config.ansi)
            .with_target($config.target);

        let boxed: BoxedLayer = if $config.time {
            layer.boxed()
        } else {
            layer.without_time().boxed()
        };
        boxed
    }};
}

/// Logger builder
#[derive(Debug, Clone)]
pub struct LoggerBuilder {
    config: Config,
}

/// Guard returned by a successful initialization
///
/// The global subscriber lives for the rest of the process; the guard only
/// records which configuration was installed.
#[derive(Debug)]
#[must_use = "dropping the guard immediately hides which logger was installed"]
pub struct LoggerGuard {
    config: Option<Config>,
}

impl LoggerBuilder {
    /// Create builder from config
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Validate the level directive without installing anything
    pub fn filter(&self) -> LogResult<EnvFilter> {
        EnvFilter::try_new(&self.config.level)
            .map_err(|e| LogError::invalid_filter(&self.config.level, e.to_string()))
    }

    /// Build and install the global logger
    ///
    /// # Errors
    ///
    /// - [`LogError::InvalidFilter`] if the level directive cannot be parsed
    /// - [`LogError::AlreadyInitialized`] if a global subscriber exists
    pub fn build(self) -> LogResult<LoggerGuard> {
        let filter = self.filter()?;
        let writer = make_writer(self.config.writer);

        let fmt_layer = match self.config.format {
            Format::Pretty => fmt_layer!(tracing_subscriber::fmt::layer().pretty(), self.config, writer),
            Format::Compact => {
                fmt_layer!(tracing_subscriber::fmt::layer().compact(), self.config, writer)
            }
            Format::Json => fmt_layer!(tracing_subscriber::fmt::layer().json(), self.config, writer),
        };

        Registry::default()
            .with(fmt_layer)
            .with(filter)
            .try_init()
            .map_err(|_| LogError::AlreadyInitialized)?;

        Ok(LoggerGuard {
            config: Some(self.config),
        })
    }
}

fn make_writer(writer: Writer) -> BoxMakeWriter {
    match writer {
        Writer::Stderr => BoxMakeWriter::new(std::io::stderr),
        Writer::Stdout => BoxMakeWriter::new(std::io::stdout),
        Writer::Test => BoxMakeWriter::new(tracing_subscriber::fmt::TestWriter::new()),
    }
}

impl LoggerGuard {
    pub(crate) fn noop() -> Self {
        Self { config: None }
    }

    /// Whether this guard belongs to the call that installed the logger
    pub fn is_active(&self) -> bool {
        self.config.is_some()
    }

    /// Configuration that was installed, if this guard installed one
    pub fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }
}
