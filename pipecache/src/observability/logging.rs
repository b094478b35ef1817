//! Builds and installs the `tracing` subscriber.

use crate::config::{LogFormat, LoggingConfig};
use crate::errors::PipecacheError;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// A type-erased subscriber, plain or JSON.
pub type BoxedSubscriber = Box<dyn Subscriber + Send + Sync>;

/// Installs a subscriber for the process.
///
/// `RUST_LOG` takes precedence over [`LoggingConfig::filter`]. Fails if a
/// global subscriber is already installed.
///
/// ```bash
/// RUST_LOG=pipecache=debug my-app
/// ```
pub fn init_logging(config: &LoggingConfig) -> Result<(), PipecacheError> {
    build_subscriber(config)?
        .try_init()
        .map_err(|e| PipecacheError::Logging(format!("failed to install subscriber: {e}")))
}

/// Builds the subscriber [`init_logging`] would install, writing to stdout.
///
/// Useful with [`tracing::subscriber::with_default`] for scoped logging.
pub fn build_subscriber(config: &LoggingConfig) -> Result<BoxedSubscriber, PipecacheError> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| parse_filter(&config.filter))?;
    Ok(layered(config, filter, std::io::stdout))
}

/// Parses filter directives such as `info,pipecache::query=debug`.
pub fn parse_filter(directives: &str) -> Result<EnvFilter, PipecacheError> {
    EnvFilter::try_new(directives)
        .map_err(|e| PipecacheError::Logging(format!("invalid filter '{directives}': {e}")))
}

fn layered<W>(config: &LoggingConfig, filter: EnvFilter, writer: W) -> BoxedSubscriber
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Plain => Box::new(
            registry.with(
                fmt::layer()
                    .with_target(config.with_target)
                    .with_writer(writer),
            ),
        ),
        LogFormat::Json => Box::new(
            registry.with(
                fmt::layer()
                    .json()
                    .with_target(config.with_target)
                    .with_writer(writer),
            ),
        ),
    }
}
