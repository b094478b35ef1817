//! Logging setup.

mod logging;

pub use logging::{build_subscriber, init_logging, parse_filter, BoxedSubscriber};
