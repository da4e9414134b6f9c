//! Open Proxy - Proxy Scraper and Validator
//!
//! Collects candidate proxies from public lists and checks which of them
//! actually relay traffic, probing many candidates concurrently.

pub mod error;
pub mod proxy;

pub use error::{ConfigError, ProbeError};
pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `info`, or `debug` for this
/// crate when `verbose` is set.
pub fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "info,open_proxy=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
