//! Tracing subscriber setup.

use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::{GeneralConfig, LogFormat};

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `general.log_level`. Calling this more
/// than once leaves the first subscriber in place.
pub fn init(config: &GeneralConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    if result.is_err() {
        debug!("tracing subscriber already installed, keeping it");
    }
}
