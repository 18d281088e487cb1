//! Tracing subscriber setup driven by [`LoggingSettings`]

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingSettings};

/// Install a global `fmt` subscriber
///
/// `RUST_LOG` wins over the configured level when set. Returns `false` if a
/// global subscriber was already installed, which is normal when several tests
/// share one process.
pub fn init_tracing(settings: &LoggingSettings) -> bool {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(&settings.level));
    let installed = match settings.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Full => builder.try_init(),
    };
    installed.is_ok()
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
