//! Tracing subscriber setup shared by the binaries

use crate::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
///
/// The configured level applies to this crate; HTTP tracing stays at `info`
/// unless the level asks for more.
pub fn default_filter(config: &LoggingConfig) -> String {
    let level = config.level.trim().to_lowercase();
    let http = match level.as_str() {
        "trace" | "debug" => level.as_str(),
        _ => "info",
    };
    format!("singularity={},tower_http={}", level, http)
}

/// Install the global subscriber
///
/// Events go to stderr so command output on stdout stays parseable.
/// `RUST_LOG` takes precedence over the configured level. Calling this twice
/// is harmless; the second call leaves the first subscriber in place.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(config)));

    let result = if config.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Tracing subscriber already installed");
    }
}
