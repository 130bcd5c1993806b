//! Structured logging setup.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are enabled by the default filter.
const LOG_TARGETS: [&str; 6] = [
    "site_triage_app",
    "site_triage_classify",
    "site_triage_history",
    "site_triage_normalize",
    "site_triage_vision",
    "site_triage",
];

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level applied to workspace crates unless `RUST_LOG` is set.
    pub level: Level,
    /// Emit one JSON object per line instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json: false,
        }
    }
}

/// Builds the filter: `RUST_LOG` when set, otherwise `config.level` for
/// every workspace crate.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives: Vec<String> = LOG_TARGETS
            .iter()
            .map(|target| format!("{target}={}", config.level))
            .collect();
        EnvFilter::new(directives.join(","))
    })
}

/// Installs the global subscriber.
///
/// Returns `false` when a subscriber was already installed, which happens
/// when tests initialize logging more than once.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = env_filter(config);

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init()
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_initialization_is_rejected() {
        let config = LoggingConfig::default();
        init_logging(&config);
        assert!(!init_logging(&config));
    }
}
