//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// How log output is formatted. `RUST_LOG` takes precedence over `filter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    pub filter: String,
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl TracingConfig {
    /// JSON output when `AUTOMAP_LOG_JSON` is `1` or `true`.
    pub fn from_env() -> Self {
        let json = std::env::var("AUTOMAP_LOG_JSON")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true"))
            .unwrap_or(false);
        Self {
            json,
            ..Self::default()
        }
    }
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init(config: &TracingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = if config.json {
        builder.json().with_target(false).try_init()
    } else {
        builder.try_init()
    };
}
