//! Runtime configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

const DEFAULT_PRODUCER_INTERVAL_MS: u64 = 500;

/// View is logged once every this many producer ticks.
const VIEW_LOG_EVERY_TICKS: u32 = 4;

/// Process-level settings. Telemetry settings live in `TelemetryConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Rule document applied over the defaults at startup
    pub schema_file: Option<PathBuf>,

    /// Delay between simulated producer batches
    pub producer_interval: Duration,

    /// Inject the diagnostic envelope once at startup
    pub inject_diagnostic: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            schema_file: None,
            producer_interval: Duration::from_millis(DEFAULT_PRODUCER_INTERVAL_MS),
            inject_diagnostic: true,
        }
    }
}

impl RuntimeConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let producer_interval = match lookup("HMI_PRODUCER_INTERVAL_MS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    warn!(value = %raw, "Ignoring invalid HMI_PRODUCER_INTERVAL_MS");
                    defaults.producer_interval
                }
            },
            None => defaults.producer_interval,
        };

        Self {
            schema_file: lookup("HMI_SCHEMA_FILE")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),

            producer_interval,

            inject_diagnostic: lookup("HMI_INJECT_DIAGNOSTIC")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.inject_diagnostic),
        }
    }

    /// Interval of the rendered-view log line.
    #[must_use]
    pub fn view_log_interval(&self) -> Duration {
        self.producer_interval * VIEW_LOG_EVERY_TICKS
    }
}
