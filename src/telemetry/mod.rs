//! Logging and metric events.
//!
//! Everything goes through `tracing`. Metrics are plain events on the
//! `metrics` target so they can be filtered or shipped separately.

use std::collections::HashMap;

use crate::config::LoggerSettings;

/// Configuration for the telemetry system
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Name of the service
    pub service_name: String,
    /// Log level, used when `RUST_LOG` is unset
    pub log_level: String,
    /// Colored console output
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "agent-designer".to_string(),
            log_level: "info".to_string(),
            ansi: true,
        }
    }
}

impl From<&LoggerSettings> for TelemetryConfig {
    fn from(settings: &LoggerSettings) -> Self {
        Self {
            log_level: settings.level.clone(),
            ansi: settings.ansi,
            ..Default::default()
        }
    }
}

/// Initialize the global subscriber.
///
/// Returns an error if a global subscriber is already installed.
pub fn init_telemetry(
    config: TelemetryConfig,
) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(config.ansi)
        .try_init()?;

    tracing::debug!(service = %config.service_name, "Telemetry initialized");
    Ok(())
}

/// Record a single metric with tags
pub fn add_metric(name: &str, value: f64, tags: &[(&str, String)]) {
    let tags_str = tags
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",");

    tracing::info!(
        target: "metrics",
        metric_name = %name,
        metric_value = %value,
        metric_tags = %tags_str,
        "Recorded metric"
    );
}

/// Record several untagged metrics
pub fn add_metrics(metrics: HashMap<&'static str, f64>) {
    for (key, value) in metrics.iter() {
        add_metric(key, *value, &[]);
    }
}

/// A guard that records how long an operation took when dropped
pub fn span_duration(name: &'static str) -> impl Drop {
    struct Guard {
        name: &'static str,
        start: std::time::Instant,
    }

    impl Drop for Guard {
        fn drop(&mut self) {
            let duration = self.start.elapsed();
            tracing::info!(
                target: "metrics",
                duration_ms = duration.as_millis() as f64,
                operation = self.name,
                "Operation completed"
            );
        }
    }

    Guard {
        name,
        start: std::time::Instant::now(),
    }
}
