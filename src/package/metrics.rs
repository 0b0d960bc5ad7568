use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadOutcome {
    Success,
    /// Construction failed; a degraded entry was served instead.
    Error,
    /// No manifest; nothing was constructed.
    NotFound,
}

impl LoadOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadOutcome::Success => "success",
            LoadOutcome::Error => "error",
            LoadOutcome::NotFound => "not_found",
        }
    }
}

/// Receives the duration and outcome of every package load attempt.
pub trait LoadObserver: Send + Sync {
    fn record_load(&self, package_name: &str, elapsed: Duration, outcome: LoadOutcome);
}

/// Emits `malloy_package_load_duration` samples as structured log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLoadObserver;

impl LoadObserver for TracingLoadObserver {
    fn record_load(&self, package_name: &str, elapsed: Duration, outcome: LoadOutcome) {
        info!(
            target: "publisher::metrics",
            metric = "malloy_package_load_duration",
            malloy_package_name = package_name,
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            status = outcome.as_str(),
            "Package load recorded"
        );
    }
}
