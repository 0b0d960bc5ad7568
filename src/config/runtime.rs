use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Package loading knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderConfig {
    /// Max model files compiled concurrently within one package.
    /// TOML: `loader.compile_concurrency`. Default: `16`.
    #[serde(default = "default_compile_concurrency")]
    pub compile_concurrency: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            compile_concurrency: default_compile_concurrency(),
        }
    }
}

/// Per-package scheduler knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// When false, packages still list their schedules but no timers are started.
    /// TOML: `scheduler.enabled`. Default: `true`.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Upper bound for a single scheduled action run.
    /// TOML: `scheduler.action_timeout_secs`. Default: `300`.
    #[serde(default = "default_action_timeout_secs")]
    pub action_timeout_secs: u64,
}

impl SchedulerConfig {
    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs.max(1))
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            action_timeout_secs: default_action_timeout_secs(),
        }
    }
}

/// A project served by this process.
/// TOML: `[[projects]]` with `name` and `path`; relative paths resolve against `basic.server_root`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    pub name: String,
    pub path: PathBuf,
}

fn default_compile_concurrency() -> usize {
    16
}

fn default_enabled() -> bool {
    true
}

fn default_action_timeout_secs() -> u64 {
    300
}
