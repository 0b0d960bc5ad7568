use crate::{
    config::{Config, LoaderConfig, SchedulerConfig},
    connection::{ConnectionFactory, JsonConnectionFactory},
    model::{ModelCompiler, OutlineCompiler},
    package::{FileEnumerator, LoadObserver, LocalFileEnumerator, TracingLoadObserver},
    scheduler::{ActionExecutor, TracingActionExecutor},
};
use std::sync::Arc;
use tracing::info;

/// Collaborators shared by every project and package.
#[derive(Clone)]
pub struct Services {
    pub compiler: Arc<dyn ModelCompiler>,
    pub connections: Arc<dyn ConnectionFactory>,
    pub files: Arc<dyn FileEnumerator>,
    pub observer: Arc<dyn LoadObserver>,
    pub executor: Arc<dyn ActionExecutor>,
    pub loader: Arc<LoaderConfig>,
    pub scheduler: Arc<SchedulerConfig>,
}

impl Services {
    /// File-system backed services driven by `cfg`.
    pub fn local(cfg: &Config) -> Self {
        info!(
            compile_concurrency = cfg.loader.compile_concurrency,
            scheduler_enabled = cfg.scheduler.enabled,
            action_timeout_secs = cfg.scheduler.action_timeout_secs,
            "Publisher services configured"
        );

        Self {
            compiler: Arc::new(OutlineCompiler),
            connections: Arc::new(JsonConnectionFactory),
            files: Arc::new(LocalFileEnumerator),
            observer: Arc::new(TracingLoadObserver),
            executor: Arc::new(TracingActionExecutor),
            loader: Arc::new(cfg.loader.clone()),
            scheduler: Arc::new(cfg.scheduler.clone()),
        }
    }
}
