//! Package construction.
//!
//! A package is a directory holding a `publisher.json` manifest. Construction reads
//! the manifest, lists embedded databases, resolves connections, compiles every model
//! and starts the package scheduler. Anything past the manifest check that fails
//! yields a degraded package instead of an error.

mod databases;
mod discovery;
mod loader;
mod manifest;
mod metrics;

pub use databases::{DATABASE_FILE_SUFFIX, read_databases};
pub use discovery::{FileEnumerator, LocalFileEnumerator};
pub use loader::ModelLoader;
pub use manifest::{PACKAGE_MANIFEST_NAME, read_manifest, validate_manifest};
pub use metrics::{LoadObserver, LoadOutcome, TracingLoadObserver};

use crate::{
    bootstrap::Services,
    connection::{ConnectionMap, resolve_connections},
    error::PublisherError,
    model::Model,
    scheduler::Scheduler,
    utils::logging::with_pretty_json_debug,
};
use publisher_schema::{Database, Schedule};
use std::{collections::HashMap, path::Path, time::Instant};
use tracing::{debug, error, info};

const DEGRADED_DESCRIPTION_PREFIX: &str = "Unable to load package: ";

#[derive(Debug)]
pub struct Package {
    name: String,
    metadata: publisher_schema::Package,
    databases: Vec<Database>,
    models: HashMap<String, Model>,
    scheduler: Option<Scheduler>,
    degraded: bool,
}

impl Package {
    /// Constructs a package from its directory.
    ///
    /// Only a missing manifest is returned as an error (`PackageNotFound`). Every
    /// attempt reports its duration and outcome to the load observer.
    pub async fn create(
        package_name: &str,
        package_path: &Path,
        project_connections: &ConnectionMap,
        services: &Services,
    ) -> Result<Self, PublisherError> {
        let started = Instant::now();

        if let Err(e) = validate_manifest(package_name, package_path).await {
            services
                .observer
                .record_load(package_name, started.elapsed(), LoadOutcome::NotFound);
            return Err(e);
        }

        match Self::build(package_name, package_path, project_connections, services).await {
            Ok(package) => {
                let elapsed = started.elapsed();
                services
                    .observer
                    .record_load(package_name, elapsed, LoadOutcome::Success);
                info!(
                    package = package_name,
                    models = package.models.len(),
                    databases = package.databases.len(),
                    elapsed_ms = elapsed.as_millis(),
                    "Package loaded"
                );
                with_pretty_json_debug(&package.list_models(), |models| {
                    debug!(package = package_name, models = %models, "Package models");
                });
                Ok(package)
            }
            Err(e) => {
                services
                    .observer
                    .record_load(package_name, started.elapsed(), LoadOutcome::Error);
                error!(package = package_name, error = %e, "Package failed to load; serving degraded entry");
                Ok(Self::degraded(package_name, &e))
            }
        }
    }

    async fn build(
        package_name: &str,
        package_path: &Path,
        project_connections: &ConnectionMap,
        services: &Services,
    ) -> Result<Self, PublisherError> {
        let metadata = read_manifest(package_name, package_path).await?;
        let databases = read_databases(package_path, services.files.as_ref()).await?;
        let connections = resolve_connections(
            project_connections,
            package_path,
            services.connections.as_ref(),
        )
        .await?;

        let models = ModelLoader::new(
            services.compiler.as_ref(),
            services.files.as_ref(),
            services.loader.compile_concurrency,
        )
        .load(package_name, package_path, &connections)
        .await?;

        let scheduler = Scheduler::create(
            package_name,
            &models,
            &connections,
            services.executor.clone(),
            &services.scheduler,
        )?;

        Ok(Self {
            name: package_name.to_string(),
            metadata,
            databases,
            models,
            scheduler,
            degraded: false,
        })
    }

    /// Placeholder served in place of a package that failed to load.
    pub fn degraded(package_name: &str, error: &PublisherError) -> Self {
        Self {
            name: package_name.to_string(),
            metadata: publisher_schema::Package {
                name: package_name.to_string(),
                description: Some(format!("{DEGRADED_DESCRIPTION_PREFIX}{error}")),
            },
            databases: Vec::new(),
            models: HashMap::new(),
            scheduler: None,
            degraded: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &publisher_schema::Package {
        &self.metadata
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn list_databases(&self) -> &[Database] {
        &self.databases
    }

    pub fn get_model(&self, path: &str) -> Option<&Model> {
        self.models.get(path)
    }

    /// Model summaries ordered by path.
    pub fn list_models(&self) -> Vec<publisher_schema::Model> {
        let mut models: Vec<_> = self
            .models
            .values()
            .map(Model::summary)
            .collect();
        models.sort_by(|a, b| a.path.cmp(&b.path));
        models
    }

    pub fn list_schedules(&self) -> Vec<Schedule> {
        self.scheduler
            .as_ref()
            .map(Scheduler::list)
            .unwrap_or_default()
    }

    /// Stops the package scheduler and waits for in-flight actions.
    pub async fn shutdown(&self) {
        if let Some(scheduler) = &self.scheduler {
            scheduler.shutdown().await;
        }
    }
}
