//! A project is a directory whose immediate subdirectories are packages.

mod actor;

pub use actor::{ProjectActorMessage, ProjectHandle, spawn};

use crate::{
    bootstrap::Services,
    connection::ConnectionMap,
    error::PublisherError,
    package::Package,
};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info, warn};

/// Builds the packages of one project from its root and connection baseline.
#[derive(Clone)]
pub struct PackageBuilder {
    root: PathBuf,
    connections: Arc<ConnectionMap>,
    services: Services,
}

impl PackageBuilder {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Constructs `<root>/<package_name>`. Names that are not a single path segment
    /// are `PackageNotFound`.
    pub async fn build(&self, package_name: &str) -> Result<Package, PublisherError> {
        if !is_package_name(package_name) {
            return Err(PublisherError::PackageNotFound(package_name.to_string()));
        }
        Package::create(
            package_name,
            &self.root.join(package_name),
            &self.connections,
            &self.services,
        )
        .await
    }
}

pub struct Project {
    name: String,
    builder: PackageBuilder,
    packages: HashMap<String, Arc<Package>>,
}

impl Project {
    /// Loads project connections and every package under `root` concurrently.
    ///
    /// Subdirectories without a manifest are skipped. A missing root is `ProjectNotFound`.
    pub async fn load(name: &str, root: &Path, services: Services) -> Result<Self, PublisherError> {
        let mut dir = tokio::fs::read_dir(root).await.map_err(|e| {
            warn!(project = name, root = %root.display(), error = %e, "Cannot read project root");
            PublisherError::ProjectNotFound(name.to_string())
        })?;

        let connections: ConnectionMap = services
            .connections
            .create_connections(root)
            .await?
            .into_iter()
            .map(|connection| (connection.name().to_string(), Arc::new(connection)))
            .collect();

        let mut package_names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(package_name) = entry.file_name().to_str() {
                package_names.push(package_name.to_string());
            }
        }
        package_names.sort();

        let builder = PackageBuilder {
            root: root.to_path_buf(),
            connections: Arc::new(connections),
            services,
        };

        let loads = package_names.iter().map(|package_name| {
            let builder = &builder;
            async move { (package_name.clone(), builder.build(package_name).await) }
        });

        let mut packages = HashMap::new();
        for (package_name, result) in futures::future::join_all(loads).await {
            match result {
                Ok(package) => {
                    packages.insert(package_name, Arc::new(package));
                }
                Err(e) if e.is_not_found() => {
                    debug!(project = name, package = %package_name, "Directory has no manifest; skipped");
                }
                Err(e) => {
                    warn!(project = name, package = %package_name, error = %e, "Package skipped");
                }
            }
        }

        info!(
            project = name,
            root = %root.display(),
            packages = packages.len(),
            connections = builder.connections.len(),
            "Project loaded"
        );

        Ok(Self {
            name: name.to_string(),
            builder,
            packages,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        self.builder.root()
    }

    pub fn builder(&self) -> &PackageBuilder {
        &self.builder
    }

    pub fn metadata(&self) -> publisher_schema::Project {
        publisher_schema::Project {
            name: self.name.clone(),
        }
    }

    /// Package metadata ordered by name. Degraded packages are included.
    pub fn list_packages(&self) -> Vec<publisher_schema::Package> {
        let mut packages: Vec<_> = self
            .packages
            .values()
            .map(|package| package.metadata().clone())
            .collect();
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        packages
    }

    pub fn get_package(&self, package_name: &str) -> Option<Arc<Package>> {
        self.packages.get(package_name).cloned()
    }

    /// Installs a rebuilt package, or removes the entry when `package` is `None`.
    /// Returns the entry it displaced.
    pub fn replace_package(
        &mut self,
        package_name: &str,
        package: Option<Arc<Package>>,
    ) -> Option<Arc<Package>> {
        match package {
            Some(package) => self.packages.insert(package_name.to_string(), package),
            None => self.packages.remove(package_name),
        }
    }

    /// Drains every package scheduler.
    pub async fn shutdown(&self) {
        futures::future::join_all(self.packages.values().map(|package| package.shutdown())).await;
        debug!(project = %self.name, "Project schedulers stopped");
    }
}

pub(crate) fn is_package_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
