use super::{Connection, ConnectionFactory, ConnectionMap};
use crate::error::PublisherError;
use publisher_schema::ConnectionType;
use std::{path::Path, sync::Arc};
use tracing::{debug, warn};

/// Name reserved for the embedded engine every package gets.
///
/// A project or package connection with this name is replaced by the embedded one.
pub const EMBEDDED_CONNECTION_NAME: &str = "duckdb";

/// Resolves the connection set a package compiles against.
///
/// Only the package factory can fail; malformed package config surfaces here and is turned
/// into a degraded package by the caller.
pub async fn resolve_connections(
    project: &ConnectionMap,
    package_path: &Path,
    factory: &dyn ConnectionFactory,
) -> Result<ConnectionMap, PublisherError> {
    let package = factory.create_connections(package_path).await?;
    Ok(merge_connections(project, package, package_path))
}

/// Project ⊕ package ⊕ embedded engine. Later layers win by name; `project` is not modified.
pub fn merge_connections(
    project: &ConnectionMap,
    package: Vec<Connection>,
    package_path: &Path,
) -> ConnectionMap {
    let mut connections = project.clone();

    for connection in package {
        if connections.contains_key(connection.name()) {
            debug!(
                connection = connection.name(),
                package_path = %package_path.display(),
                "Package connection overrides project connection"
            );
        }
        connections.insert(connection.name().to_string(), Arc::new(connection));
    }

    if let Some(existing) = connections.get(EMBEDDED_CONNECTION_NAME)
        && existing.kind() != ConnectionType::Duckdb
    {
        warn!(
            connection = EMBEDDED_CONNECTION_NAME,
            kind = existing.kind().as_str(),
            package_path = %package_path.display(),
            "Connection name is reserved for the embedded engine; user definition replaced"
        );
    }
    connections.insert(
        EMBEDDED_CONNECTION_NAME.to_string(),
        Arc::new(Connection::embedded(package_path)),
    );

    connections
}
