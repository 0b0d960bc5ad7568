use super::Connection;
use crate::error::PublisherError;
use async_trait::async_trait;
use std::{collections::HashSet, io, path::Path};
use tracing::debug;

/// Connection definitions file looked up in project and package directories.
pub const CONNECTIONS_FILE_NAME: &str = "publisher.connections.json";

/// Creates the connections a directory (project root or package) defines.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn create_connections(&self, dir: &Path) -> Result<Vec<Connection>, PublisherError>;
}

/// Reads a JSON array of connection definitions from `publisher.connections.json`.
///
/// A missing file means the directory defines no connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConnectionFactory;

#[async_trait]
impl ConnectionFactory for JsonConnectionFactory {
    async fn create_connections(&self, dir: &Path) -> Result<Vec<Connection>, PublisherError> {
        let path = dir.join(CONNECTIONS_FILE_NAME);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let definitions: Vec<publisher_schema::Connection> = serde_json::from_str(&contents)
            .map_err(|e| {
                PublisherError::ConnectionConfig(format!("{}: {e}", path.display()))
            })?;

        let mut seen = HashSet::new();
        let mut connections = Vec::with_capacity(definitions.len());
        for definition in definitions {
            if !seen.insert(definition.name.clone()) {
                return Err(PublisherError::ConnectionConfig(format!(
                    "{}: duplicate connection name {}",
                    path.display(),
                    definition.name
                )));
            }
            connections.push(Connection::from_definition(definition, dir)?);
        }

        debug!(
            path = %path.display(),
            count = connections.len(),
            "Connection definitions loaded"
        );
        Ok(connections)
    }
}
