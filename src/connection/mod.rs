//! Named data-source connections and their layered resolution.
//!
//! Layout:
//! - `factory.rs`: reads connection definitions from `publisher.connections.json`
//! - `resolver.rs`: project ⊕ package ⊕ implicit embedded engine

mod factory;
mod resolver;

pub use factory::{CONNECTIONS_FILE_NAME, ConnectionFactory, JsonConnectionFactory};
pub use resolver::{EMBEDDED_CONNECTION_NAME, merge_connections, resolve_connections};

use crate::error::PublisherError;
use publisher_schema::{
    BigqueryConnection, ConnectionType, PostgresConnection, SnowflakeConnection,
};
use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Resolved connections keyed by name.
pub type ConnectionMap = HashMap<String, Arc<Connection>>;

#[derive(Clone, PartialEq, Eq)]
pub enum ConnectionParams {
    Postgres(PostgresConnection),
    Bigquery(BigqueryConnection),
    Snowflake(SnowflakeConnection),
    /// In-memory analytic engine reading files under `root`.
    Embedded { root: PathBuf },
}

/// A named, typed handle to a queryable data source.
///
/// Only the definition lives here; protocol drivers consume it.
#[derive(Clone, PartialEq, Eq)]
pub struct Connection {
    name: String,
    params: ConnectionParams,
}

impl Connection {
    pub fn new(name: impl Into<String>, params: ConnectionParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// The implicit embedded engine connection for a package directory.
    pub fn embedded(root: &Path) -> Self {
        Self::new(
            EMBEDDED_CONNECTION_NAME,
            ConnectionParams::Embedded {
                root: root.to_path_buf(),
            },
        )
    }

    /// Validates a wire definition: the protocol block must match `type`.
    ///
    /// A `duckdb` definition needs no block; it reads files under `dir`, the directory
    /// the definition was loaded from.
    pub fn from_definition(
        def: publisher_schema::Connection,
        dir: &Path,
    ) -> Result<Self, PublisherError> {
        if def.name.trim().is_empty() {
            return Err(PublisherError::ConnectionConfig(
                "connection name must be non-empty".to_string(),
            ));
        }

        let missing = |block: &str| {
            PublisherError::ConnectionConfig(format!(
                "connection {} of type {} is missing {block}",
                def.name,
                def.r#type.as_str()
            ))
        };

        let params = match def.r#type {
            ConnectionType::Postgres => ConnectionParams::Postgres(
                def.postgres_connection
                    .clone()
                    .ok_or_else(|| missing("postgresConnection"))?,
            ),
            ConnectionType::Bigquery => ConnectionParams::Bigquery(
                def.bigquery_connection
                    .clone()
                    .ok_or_else(|| missing("bigqueryConnection"))?,
            ),
            ConnectionType::Snowflake => ConnectionParams::Snowflake(
                def.snowflake_connection
                    .clone()
                    .ok_or_else(|| missing("snowflakeConnection"))?,
            ),
            ConnectionType::Duckdb => ConnectionParams::Embedded {
                root: dir.to_path_buf(),
            },
        };

        Ok(Self::new(def.name, params))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ConnectionType {
        match self.params {
            ConnectionParams::Postgres(_) => ConnectionType::Postgres,
            ConnectionParams::Bigquery(_) => ConnectionType::Bigquery,
            ConnectionParams::Snowflake(_) => ConnectionType::Snowflake,
            ConnectionParams::Embedded { .. } => ConnectionType::Duckdb,
        }
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }
}

// Parameters carry credentials; keep them out of logs.
impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

// Variant payloads carry credentials; only `Embedded` roots are printed.
impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postgres(_) => f.debug_tuple("Postgres").finish_non_exhaustive(),
            Self::Bigquery(_) => f.debug_tuple("Bigquery").finish_non_exhaustive(),
            Self::Snowflake(_) => f.debug_tuple("Snowflake").finish_non_exhaustive(),
            Self::Embedded { root } => f.debug_struct("Embedded").field("root", root).finish(),
        }
    }
}
