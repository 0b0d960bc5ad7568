pub mod catalog;
pub mod connection;
pub mod error;
pub mod model;

pub use catalog::{About, Database, DatabaseType, Package, Project, Schedule};
pub use connection::{
    BigqueryConnection, Connection, ConnectionType, PostgresConnection, SnowflakeConnection,
};
pub use error::{ApiErrorBody, ApiErrorObject};
pub use model::{CellType, CompiledModel, Model, ModelType, NotebookCell, Query, Source, View};
