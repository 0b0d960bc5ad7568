use crate::{connection::Connection, error::PublisherError};
use async_trait::async_trait;
use tracing::info;

/// One scheduled invocation handed to an [`ActionExecutor`].
#[derive(Debug, Clone, Copy)]
pub struct ActionRequest<'a> {
    pub resource: &'a str,
    pub action: &'a str,
    pub connection: &'a Connection,
}

/// Runs scheduled actions against a connection.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, request: ActionRequest<'_>) -> Result<(), PublisherError>;
}

/// Records the dispatch and succeeds. Used when no database driver is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingActionExecutor;

#[async_trait]
impl ActionExecutor for TracingActionExecutor {
    async fn execute(&self, request: ActionRequest<'_>) -> Result<(), PublisherError> {
        info!(
            resource = request.resource,
            action = request.action,
            connection = request.connection.name(),
            connection_type = request.connection.kind().as_str(),
            "Scheduled action dispatched"
        );
        Ok(())
    }
}
