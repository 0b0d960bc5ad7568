use super::ModelKind;
use crate::connection::ConnectionMap;
use crate::error::PublisherError;
use async_trait::async_trait;
use publisher_schema::CompiledModel;
use std::path::Path;

/// One model file to compile.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    pub package_name: &'a str,
    pub package_root: &'a Path,
    /// Path relative to `package_root`, `/`-separated.
    pub path: &'a str,
    pub kind: ModelKind,
    pub connections: &'a ConnectionMap,
}

/// Turns a model file plus a connection set into a compiled model.
///
/// Failures should be `PublisherError::Compile` carrying the diagnostic.
#[async_trait]
pub trait ModelCompiler: Send + Sync {
    async fn compile(&self, request: CompileRequest<'_>) -> Result<CompiledModel, PublisherError>;
}
