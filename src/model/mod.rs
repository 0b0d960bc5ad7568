mod compiler;
mod outline;

pub use compiler::{CompileRequest, ModelCompiler};
pub use outline::OutlineCompiler;

use publisher_schema::{CompiledModel, ModelType};

pub const MODEL_FILE_SUFFIX: &str = ".malloy";
pub const NOTEBOOK_FILE_SUFFIX: &str = ".malloynb";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Source,
    Notebook,
}

impl ModelKind {
    /// Infers the kind from the file suffix; `None` for files that are not models.
    pub fn from_path(path: &str) -> Option<Self> {
        if path.ends_with(MODEL_FILE_SUFFIX) {
            Some(ModelKind::Source)
        } else if path.ends_with(NOTEBOOK_FILE_SUFFIX) {
            Some(ModelKind::Notebook)
        } else {
            None
        }
    }

    pub fn as_wire(self) -> ModelType {
        match self {
            ModelKind::Source => ModelType::Source,
            ModelKind::Notebook => ModelType::Notebook,
        }
    }
}

/// A compiled model file of a package.
#[derive(Debug, Clone)]
pub struct Model {
    path: String,
    kind: ModelKind,
    compiled: CompiledModel,
}

impl Model {
    pub fn new(path: String, kind: ModelKind, compiled: CompiledModel) -> Self {
        Self {
            path,
            kind,
            compiled,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn compiled(&self) -> &CompiledModel {
        &self.compiled
    }

    pub fn summary(&self) -> publisher_schema::Model {
        publisher_schema::Model {
            package_name: self.compiled.package_name.clone(),
            path: self.path.clone(),
            r#type: self.kind.as_wire(),
        }
    }

    /// Named sources and queries together with their annotations.
    pub fn annotated_items(&self) -> impl Iterator<Item = (&str, &[String])> {
        let sources = self
            .compiled
            .sources
            .iter()
            .map(|s| (s.name.as_str(), s.annotations.as_slice()));
        let queries = self
            .compiled
            .queries
            .iter()
            .map(|q| (q.name.as_str(), q.annotations.as_slice()));
        sources.chain(queries)
    }
}
