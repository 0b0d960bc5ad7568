use super::FileEnumerator;
use crate::{
    connection::ConnectionMap,
    error::PublisherError,
    model::{CompileRequest, Model, ModelCompiler, ModelKind},
};
use futures::{StreamExt, TryStreamExt, stream};
use std::{collections::HashMap, path::Path};
use tracing::{debug, warn};

/// Compiles every model file of a package with bounded concurrency.
pub struct ModelLoader<'a> {
    compiler: &'a dyn ModelCompiler,
    files: &'a dyn FileEnumerator,
    concurrency: usize,
}

impl<'a> ModelLoader<'a> {
    pub fn new(
        compiler: &'a dyn ModelCompiler,
        files: &'a dyn FileEnumerator,
        concurrency: usize,
    ) -> Self {
        Self {
            compiler,
            files,
            concurrency: concurrency.max(1),
        }
    }

    /// Returns models keyed by package-relative path.
    ///
    /// The first compile failure aborts the batch and drops the remaining compilations.
    pub async fn load(
        &self,
        package_name: &str,
        package_path: &Path,
        connections: &ConnectionMap,
    ) -> Result<HashMap<String, Model>, PublisherError> {
        let files = self.files.list_files(package_path).await.map_err(|e| {
            warn!(package = package_name, error = %e, "Cannot enumerate package files");
            PublisherError::PackageNotFound(package_name.to_string())
        })?;

        let candidates: Vec<(String, ModelKind)> = files
            .into_iter()
            .filter_map(|path| ModelKind::from_path(&path).map(|kind| (path, kind)))
            .collect();
        debug!(package = package_name, models = candidates.len(), "Compiling package models");

        let models: Vec<Model> = stream::iter(candidates)
            .map(|(path, kind)| async move {
                let compiled = self
                    .compiler
                    .compile(CompileRequest {
                        package_name,
                        package_root: package_path,
                        path: &path,
                        kind,
                        connections,
                    })
                    .await?;
                Ok::<_, PublisherError>(Model::new(path, kind, compiled))
            })
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;

        Ok(models
            .into_iter()
            .map(|model| (model.path().to_string(), model))
            .collect())
    }
}
