use async_trait::async_trait;
use std::{
    io,
    path::{Component, Path},
};
use tracing::warn;

/// Recursive listing of regular files under a root.
#[async_trait]
pub trait FileEnumerator: Send + Sync {
    /// Paths relative to `root`, `/`-separated. Fails when `root` cannot be read.
    async fn list_files(&self, root: &Path) -> io::Result<Vec<String>>;
}

/// Walks the local file system. Symlinked directories are not followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileEnumerator;

#[async_trait]
impl FileEnumerator for LocalFileEnumerator {
    async fn list_files(&self, root: &Path) -> io::Result<Vec<String>> {
        let mut files = Vec::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                let path = entry.path();
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    match relative_path(root, &path) {
                        Some(relative) => files.push(relative),
                        None => warn!(path = %path.display(), "skipping non UTF-8 file name"),
                    }
                }
            }
        }

        files.sort();
        Ok(files)
    }
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_nested_files_relative_to_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("models/nested")).unwrap();
        std::fs::write(dir.path().join("a.malloy"), "").unwrap();
        std::fs::write(dir.path().join("models/nested/b.malloynb"), "").unwrap();

        let files = LocalFileEnumerator
            .list_files(dir.path())
            .await
            .expect("list files");

        assert_eq!(files, vec!["a.malloy", "models/nested/b.malloynb"]);
    }

    #[tokio::test]
    async fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = LocalFileEnumerator
            .list_files(&dir.path().join("absent"))
            .await
            .expect_err("missing root");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
