use super::FileEnumerator;
use crate::error::PublisherError;
use publisher_schema::{Database, DatabaseType};
use std::path::Path;

pub const DATABASE_FILE_SUFFIX: &str = ".parquet";

/// Embedded database files of a package with their sizes.
///
/// A failed stat on any file fails the whole listing.
pub async fn read_databases(
    package_path: &Path,
    files: &dyn FileEnumerator,
) -> Result<Vec<Database>, PublisherError> {
    let paths = files.list_files(package_path).await?;

    let stats = paths
        .into_iter()
        .filter(|path| path.ends_with(DATABASE_FILE_SUFFIX))
        .map(|path| async move {
            let metadata = tokio::fs::metadata(package_path.join(&path)).await?;
            Ok::<_, PublisherError>(Database {
                path,
                size: metadata.len(),
                r#type: DatabaseType::Embedded,
            })
        });

    futures::future::try_join_all(stats).await
}
