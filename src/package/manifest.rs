use crate::error::PublisherError;
use serde::Deserialize;
use std::path::Path;

/// File whose presence makes a directory a package.
pub const PACKAGE_MANIFEST_NAME: &str = "publisher.json";

#[derive(Debug, Deserialize)]
struct PackageManifest {
    description: String,
}

/// Fails with `PackageNotFound` when the manifest is absent.
pub async fn validate_manifest(package_name: &str, package_path: &Path) -> Result<(), PublisherError> {
    tokio::fs::metadata(package_path.join(PACKAGE_MANIFEST_NAME))
        .await
        .map(|_| ())
        .map_err(|_| PublisherError::PackageNotFound(package_name.to_string()))
}

/// Parses package metadata. Unreadable or malformed manifests are `PackageInvalid`.
pub async fn read_manifest(
    package_name: &str,
    package_path: &Path,
) -> Result<publisher_schema::Package, PublisherError> {
    let contents = tokio::fs::read_to_string(package_path.join(PACKAGE_MANIFEST_NAME))
        .await
        .map_err(|e| {
            PublisherError::PackageInvalid(format!("cannot read {PACKAGE_MANIFEST_NAME}: {e}"))
        })?;

    let manifest: PackageManifest = serde_json::from_str(&contents)
        .map_err(|e| PublisherError::PackageInvalid(format!("{PACKAGE_MANIFEST_NAME}: {e}")))?;

    Ok(publisher_schema::Package {
        name: package_name.to_string(),
        description: Some(manifest.description),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_manifest_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_manifest("demo", dir.path())
            .await
            .expect_err("no manifest");
        assert!(matches!(err, PublisherError::PackageNotFound(name) if name == "demo"));
    }

    #[tokio::test]
    async fn manifest_without_description_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PACKAGE_MANIFEST_NAME), r#"{"name":"x"}"#).unwrap();

        validate_manifest("demo", dir.path()).await.expect("present");
        let err = read_manifest("demo", dir.path())
            .await
            .expect_err("missing description");
        assert!(matches!(err, PublisherError::PackageInvalid(msg) if msg.contains("description")));
    }

    #[tokio::test]
    async fn metadata_takes_name_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PACKAGE_MANIFEST_NAME),
            r#"{"name":"ignored","description":"demo"}"#,
        )
        .unwrap();

        let metadata = read_manifest("sales", dir.path()).await.unwrap();
        assert_eq!(metadata.name, "sales");
        assert_eq!(metadata.description.as_deref(), Some("demo"));
    }
}
