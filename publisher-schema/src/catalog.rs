use serde::{Deserialize, Serialize};

/// Metadata about the publisher service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct About {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Project {
    pub name: String,
}

/// Package metadata as listed in a project catalog.
///
/// For a package that failed to load, `description` explains the failure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Package {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseType {
    #[default]
    Embedded,
}

/// An embedded database file shipped inside a package.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Database {
    /// Path relative to the package directory.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    #[serde(rename = "type", default)]
    pub r#type: DatabaseType,
}

/// A scheduled task and the outcome of its last run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// Resource in the package the schedule is attached to.
    pub resource: String,
    /// Cron expression as written in the annotation.
    pub schedule: String,
    pub action: String,
    pub connection: String,
    /// Unix timestamp in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_status: Option<String>,
}
