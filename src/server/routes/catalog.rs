//! Read-only catalog routes.

use crate::{
    error::PublisherError,
    package::Package,
    project::ProjectHandle,
    server::router::PublisherState,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use publisher_schema::{About, CompiledModel, Database, Model, Package as PackageMetadata, Project, Schedule};
use std::{io, sync::Arc};

const README_FILE_NAME: &str = "README.md";

pub fn router() -> Router<PublisherState> {
    Router::new()
        .route("/about", get(about))
        .route("/projects", get(list_projects))
        .route("/projects/{project}/packages", get(list_packages))
        .route("/projects/{project}/packages/{package}", get(get_package))
        .route("/projects/{project}/packages/{package}/models", get(list_models))
        .route(
            "/projects/{project}/packages/{package}/models/{*path}",
            get(get_model),
        )
        .route(
            "/projects/{project}/packages/{package}/databases",
            get(list_databases),
        )
        .route(
            "/projects/{project}/packages/{package}/schedules",
            get(list_schedules),
        )
}

fn find_project(state: &PublisherState, name: &str) -> Result<ProjectHandle, PublisherError> {
    state
        .projects
        .get(name)
        .cloned()
        .ok_or_else(|| PublisherError::ProjectNotFound(name.to_string()))
}

async fn find_package(
    state: &PublisherState,
    project_name: &str,
    package_name: &str,
) -> Result<Arc<Package>, PublisherError> {
    find_project(state, project_name)?.get_package(package_name).await
}

async fn about(State(state): State<PublisherState>) -> Result<Json<About>, PublisherError> {
    let readme = match tokio::fs::read_to_string(state.server_root.join(README_FILE_NAME)).await {
        Ok(readme) => Some(readme),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };
    Ok(Json(About { readme }))
}

async fn list_projects(State(state): State<PublisherState>) -> Json<Vec<Project>> {
    Json(
        state
            .projects
            .keys()
            .map(|name| Project { name: name.clone() })
            .collect(),
    )
}

async fn list_packages(
    State(state): State<PublisherState>,
    Path(project_name): Path<String>,
) -> Result<Json<Vec<PackageMetadata>>, PublisherError> {
    Ok(Json(find_project(&state, &project_name)?.list_packages().await?))
}

async fn get_package(
    State(state): State<PublisherState>,
    Path((project_name, package_name)): Path<(String, String)>,
) -> Result<Json<PackageMetadata>, PublisherError> {
    let package = find_package(&state, &project_name, &package_name).await?;
    Ok(Json(package.metadata().clone()))
}

async fn list_models(
    State(state): State<PublisherState>,
    Path((project_name, package_name)): Path<(String, String)>,
) -> Result<Json<Vec<Model>>, PublisherError> {
    let package = find_package(&state, &project_name, &package_name).await?;
    Ok(Json(package.list_models()))
}

async fn get_model(
    State(state): State<PublisherState>,
    Path((project_name, package_name, path)): Path<(String, String, String)>,
) -> Result<Json<CompiledModel>, PublisherError> {
    let package = find_package(&state, &project_name, &package_name).await?;
    let model = package
        .get_model(&path)
        .ok_or_else(|| PublisherError::ModelNotFound(path.clone()))?;
    Ok(Json(model.compiled().clone()))
}

async fn list_databases(
    State(state): State<PublisherState>,
    Path((project_name, package_name)): Path<(String, String)>,
) -> Result<Json<Vec<Database>>, PublisherError> {
    let package = find_package(&state, &project_name, &package_name).await?;
    Ok(Json(package.list_databases().to_vec()))
}

async fn list_schedules(
    State(state): State<PublisherState>,
    Path((project_name, package_name)): Path<(String, String)>,
) -> Result<Json<Vec<Schedule>>, PublisherError> {
    let package = find_package(&state, &project_name, &package_name).await?;
    Ok(Json(package.list_schedules()))
}
