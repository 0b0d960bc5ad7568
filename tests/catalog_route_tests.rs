use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use publisher::{
    Project, Services,
    config::Config,
    server::{PublisherState, publisher_router},
};
use serde_json::Value;
use std::{fs, path::Path};
use tower::ServiceExt;

fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (path, contents) in files {
        let target = root.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(target, contents).expect("write fixture file");
    }
}

fn seed_project(root: &Path) {
    write_files(
        root,
        &[
            ("README.md", "# Publisher demo"),
            ("sales/publisher.json", r#"{"description":"Sales data"}"#),
            ("sales/orders.malloy", "source: orders is duckdb.table('data/orders.parquet')\n"),
            ("sales/data/orders.parquet", "PAR1"),
            ("broken/publisher.json", r#"{"description":"Broken"}"#),
            ("broken/bad.malloy", "source: bad is duckdb.table('x'\n"),
            ("scratch/notes.txt", "not a package"),
        ],
    );
}

async fn app(root: &Path) -> Router {
    let project = Project::load("home", root, Services::local(&Config::default()))
        .await
        .expect("project loads");
    let handle = publisher::project::spawn(project).await.expect("spawn project");
    publisher_router(PublisherState::new([handle], root.to_path_buf()))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    let status = resp.status();
    assert!(resp.headers().contains_key("x-request-id"));
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

#[tokio::test]
async fn lists_projects_and_packages_including_degraded() {
    let dir = tempfile::tempdir().expect("tempdir");
    seed_project(dir.path());
    let app = app(dir.path()).await;

    let (status, body) = get(&app, "/projects").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([{ "name": "home" }]));

    let (status, body) = get(&app, "/projects/home/packages").await;
    assert_eq!(status, StatusCode::OK);
    let packages = body.as_array().expect("array");
    assert_eq!(packages.len(), 2);
    assert_eq!(packages[0]["name"], "broken");
    assert!(
        packages[0]["description"]
            .as_str()
            .is_some_and(|d| d.starts_with("Unable to load package: "))
    );
    assert_eq!(packages[1]["name"], "sales");
    assert_eq!(packages[1]["description"], "Sales data");
}

#[tokio::test]
async fn serves_models_databases_and_schedules() {
    let dir = tempfile::tempdir().expect("tempdir");
    seed_project(dir.path());
    let app = app(dir.path()).await;

    let (status, body) = get(&app, "/projects/home/packages/sales/models").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!([{ "packageName": "sales", "path": "orders.malloy", "type": "source" }])
    );

    let (status, body) = get(&app, "/projects/home/packages/sales/models/orders.malloy").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sources"][0]["name"], "orders");

    let (status, body) = get(&app, "/projects/home/packages/sales/databases").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!([{ "path": "data/orders.parquet", "size": 4, "type": "embedded" }])
    );

    let (status, body) = get(&app, "/projects/home/packages/sales/schedules").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn unknown_resources_are_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    seed_project(dir.path());
    let app = app(dir.path()).await;

    let (status, body) = get(&app, "/projects/nope/packages").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = get(&app, "/projects/home/packages/scratch").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, "/projects/home/packages/sales/models/missing.malloy").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(&app, "/no/such/route").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn about_serves_readme() {
    let dir = tempfile::tempdir().expect("tempdir");
    seed_project(dir.path());
    let app = app(dir.path()).await;

    let (status, body) = get(&app, "/about").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["readme"], "# Publisher demo");
}

#[tokio::test]
async fn reload_picks_up_fixed_package() {
    let dir = tempfile::tempdir().expect("tempdir");
    seed_project(dir.path());
    let project = Project::load("home", dir.path(), Services::local(&Config::default()))
        .await
        .expect("project loads");
    let handle = publisher::project::spawn(project).await.expect("spawn project");

    let broken = handle.get_package("broken").await.expect("broken package");
    assert!(broken.is_degraded());

    fs::write(
        dir.path().join("broken/bad.malloy"),
        "source: bad is duckdb.table('x')\n",
    )
    .unwrap();
    let reloaded = handle.reload_package("broken").await.expect("reload");
    assert!(!reloaded.is_degraded());
    assert_eq!(reloaded.metadata().description.as_deref(), Some("Broken"));

    fs::remove_file(dir.path().join("broken/publisher.json")).unwrap();
    let err = handle.reload_package("broken").await.expect_err("manifest removed");
    assert!(err.is_not_found());
    assert!(handle.get_package("broken").await.is_err());

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn missing_project_root_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = Project::load(
        "home",
        &dir.path().join("absent"),
        Services::local(&Config::default()),
    )
    .await
    .err()
    .expect("missing root");
    assert!(err.is_not_found());
}
