use mimalloc::MiMalloc;
use publisher::{
    Project, Services,
    config::CONFIG,
    server::{PublisherState, publisher_router},
};
use std::net::SocketAddr;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = &*CONFIG;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        listen_addr = %cfg.basic.listen_addr,
        listen_port = cfg.basic.listen_port,
        loglevel = %cfg.basic.loglevel,
        server_root = %cfg.basic.server_root.display(),
        projects = cfg.resolved_projects().len(),
    );

    let services = Services::local(cfg);
    let mut handles = Vec::new();
    for project_cfg in cfg.resolved_projects() {
        let project = Project::load(&project_cfg.name, &project_cfg.path, services.clone()).await?;
        handles.push(publisher::project::spawn(project).await?);
    }

    let state = PublisherState::new(handles, cfg.basic.server_root.clone());
    let app = publisher_router(state.clone());

    let addr = SocketAddr::from((cfg.basic.listen_addr, cfg.basic.listen_port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for handle in state.projects.values() {
        if let Err(e) = handle.shutdown().await {
            warn!(project = handle.name(), error = %e, "Project shutdown failed");
        }
    }
    info!("Server has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
