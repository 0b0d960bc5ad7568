use super::{PackageBuilder, Project, is_package_name};
use crate::{error::PublisherError, package::Package};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::info;

#[derive(Debug)]
pub enum ProjectActorMessage {
    /// Project metadata.
    Describe(RpcReplyPort<publisher_schema::Project>),

    /// Metadata of every loaded package, including degraded ones.
    ListPackages(RpcReplyPort<Vec<publisher_schema::Package>>),

    /// Look up a package by name.
    GetPackage(String, RpcReplyPort<Option<Arc<Package>>>),

    /// Install a rebuilt package; `None` removes the entry.
    ReplacePackage(String, Option<Arc<Package>>, RpcReplyPort<()>),

    /// Drain all schedulers and stop the actor.
    Shutdown(RpcReplyPort<()>),
}

type ReloadBarriers = Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>;

/// Access to one project's package catalog.
///
/// The actor only swaps catalog entries; reloads drain and rebuild outside of it, so
/// a slow reload holds back only other reloads of the same package.
#[derive(Clone)]
pub struct ProjectHandle {
    name: Arc<str>,
    actor: ActorRef<ProjectActorMessage>,
    builder: PackageBuilder,
    reloads: ReloadBarriers,
}

impl ProjectHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn describe(&self) -> Result<publisher_schema::Project, PublisherError> {
        ractor::call!(self.actor, ProjectActorMessage::Describe)
            .map_err(|e| PublisherError::RactorError(format!("ProjectActor Describe RPC failed: {e}")))
    }

    pub async fn list_packages(&self) -> Result<Vec<publisher_schema::Package>, PublisherError> {
        ractor::call!(self.actor, ProjectActorMessage::ListPackages).map_err(|e| {
            PublisherError::RactorError(format!("ProjectActor ListPackages RPC failed: {e}"))
        })
    }

    pub async fn get_package(&self, package_name: &str) -> Result<Arc<Package>, PublisherError> {
        self.find_package(package_name)
            .await?
            .ok_or_else(|| PublisherError::PackageNotFound(package_name.to_string()))
    }

    async fn find_package(&self, package_name: &str) -> Result<Option<Arc<Package>>, PublisherError> {
        ractor::call!(
            self.actor,
            ProjectActorMessage::GetPackage,
            package_name.to_string()
        )
        .map_err(|e| PublisherError::RactorError(format!("ProjectActor GetPackage RPC failed: {e}")))
    }

    /// Rebuilds one package from disk.
    ///
    /// The previous scheduler is stopped and drained before the replacement starts its
    /// own. Until the replacement is installed, reads return the previous package. A
    /// package whose manifest has disappeared is removed and `PackageNotFound` returned.
    pub async fn reload_package(&self, package_name: &str) -> Result<Arc<Package>, PublisherError> {
        if !is_package_name(package_name) {
            return Err(PublisherError::PackageNotFound(package_name.to_string()));
        }

        let barrier = self.reload_barrier(package_name);
        let _reloading = barrier.lock().await;

        if let Some(previous) = self.find_package(package_name).await? {
            previous.shutdown().await;
        }

        let rebuilt = self.builder.build(package_name).await.map(Arc::new);
        ractor::call!(
            self.actor,
            ProjectActorMessage::ReplacePackage,
            package_name.to_string(),
            rebuilt.as_ref().ok().cloned()
        )
        .map_err(|e| {
            PublisherError::RactorError(format!("ProjectActor ReplacePackage RPC failed: {e}"))
        })?;

        if let Ok(package) = &rebuilt {
            info!(
                project = %self.name,
                package = package_name,
                degraded = package.is_degraded(),
                "Package reloaded"
            );
        }
        rebuilt
    }

    fn reload_barrier(&self, package_name: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.reloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(package_name.to_string())
            .or_default()
            .clone()
    }

    /// Waits for in-flight scheduled actions, then stops the actor.
    pub async fn shutdown(&self) -> Result<(), PublisherError> {
        ractor::call!(self.actor, ProjectActorMessage::Shutdown)
            .map_err(|e| PublisherError::RactorError(format!("ProjectActor Shutdown RPC failed: {e}")))
    }
}

struct ProjectActor;

#[ractor::async_trait]
impl Actor for ProjectActor {
    type Msg = ProjectActorMessage;
    type State = Project;
    type Arguments = Project;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        project: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!(project = project.name(), "ProjectActor initialized");
        Ok(project)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            ProjectActorMessage::Describe(reply) => {
                let _ = reply.send(state.metadata());
            }
            ProjectActorMessage::ListPackages(reply) => {
                let _ = reply.send(state.list_packages());
            }
            ProjectActorMessage::GetPackage(package_name, reply) => {
                let _ = reply.send(state.get_package(&package_name));
            }
            ProjectActorMessage::ReplacePackage(package_name, package, reply) => {
                state.replace_package(&package_name, package);
                let _ = reply.send(());
            }
            ProjectActorMessage::Shutdown(reply) => {
                state.shutdown().await;
                let _ = reply.send(());
                myself.stop(Some("shutdown".to_string()));
            }
        }
        Ok(())
    }
}

/// Spawns the actor owning `project`. The actor is not registered under a name.
pub async fn spawn(project: Project) -> Result<ProjectHandle, PublisherError> {
    let name: Arc<str> = Arc::from(project.name());
    let builder = project.builder().clone();
    let (actor, _jh) = Actor::spawn(None, ProjectActor, project)
        .await
        .map_err(|e| PublisherError::RactorError(format!("ProjectActor spawn failed: {e}")))?;

    Ok(ProjectHandle {
        name,
        actor,
        builder,
        reloads: Arc::default(),
    })
}
