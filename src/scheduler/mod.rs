//! Per-package timers for `#(schedule)` annotations.
//!
//! - `annotation.rs`: annotation syntax
//! - `cadence.rs`: cron expressions
//! - `entry.rs`: one resource/action pair and its last run
//! - `executor.rs`: the action seam

mod annotation;
mod cadence;
mod entry;
mod executor;

pub use annotation::{SCHEDULE_ANNOTATION_PREFIX, ScheduleAnnotation, parse_schedule_annotation};
pub use cadence::Cadence;
pub use entry::{RunStatus, ScheduleEntry, TickOutcome};
pub use executor::{ActionExecutor, ActionRequest, TracingActionExecutor};

use crate::{config::SchedulerConfig, connection::ConnectionMap, error::PublisherError, model::Model};
use chrono::{DateTime, Utc};
use publisher_schema::Schedule;
use std::{collections::HashMap, fmt, sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinSet};
use tracing::{debug, info, warn};

pub struct Scheduler {
    package_name: String,
    entries: Vec<Arc<ScheduleEntry>>,
    shutdown_tx: watch::Sender<bool>,
    tasks: tokio::sync::Mutex<JoinSet<()>>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("package_name", &self.package_name)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Builds the scheduler for a package's models, or `None` when nothing is scheduled.
    ///
    /// Every annotation is validated before any timer starts: a malformed annotation,
    /// an invalid cron expression or an unknown connection fails the whole package.
    pub fn create(
        package_name: &str,
        models: &HashMap<String, Model>,
        connections: &ConnectionMap,
        executor: Arc<dyn ActionExecutor>,
        cfg: &SchedulerConfig,
    ) -> Result<Option<Self>, PublisherError> {
        let entries = collect_entries(models, connections)?;
        if entries.is_empty() {
            return Ok(None);
        }

        let (shutdown_tx, _) = watch::channel(false);
        let mut tasks = JoinSet::new();
        if cfg.enabled {
            for entry in &entries {
                tasks.spawn(run_entry(
                    entry.clone(),
                    executor.clone(),
                    cfg.action_timeout(),
                    shutdown_tx.subscribe(),
                ));
            }
        }

        info!(
            package = package_name,
            schedules = entries.len(),
            timers_started = cfg.enabled,
            "Scheduler created"
        );

        Ok(Some(Self {
            package_name: package_name.to_string(),
            entries,
            shutdown_tx,
            tasks: tokio::sync::Mutex::new(tasks),
        }))
    }

    pub fn entries(&self) -> &[Arc<ScheduleEntry>] {
        &self.entries
    }

    pub fn list(&self) -> Vec<Schedule> {
        self.entries.iter().map(|entry| entry.snapshot()).collect()
    }

    /// Stops all timers and waits for in-flight runs to finish.
    pub async fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);

        let mut tasks = self.tasks.lock().await;
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined
                && !e.is_cancelled()
            {
                warn!(package = %self.package_name, error = %e, "Schedule timer ended abnormally");
            }
        }
        debug!(package = %self.package_name, "Scheduler stopped");
    }
}

fn collect_entries(
    models: &HashMap<String, Model>,
    connections: &ConnectionMap,
) -> Result<Vec<Arc<ScheduleEntry>>, PublisherError> {
    let mut entries = Vec::new();

    for model in models.values() {
        for (name, annotations) in model.annotated_items() {
            for annotation in annotations {
                let Some(parsed) = parse_schedule_annotation(annotation) else {
                    continue;
                };

                let resource = format!("{}#{}", model.path(), name);
                let invalid = |message: String| PublisherError::InvalidSchedule {
                    resource: resource.clone(),
                    message,
                };

                let parsed = parsed.map_err(&invalid)?;
                let cadence = Cadence::parse(&parsed.cron).map_err(&invalid)?;
                let connection = connections
                    .get(&parsed.connection)
                    .cloned()
                    .ok_or_else(|| invalid(format!("connection '{}' is not defined", parsed.connection)))?;

                entries.push(Arc::new(ScheduleEntry::new(
                    resource,
                    cadence,
                    parsed.action,
                    connection,
                )));
            }
        }
    }

    entries.sort_by(|a, b| a.resource().cmp(b.resource()));
    Ok(entries)
}

/// Timer loop for one entry. Runs are awaited inline, so a tick never overlaps the
/// previous run of the same entry.
async fn run_entry(
    entry: Arc<ScheduleEntry>,
    executor: Arc<dyn ActionExecutor>,
    timeout: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut last_fire: Option<DateTime<Utc>> = None;

    loop {
        let now = Utc::now();
        let base = last_fire.map_or(now, |fired| fired.max(now));
        let Some(next) = entry.cadence().next_after(base) else {
            info!(resource = entry.resource(), "Cadence has no future occurrences; timer stopped");
            return;
        };
        let wait = (next - now).to_std().unwrap_or_default();

        tokio::select! {
            _ = shutdown.changed() => return,
            () = tokio::time::sleep(wait) => {}
        }
        if *shutdown.borrow() {
            return;
        }

        last_fire = Some(next);
        entry.tick(executor.as_ref(), timeout).await;
    }
}
