use super::{ActionExecutor, ActionRequest, Cadence};
use crate::{connection::Connection, error::PublisherError};
use chrono::{DateTime, Utc};
use publisher_schema::Schedule;
use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failed(String),
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => f.write_str("success"),
            RunStatus::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Ran(RunStatus),
    /// A previous run of the same entry was still in flight.
    Skipped,
}

#[derive(Debug, Clone)]
struct LastRun {
    started_at: DateTime<Utc>,
    status: RunStatus,
}

/// One scheduled action bound to a model resource.
#[derive(Debug)]
pub struct ScheduleEntry {
    resource: String,
    cadence: Cadence,
    action: String,
    connection: Arc<Connection>,
    last_run: Mutex<Option<LastRun>>,
    running: tokio::sync::Mutex<()>,
}

impl ScheduleEntry {
    pub fn new(
        resource: String,
        cadence: Cadence,
        action: String,
        connection: Arc<Connection>,
    ) -> Self {
        Self {
            resource,
            cadence,
            action,
            connection,
            last_run: Mutex::new(None),
            running: tokio::sync::Mutex::new(()),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn cadence(&self) -> &Cadence {
        &self.cadence
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn last_status(&self) -> Option<RunStatus> {
        self.last_run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|run| run.status.clone())
    }

    pub fn snapshot(&self) -> Schedule {
        let last_run = self
            .last_run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        Schedule {
            resource: self.resource.clone(),
            schedule: self.cadence.expression().to_string(),
            action: self.action.clone(),
            connection: self.connection.name().to_string(),
            last_run_time: last_run.as_ref().map(|run| run.started_at.timestamp_millis()),
            last_run_status: last_run.map(|run| run.status.to_string()),
        }
    }

    /// Runs the action once, unless a run of this entry is still in flight.
    ///
    /// Failures and timeouts are recorded as the last run status and never propagate.
    pub async fn tick(&self, executor: &dyn ActionExecutor, timeout: Duration) -> TickOutcome {
        let Ok(_running) = self.running.try_lock() else {
            debug!(resource = %self.resource, "Previous run still in flight; tick skipped");
            return TickOutcome::Skipped;
        };

        let started_at = Utc::now();
        let request = ActionRequest {
            resource: &self.resource,
            action: &self.action,
            connection: &self.connection,
        };

        let status = match tokio::time::timeout(timeout, executor.execute(request)).await {
            Ok(Ok(())) => RunStatus::Success,
            Ok(Err(e)) => RunStatus::Failed(e.to_string()),
            Err(_) => RunStatus::Failed(PublisherError::ActionTimeout(timeout).to_string()),
        };

        match &status {
            RunStatus::Success => info!(
                resource = %self.resource,
                action = %self.action,
                connection = self.connection.name(),
                "Scheduled action completed"
            ),
            RunStatus::Failed(message) => warn!(
                resource = %self.resource,
                action = %self.action,
                connection = self.connection.name(),
                error = %message,
                "Scheduled action failed"
            ),
        }

        *self.last_run.lock().unwrap_or_else(PoisonError::into_inner) = Some(LastRun {
            started_at,
            status: status.clone(),
        });
        TickOutcome::Ran(status)
    }
}
