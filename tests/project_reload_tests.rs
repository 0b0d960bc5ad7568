use publisher::{
    Project, PublisherError, Services,
    config::{Config, SchedulerConfig},
    scheduler::{ActionExecutor, ActionRequest},
};
use std::{
    fs,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::sync::Notify;

const EVERY_SECOND: &str = concat!(
    "source: flights is duckdb.table('flights.parquet')\n",
    "#(schedule) cron=\"* * * * * *\" action=refresh connection=duckdb\n",
    "query: daily is flights -> { aggregate: c is count() }\n",
);

fn seed(root: &Path) {
    for (path, contents) in [
        ("a/publisher.json", r#"{"description":"scheduled"}"#),
        ("a/flights.malloy", EVERY_SECOND),
        ("b/publisher.json", r#"{"description":"quiet"}"#),
        ("b/orders.malloy", "source: orders is duckdb.table('orders.parquet')\n"),
    ] {
        let target = root.join(path);
        fs::create_dir_all(target.parent().expect("parent")).expect("create dir");
        fs::write(target, contents).expect("write fixture");
    }
}

/// Signals on entry, then never returns.
struct Stuck {
    entered: Notify,
}

#[async_trait::async_trait]
impl ActionExecutor for Stuck {
    async fn execute(&self, _request: ActionRequest<'_>) -> Result<(), PublisherError> {
        self.entered.notify_one();
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Tracks how many runs overlap.
#[derive(Default)]
struct Overlap {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    runs: AtomicUsize,
}

#[async_trait::async_trait]
impl ActionExecutor for Overlap {
    async fn execute(&self, _request: ActionRequest<'_>) -> Result<(), PublisherError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(300)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn reload_waiting_on_a_hung_action_does_not_block_other_packages() {
    let dir = tempfile::tempdir().expect("tempdir");
    seed(dir.path());

    let executor = Arc::new(Stuck {
        entered: Notify::new(),
    });
    let services = Services {
        executor: executor.clone(),
        scheduler: Arc::new(SchedulerConfig {
            action_timeout_secs: 30,
            ..SchedulerConfig::default()
        }),
        ..Services::local(&Config::default())
    };
    let project = Project::load("home", dir.path(), services).await.expect("project loads");
    let handle = publisher::project::spawn(project).await.expect("spawn project");

    tokio::time::timeout(Duration::from_secs(3), executor.entered.notified())
        .await
        .expect("scheduled action started");

    let reload = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.reload_package("a").await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!reload.is_finished(), "drain should still be waiting on the hung action");

    let other = tokio::time::timeout(Duration::from_secs(3), handle.get_package("b"))
        .await
        .expect("read of another package answered during reload")
        .expect("package b");
    assert_eq!(other.name(), "b");

    let current = tokio::time::timeout(Duration::from_secs(3), handle.get_package("a"))
        .await
        .expect("read of the reloading package answered")
        .expect("previous package a is still served");
    assert!(!current.is_degraded());

    let listed = tokio::time::timeout(Duration::from_secs(3), handle.list_packages())
        .await
        .expect("listing answered during reload")
        .expect("list packages");
    assert_eq!(listed.len(), 2);

    reload.abort();
}

#[tokio::test]
async fn reload_never_overlaps_old_and_new_schedule_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    seed(dir.path());

    let executor = Arc::new(Overlap::default());
    let services = Services {
        executor: executor.clone(),
        ..Services::local(&Config::default())
    };
    let project = Project::load("home", dir.path(), services).await.expect("project loads");
    let handle = publisher::project::spawn(project).await.expect("spawn project");

    let previous = handle.get_package("a").await.expect("package a");
    tokio::time::sleep(Duration::from_millis(2200)).await;
    assert!(executor.runs.load(Ordering::SeqCst) >= 1);

    let reloaded = handle.reload_package("a").await.expect("reload");
    assert!(!Arc::ptr_eq(&previous, &reloaded));

    let frozen = previous.list_schedules()[0].last_run_time;
    assert!(frozen.is_some());
    let runs_at_reload = executor.runs.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(2500)).await;

    assert_eq!(previous.list_schedules()[0].last_run_time, frozen, "old entry fired after reload");
    assert!(reloaded.list_schedules()[0].last_run_time.is_some(), "new entry never fired");
    assert!(executor.runs.load(Ordering::SeqCst) > runs_at_reload);
    assert_eq!(executor.max_in_flight.load(Ordering::SeqCst), 1);

    handle.shutdown().await.expect("shutdown");
}
