//! Periodic refresh of the version records
//!
//! The first cycle runs as soon as the scheduler starts. After every cycle,
//! successful or not, the task sleeps for the full interval, so the period is
//! measured from the end of one cycle to the start of the next.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::service::refresh::Refresher;
use crate::version::store::RecordStore;

/// Owns the background refresh task
pub struct RefreshScheduler<S: RecordStore> {
    refresher: Arc<Refresher<S>>,
    interval: Duration,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl<S: RecordStore> RefreshScheduler<S> {
    pub fn new(refresher: Arc<Refresher<S>>, interval: Duration) -> Self {
        Self {
            refresher,
            interval,
            cancel: CancellationToken::new(),
            handle: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Spawn the refresh loop; a second call while running is a no-op
    pub fn start(&mut self) {
        if self.handle.is_some() {
            warn!("Refresh scheduler already started");
            return;
        }

        let refresher = self.refresher.clone();
        let cancel = self.cancel.clone();
        let interval = self.interval;

        self.handle = Some(tokio::spawn(run_periodic(refresher, interval, cancel)));

        info!(
            interval_secs = self.interval.as_secs(),
            "Refresh scheduler started"
        );
    }

    /// Stop the loop and wait for the task to exit
    ///
    /// An in-flight cycle is dropped.
    pub async fn shutdown(&mut self) {
        info!("Shutting down refresh scheduler");
        self.cancel.cancel();

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!("Refresh scheduler task ended abnormally: {}", e);
            }
        }
    }
}

async fn run_periodic<S: RecordStore>(
    refresher: Arc<Refresher<S>>,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        debug!("Running periodic update");

        // Each cycle runs in its own task so a panic cannot end the loop
        let cycle = {
            let refresher = refresher.clone();
            tokio::spawn(async move { refresher.run_cycle().await })
        };
        let abort = cycle.abort_handle();

        tokio::select! {
            _ = cancel.cancelled() => {
                abort.abort();
                break;
            }
            result = cycle => match result {
                Ok(Ok(written)) => info!("Periodic update stored {} records", written),
                Ok(Err(e)) => error!("Error in periodic update: {}", e),
                Err(e) => error!("Periodic update task failed: {}", e),
            },
        }

        debug!("Sleeping for {:?} before next update", interval);
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    debug!("Refresh loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackingConfig;
    use crate::version::error::SourceError;
    use crate::version::resolver::VersionResolver;
    use crate::version::source::{EolDates, EolSource, TagRef, TagSource};
    use crate::version::store::SqliteStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    struct NoTags;

    #[async_trait::async_trait]
    impl TagSource for NoTags {
        async fn fetch_tags(&self) -> Result<Vec<TagRef>, SourceError> {
            Ok(Vec::new())
        }
    }

    /// Counts calls; fails or panics on the configured call numbers
    #[derive(Default)]
    struct CountingEol {
        calls: AtomicUsize,
        fail_on: Option<usize>,
        panic_on: Option<usize>,
    }

    #[async_trait::async_trait]
    impl EolSource for CountingEol {
        async fn fetch_eol_dates(&self) -> Result<EolDates, SourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.panic_on == Some(call) {
                panic!("feed exploded");
            }
            if self.fail_on == Some(call) {
                return Err(SourceError::InvalidResponse("500".to_string()));
            }
            Ok(EolDates::new())
        }
    }

    fn scheduler(eol: Arc<CountingEol>) -> (Arc<SqliteStore>, RefreshScheduler<SqliteStore>) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let refresher = Refresher::new(
            store.clone(),
            Arc::new(NoTags),
            eol,
            VersionResolver::new(&TrackingConfig::default()),
            chrono::Duration::hours(24),
        );
        (store, RefreshScheduler::new(Arc::new(refresher), DAY))
    }

    fn calls(eol: &CountingEol) -> usize {
        eol.calls.load(Ordering::SeqCst)
    }

    #[tokio::test(start_paused = true)]
    async fn first_cycle_runs_immediately_then_daily() {
        let eol = Arc::new(CountingEol::default());
        let (store, mut scheduler) = scheduler(eol.clone());

        scheduler.start();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls(&eol), 1);
        assert_eq!(store.get_all().unwrap().len(), 1);

        tokio::time::sleep(DAY - Duration::from_secs(120)).await;
        assert_eq!(calls(&eol), 1);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(calls(&eol), 2);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_cycle_waits_full_interval_and_keeps_running() {
        let eol = Arc::new(CountingEol {
            fail_on: Some(1),
            ..Default::default()
        });
        let (store, mut scheduler) = scheduler(eol.clone());

        scheduler.start();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls(&eol), 1);
        assert!(store.get_all().unwrap().is_empty());

        // No fast retry after the failure
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(calls(&eol), 1);

        tokio::time::sleep(DAY).await;
        assert_eq!(calls(&eol), 2);
        assert_eq!(store.get_all().unwrap().len(), 1);
        assert!(scheduler.is_running());

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_cycle_does_not_stop_the_loop() {
        let eol = Arc::new(CountingEol {
            panic_on: Some(1),
            ..Default::default()
        });
        let (_store, mut scheduler) = scheduler(eol.clone());

        scheduler.start();
        tokio::time::sleep(Duration::from_secs(60) + DAY).await;

        assert_eq!(calls(&eol), 2);
        assert!(scheduler.is_running());

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_further_cycles() {
        let eol = Arc::new(CountingEol::default());
        let (_store, mut scheduler) = scheduler(eol.clone());

        scheduler.start();
        tokio::time::sleep(Duration::from_secs(60)).await;
        scheduler.shutdown().await;
        assert!(!scheduler.is_running());

        tokio::time::sleep(DAY * 3).await;
        assert_eq!(calls(&eol), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_spawns_a_single_loop() {
        let eol = Arc::new(CountingEol::default());
        let (_store, mut scheduler) = scheduler(eol.clone());

        scheduler.start();
        scheduler.start();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(calls(&eol), 1);

        scheduler.shutdown().await;
    }
}
