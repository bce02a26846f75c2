//! One fetch → resolve → store pass over the version records

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::version::error::RefreshError;
use crate::version::resolver::VersionResolver;
use crate::version::source::{EolSource, TagSource};
use crate::version::store::RecordStore;
use crate::version::types::VersionRecord;

/// Whether stored records must be refreshed before being served
///
/// True for an empty store, or when the most recently updated record is
/// strictly older than `stale_after`.
pub fn needs_refresh(records: &[VersionRecord], now: DateTime<Utc>, stale_after: Duration) -> bool {
    match records.iter().map(|r| r.last_updated).max() {
        None => true,
        Some(freshest) => now - freshest > stale_after,
    }
}

/// Runs refresh cycles against one store
///
/// Cycles are serialized: the scheduler and on-demand callers never write
/// overlapping batches.
pub struct Refresher<S: RecordStore> {
    store: Arc<S>,
    tags: Arc<dyn TagSource>,
    eol: Arc<dyn EolSource>,
    resolver: VersionResolver,
    stale_after: Duration,
    cycle_lock: Mutex<()>,
}

impl<S: RecordStore> Refresher<S> {
    pub fn new(
        store: Arc<S>,
        tags: Arc<dyn TagSource>,
        eol: Arc<dyn EolSource>,
        resolver: VersionResolver,
        stale_after: Duration,
    ) -> Self {
        Self {
            store,
            tags,
            eol,
            resolver,
            stale_after,
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// Run one full cycle, returning the number of records written
    pub async fn run_cycle(&self) -> Result<usize, RefreshError> {
        let _guard = self.cycle_lock.lock().await;
        self.run_cycle_locked().await
    }

    /// Run a cycle only if the store is still empty or stale once any
    /// in-flight cycle has finished
    ///
    /// Returns `Ok(None)` when another cycle already brought the data up to date.
    pub async fn refresh_if_stale(&self) -> Result<Option<usize>, RefreshError> {
        let _guard = self.cycle_lock.lock().await;

        let records = self.store.get_all()?;
        if !needs_refresh(&records, Utc::now(), self.stale_after) {
            debug!("Records refreshed by a concurrent cycle, skipping");
            return Ok(None);
        }

        self.run_cycle_locked().await.map(Some)
    }

    async fn run_cycle_locked(&self) -> Result<usize, RefreshError> {
        debug!("Starting refresh cycle");

        let (tags, eol_dates) =
            futures::join!(self.tags.fetch_tags(), self.eol.fetch_eol_dates());
        let eol_dates = eol_dates.map_err(RefreshError::Eol)?;

        // Without a tag listing, stored releases are re-resolved as they are
        let tags = match tags {
            Ok(tags) => tags,
            Err(e) => {
                warn!("Tag fetch failed, re-deriving stored releases: {}", e);
                self.resolver.baseline_tags(&self.store.get_all()?)
            }
        };

        let records = self.resolver.resolve(&tags, &eol_dates, Utc::now());
        self.store.upsert_many(&records)?;

        info!(
            "Refresh cycle stored {} records from {} tags and {} end-of-life entries",
            records.len(),
            tags.len(),
            eol_dates.len()
        );

        Ok(records.len())
    }
}
