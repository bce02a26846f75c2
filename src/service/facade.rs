//! Read path for collaborators rendering the version list

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::service::refresh::{Refresher, needs_refresh};
use crate::version::error::StoreError;
use crate::version::store::RecordStore;
use crate::version::types::VersionRecord;

/// Serves stored records, refreshing them first when missing or stale
pub struct VersionService<S: RecordStore> {
    refresher: Arc<Refresher<S>>,
}

impl<S: RecordStore> Clone for VersionService<S> {
    fn clone(&self) -> Self {
        Self {
            refresher: self.refresher.clone(),
        }
    }
}

impl<S: RecordStore> VersionService<S> {
    pub fn new(refresher: Arc<Refresher<S>>) -> Self {
        Self { refresher }
    }

    /// Records ordered by major, minor, patch descending
    ///
    /// A failed on-demand refresh is logged and whatever the store holds is
    /// returned. Only a failure to read the store itself is an error.
    pub async fn get_versions(&self) -> Result<Vec<VersionRecord>, StoreError> {
        let store = self.refresher.store();
        let records = store.get_all()?;

        if !needs_refresh(&records, Utc::now(), self.refresher.stale_after()) {
            return Ok(records);
        }

        info!("Stored versions are missing or stale, fetching python versions");
        match self.refresher.refresh_if_stale().await {
            Ok(Some(written)) => info!("On-demand refresh stored {} records", written),
            Ok(None) => {}
            Err(e) => {
                warn!("On-demand refresh failed, serving stored versions: {}", e);
                return Ok(records);
            }
        }

        store.get_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackingConfig;
    use crate::version::error::SourceError;
    use crate::version::resolver::VersionResolver;
    use crate::version::source::{EolDates, MockEolSource, MockTagSource, TagRef};
    use crate::version::store::SqliteStore;
    use crate::version::types::{ReleaseLevel, SupportStatus};
    use chrono::Duration;

    fn stored_record(age: Duration) -> VersionRecord {
        VersionRecord::new(
            3,
            12,
            6,
            ReleaseLevel::Final,
            SupportStatus::Bugfix,
            Utc::now() - age,
        )
    }

    fn service(store: Arc<SqliteStore>, tags: MockTagSource, eol: MockEolSource) -> VersionService<SqliteStore> {
        let refresher = Refresher::new(
            store,
            Arc::new(tags),
            Arc::new(eol),
            VersionResolver::new(&TrackingConfig::default()),
            Duration::hours(24),
        );
        VersionService::new(Arc::new(refresher))
    }

    fn untouched_sources() -> (MockTagSource, MockEolSource) {
        let mut tags = MockTagSource::new();
        tags.expect_fetch_tags().times(0);
        let mut eol = MockEolSource::new();
        eol.expect_fetch_eol_dates().times(0);
        (tags, eol)
    }

    fn working_sources() -> (MockTagSource, MockEolSource) {
        let mut tags = MockTagSource::new();
        tags.expect_fetch_tags()
            .times(1)
            .returning(|| Ok(vec![TagRef::new("refs/tags/v3.12.7")]));
        let mut eol = MockEolSource::new();
        eol.expect_fetch_eol_dates()
            .times(1)
            .returning(|| Ok(EolDates::new()));
        (tags, eol)
    }

    #[tokio::test]
    async fn get_versions_serves_fresh_records_without_fetching() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let fresh = vec![stored_record(Duration::hours(23) + Duration::minutes(59))];
        store.upsert_many(&fresh).unwrap();
        let (tags, eol) = untouched_sources();

        let versions = service(store, tags, eol).get_versions().await.unwrap();

        assert_eq!(versions, fresh);
    }

    #[tokio::test]
    async fn get_versions_refreshes_empty_store() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let (tags, eol) = working_sources();

        let versions = service(store, tags, eol).get_versions().await.unwrap();

        let names: Vec<_> = versions.into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Python 3.14.0", "Python 3.12.7"]);
    }

    #[tokio::test]
    async fn get_versions_refreshes_records_older_than_a_day() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        store
            .upsert_many(&[stored_record(Duration::hours(24) + Duration::minutes(1))])
            .unwrap();
        let (tags, eol) = working_sources();

        let versions = service(store, tags, eol).get_versions().await.unwrap();

        // Older series stay stored next to the refreshed ones
        let names: Vec<_> = versions.into_iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec!["Python 3.14.0", "Python 3.12.7", "Python 3.12.6"]
        );
    }

    #[tokio::test]
    async fn get_versions_serves_stale_records_when_refresh_fails() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let stale = vec![stored_record(Duration::days(5))];
        store.upsert_many(&stale).unwrap();
        let mut tags = MockTagSource::new();
        tags.expect_fetch_tags().returning(|| Ok(Vec::new()));
        let mut eol = MockEolSource::new();
        eol.expect_fetch_eol_dates()
            .times(1)
            .returning(|| Err(SourceError::InvalidResponse("503".to_string())));

        let versions = service(store, tags, eol).get_versions().await.unwrap();

        assert_eq!(versions, stale);
    }

    #[tokio::test]
    async fn get_versions_returns_empty_when_first_refresh_fails() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let mut tags = MockTagSource::new();
        tags.expect_fetch_tags().returning(|| Ok(Vec::new()));
        let mut eol = MockEolSource::new();
        eol.expect_fetch_eol_dates()
            .returning(|| Err(SourceError::InvalidResponse("503".to_string())));

        let versions = service(store, tags, eol).get_versions().await.unwrap();

        assert!(versions.is_empty());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let (tags, eol) = working_sources();
        let service = service(store, tags, eol);

        let (first, second) = tokio::join!(service.get_versions(), service.get_versions());

        assert_eq!(first.unwrap(), second.unwrap());
    }
}
