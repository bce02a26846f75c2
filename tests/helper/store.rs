//! Store test utilities

use std::sync::Arc;

use tempfile::TempDir;

use python_versions::version::store::{RecordStore, SqliteStore};
use python_versions::version::types::VersionRecord;

/// Create a file-backed test store with pre-populated records
#[allow(dead_code)]
pub fn create_test_store(records: &[VersionRecord]) -> (TempDir, Arc<SqliteStore>) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let store = SqliteStore::new(&db_path).unwrap();

    store.upsert_many(records).unwrap();

    (temp_dir, Arc::new(store))
}
