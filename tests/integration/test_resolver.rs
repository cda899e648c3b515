//! End-to-end resolver tests over an on-disk store.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tempfile::TempDir;

use contrarx::error::ContrarxError;
use contrarx::model::ResolutionSource;
use contrarx::resolver::DrugResolver;
use contrarx::store::{DrugStore, SqliteStore};

use crate::support::FixtureSource;

fn open_store(dir: &TempDir) -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open(&dir.path().join("contrarx.db")).unwrap())
}

#[tokio::test]
async fn resolution_survives_a_store_reopen() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(FixtureSource::new().with_drug("AspirinX"));

    {
        let store = open_store(&dir);
        let resolver = DrugResolver::new(store, source.clone());
        let resolution = resolver.resolve("aspirinx").await.unwrap();
        assert!(!resolution.hit_cache);
    }

    // A fresh process over the same file serves the cached record.
    let store = open_store(&dir);
    let resolver = DrugResolver::new(store, source.clone());
    let resolution = resolver.resolve("AspirinX").await.unwrap();
    assert!(resolution.hit_cache);
    assert_eq!(resolution.drug.source, ResolutionSource::Cached);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn outage_then_recovery_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let source = Arc::new(FixtureSource::new().with_drug("WarfarinY"));
    let resolver = DrugResolver::new(store.clone(), source.clone());

    source.unavailable.store(true, Ordering::SeqCst);
    let err = resolver.resolve("warfariny").await.unwrap_err();
    assert!(matches!(err, ContrarxError::Source(_)));
    // The outage left no trace in the store.
    assert_eq!(store.stats().await.unwrap().drug_count, 0);

    source.unavailable.store(false, Ordering::SeqCst);
    let resolution = resolver.resolve("warfariny").await.unwrap();
    assert_eq!(resolution.drug.name, "WarfarinY");
    assert_eq!(store.stats().await.unwrap().drug_count, 1);
}

#[tokio::test]
async fn unknown_name_reports_not_found_without_caching() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let source = Arc::new(FixtureSource::new());
    let resolver = DrugResolver::new(store.clone(), source.clone());

    for _ in 0..2 {
        let err = resolver.resolve("nonexistol").await.unwrap_err();
        assert!(matches!(err, ContrarxError::NotFound(_)));
    }
    // Both attempts reached the source; not-found is never cached.
    assert_eq!(source.calls(), 2);
    assert_eq!(store.stats().await.unwrap().drug_count, 0);
}
