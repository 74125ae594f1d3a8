//! Time-bounded cache of table and column names.
//!
//! The cache holds at most one [`SchemaSnapshot`]. A snapshot is replaced
//! wholesale on refresh and dropped on [`SchemaCache::invalidate`]; tables and
//! columns always come from the same fetch.
//!
//! Concurrent callers that find the snapshot missing or stale queue on a
//! refresh lock, so only the first of them hits the catalog and the rest
//! reuse its result.

use crate::adapter::{CatalogAccessor, ColumnRef};
use crate::error::AssistError;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Tables and columns of the default schema at one point in time.
#[derive(Debug, Clone)]
pub struct SchemaSnapshot {
    tables: Vec<String>,
    columns: Vec<ColumnRef>,
    fetched_at: Instant,
    captured_at: DateTime<Utc>,
}

impl SchemaSnapshot {
    pub fn new(tables: Vec<String>, columns: Vec<ColumnRef>) -> Self {
        Self {
            tables,
            columns,
            fetched_at: Instant::now(),
            captured_at: Utc::now(),
        }
    }

    /// Table names in catalog order.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }

    /// Wall-clock time of the fetch, for display.
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    /// Canonical spelling of `name` if the table exists (case-insensitive).
    pub fn find_table(&self, name: &str) -> Option<&str> {
        self.tables
            .iter()
            .find(|t| t.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Columns of one table, in catalog order.
    pub fn columns_of(&self, table: &str) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.table.eq_ignore_ascii_case(table))
            .map(|c| c.column.as_str())
            .collect()
    }

    /// Every column name once, in order of first appearance.
    pub fn distinct_column_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.columns
            .iter()
            .map(|c| c.column.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

/// Stored snapshot plus the invalidation count it belongs to.
///
/// Both live under one lock so an invalidation can never slip between the
/// generation check and the store of a refresh.
#[derive(Default)]
struct Slot {
    generation: u64,
    snapshot: Option<Arc<SchemaSnapshot>>,
}

/// Lazily refreshed, explicitly invalidated schema snapshot.
pub struct SchemaCache<C> {
    catalog: C,
    ttl: Duration,
    current: RwLock<Slot>,
    refresh: Mutex<()>,
}

impl<C: CatalogAccessor> SchemaCache<C> {
    pub fn new(catalog: C, ttl: Duration) -> Self {
        Self {
            catalog,
            ttl,
            current: RwLock::new(Slot::default()),
            refresh: Mutex::new(()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The current snapshot, fetching a new one if missing or older than the TTL.
    ///
    /// On catalog failure the cache is left empty and the error is returned.
    pub async fn snapshot(&self) -> Result<Arc<SchemaSnapshot>, AssistError> {
        if let Some(snapshot) = self.fresh() {
            return Ok(snapshot);
        }

        let _guard = self.refresh.lock().await;

        // Someone else may have refreshed while we waited for the lock.
        if let Some(snapshot) = self.fresh() {
            return Ok(snapshot);
        }

        let generation = self.generation();
        match self.fetch().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.commit(generation, Some(snapshot.clone()));
                Ok(snapshot)
            }
            Err(e) => {
                self.commit(generation, None);
                Err(AssistError::SchemaFetch(e))
            }
        }
    }

    /// Drop the snapshot so the next [`snapshot`](Self::snapshot) call refetches.
    pub fn invalidate(&self) {
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        slot.generation += 1;
        slot.snapshot = None;
    }

    /// The stored snapshot, stale or not, without touching the catalog.
    pub fn peek(&self) -> Option<Arc<SchemaSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot
            .clone()
    }

    fn fresh(&self) -> Option<Arc<SchemaSnapshot>> {
        self.peek().filter(|s| s.age() <= self.ttl)
    }

    fn generation(&self) -> u64 {
        self.current.read().unwrap_or_else(PoisonError::into_inner).generation
    }

    /// Store the outcome of a fetch started at `generation`.
    ///
    /// Returns false, leaving the slot alone, if an invalidation happened since.
    fn commit(&self, generation: u64, snapshot: Option<Arc<SchemaSnapshot>>) -> bool {
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if slot.generation != generation {
            return false;
        }
        slot.snapshot = snapshot;
        true
    }

    async fn fetch(&self) -> anyhow::Result<SchemaSnapshot> {
        let tables = self.catalog.list_tables().await?;
        let columns = self.catalog.list_columns().await?;
        Ok(SchemaSnapshot::new(tables, columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingCatalog {
        fetches: AtomicUsize,
        fail_columns: AtomicBool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl CatalogAccessor for CountingCatalog {
        async fn list_tables(&self) -> anyhow::Result<Vec<String>> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(vec![format!("t{n}")])
        }

        async fn list_columns(&self) -> anyhow::Result<Vec<ColumnRef>> {
            if self.fail_columns.load(Ordering::SeqCst) {
                anyhow::bail!("permission denied for schema public");
            }
            Ok(vec![ColumnRef::new("t", "id")])
        }
    }

    fn cache(catalog: CountingCatalog, ttl: Duration) -> SchemaCache<Arc<CountingCatalog>> {
        SchemaCache::new(Arc::new(catalog), ttl)
    }

    #[tokio::test]
    async fn test_within_ttl_reuses_snapshot() {
        let cache = cache(CountingCatalog::default(), Duration::from_secs(60));
        let first = cache.snapshot().await.unwrap();
        let second = cache.snapshot().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.catalog.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_snapshot_is_refetched() {
        let cache = cache(CountingCatalog::default(), Duration::from_millis(1));
        cache.snapshot().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let snapshot = cache.snapshot().await.unwrap();

        assert_eq!(snapshot.tables(), ["t1".to_string()]);
        assert_eq!(cache.catalog.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let cache = cache(CountingCatalog::default(), Duration::from_secs(3600));
        cache.snapshot().await.unwrap();
        cache.invalidate();
        assert!(cache.peek().is_none());

        cache.snapshot().await.unwrap();
        assert_eq!(cache.catalog.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_leaves_cache_empty() {
        let catalog = CountingCatalog::default();
        catalog.fail_columns.store(true, Ordering::SeqCst);
        let cache = cache(catalog, Duration::from_secs(60));

        let err = cache.snapshot().await.unwrap_err();
        assert!(matches!(err, AssistError::SchemaFetch(_)));
        assert_eq!(err.to_string(), "permission denied for schema public");
        assert!(cache.peek().is_none());

        cache.catalog.fail_columns.store(false, Ordering::SeqCst);
        let snapshot = cache.snapshot().await.unwrap();
        assert_eq!(snapshot.columns().len(), 1);
        assert_eq!(cache.catalog.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let cache = Arc::new(cache(
            CountingCatalog {
                delay: Some(Duration::from_millis(20)),
                ..Default::default()
            },
            Duration::from_secs(60),
        ));

        let calls = (0..8).map(|_| {
            let cache = cache.clone();
            async move { cache.snapshot().await }
        });
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(cache.catalog.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidation_during_fetch_is_not_overwritten() {
        let cache = Arc::new(cache(
            CountingCatalog {
                delay: Some(Duration::from_millis(30)),
                ..Default::default()
            },
            Duration::from_secs(60),
        ));

        let refreshing = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.snapshot().await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.invalidate();

        let snapshot = refreshing.await.unwrap().unwrap();
        assert_eq!(snapshot.tables(), ["t0".to_string()]);
        assert!(cache.peek().is_none());
    }

    #[tokio::test]
    async fn test_commit_after_invalidate_is_discarded() {
        let cache = cache(CountingCatalog::default(), Duration::from_secs(60));
        let stale = cache.snapshot().await.unwrap();

        let generation = cache.generation();
        cache.invalidate();
        assert!(!cache.commit(generation, Some(stale)));
        assert!(cache.peek().is_none());

        assert!(cache.commit(cache.generation(), None));
        let fresh = cache.snapshot().await.unwrap();
        assert_eq!(fresh.tables(), ["t1".to_string()]);
        assert_eq!(cache.catalog.fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_snapshot_lookups() {
        let snapshot = SchemaSnapshot::new(
            vec!["users".to_string(), "orders".to_string()],
            vec![
                ColumnRef::new("users", "id"),
                ColumnRef::new("users", "name"),
                ColumnRef::new("orders", "id"),
                ColumnRef::new("orders", "total"),
            ],
        );

        assert_eq!(snapshot.find_table("USERS"), Some("users"));
        assert_eq!(snapshot.find_table("people"), None);
        assert_eq!(snapshot.columns_of("orders"), vec!["id", "total"]);
        assert_eq!(snapshot.distinct_column_names(), vec!["id", "name", "total"]);
    }
}
