//! Persistent storage for drugs, interaction verdicts, and the lookup log.
//!
//! The store doubles as the cache layer: resolution and analysis both check
//! here before touching an external service, and both write their results
//! back so repeated requests stay local.

mod sqlite;

pub use sqlite::SqliteStore;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Drug, InteractionVerdict, LookupRecord, PairKey};

/// Store statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of resolved drugs.
    pub drug_count: usize,
    /// Number of cached interaction verdicts.
    pub verdict_count: usize,
    /// Number of logged lookups.
    pub lookup_count: usize,
}

/// Trait for the persistent drug store.
#[async_trait]
pub trait DrugStore: Send + Sync {
    /// Find a stored drug whose normalized name contains the normalized
    /// query. Ties are broken by insertion order.
    async fn find_drug_by_name_fragment(&self, normalized: &str) -> Result<Option<Drug>>;

    /// Persist a newly resolved drug and its detail attributes as a single
    /// logical write.
    async fn insert_drug(&self, drug: &Drug) -> Result<()>;

    /// Refresh a drug's last-resolved timestamp.
    async fn touch_last_resolved(&self, id: &str) -> Result<()>;

    /// Load drugs by id, preserving input order. Unknown ids are skipped.
    async fn drugs_by_ids(&self, ids: &[String]) -> Result<Vec<Drug>>;

    /// Map drug ids to display names.
    async fn names_by_ids(&self, ids: &[String]) -> Result<HashMap<String, String>>;

    /// Look up the cached verdict for a canonical pair.
    async fn find_verdict(&self, pair: &PairKey) -> Result<Option<InteractionVerdict>>;

    /// Insert or update the verdict for a canonical pair. Exactly one row
    /// exists per pair regardless of concurrent writers.
    async fn upsert_verdict(&self, verdict: &InteractionVerdict) -> Result<()>;

    /// Names whose normalized form contains the fragment, ordered by name.
    async fn matching_names(&self, fragment: &str, limit: usize) -> Result<Vec<String>>;

    /// Append a lookup audit record.
    async fn record_lookup(&self, record: &LookupRecord) -> Result<()>;

    /// Store statistics.
    async fn stats(&self) -> Result<StoreStats>;
}
