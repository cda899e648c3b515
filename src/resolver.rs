//! Cache-aside drug resolution.
//!
//! A resolution checks the persistent store first and only falls back to
//! the external source on a miss, writing the fetched record back so the
//! next lookup stays local. Not-found and transient failures are never
//! cached.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ContrarxError, Result};
use crate::metrics::get_metrics;
use crate::model::{Drug, LookupRecord, ResolutionSource};
use crate::source::{DrugSource, RawDrugRecord};
use crate::store::DrugStore;

/// Outcome of a resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub drug: Drug,
    /// Whether the store served this resolution without an external call.
    pub hit_cache: bool,
}

/// Cache-aside resolver combining the store and the external drug source.
pub struct DrugResolver {
    store: Arc<dyn DrugStore>,
    source: Arc<dyn DrugSource>,
}

impl DrugResolver {
    pub fn new(store: Arc<dyn DrugStore>, source: Arc<dyn DrugSource>) -> Self {
        Self { store, source }
    }

    /// Resolve a free-text drug name to a canonical record.
    ///
    /// The lookup key is the trimmed, lowercased query; matching against
    /// stored names is substring, not exact, with ties broken by insertion
    /// order. That relaxed-match policy is legacy behavior and load-bearing.
    pub async fn resolve(&self, name: &str) -> Result<Resolution> {
        let normalized = name.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ContrarxError::validation("Drug name must not be empty"));
        }

        let metrics = get_metrics();
        let started = Instant::now();

        if let Some(drug) = self.store.find_drug_by_name_fragment(&normalized).await? {
            self.store.touch_last_resolved(&drug.id).await?;
            self.store
                .record_lookup(&LookupRecord::new(
                    &drug.id,
                    true,
                    started.elapsed().as_millis() as u64,
                ))
                .await?;

            metrics.drug_cache_hits_total.inc();
            metrics
                .resolve_duration_seconds
                .observe(started.elapsed().as_secs_f64());
            debug!(query = %normalized, id = %drug.id, "Resolved from store");
            return Ok(Resolution {
                drug,
                hit_cache: true,
            });
        }

        let raw = match self.source.lookup(&normalized).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                metrics.drug_not_found_total.inc();
                return Err(ContrarxError::not_found(format!(
                    "No drug record for '{normalized}'"
                )));
            }
            Err(e) => {
                metrics.source_errors_total.inc();
                return Err(e);
            }
        };

        let drug = map_raw_record(raw, &normalized);
        self.store.insert_drug(&drug).await?;
        self.store
            .record_lookup(&LookupRecord::new(
                &drug.id,
                false,
                started.elapsed().as_millis() as u64,
            ))
            .await?;

        metrics.drug_cache_misses_total.inc();
        metrics
            .resolve_duration_seconds
            .observe(started.elapsed().as_secs_f64());
        info!(query = %normalized, id = %drug.id, name = %drug.name, "Resolved from external source");
        Ok(Resolution {
            drug,
            hit_cache: false,
        })
    }
}

/// Map raw source attributes into a canonical drug record.
///
/// The canonical name is the upstream brand name, falling back to the
/// query; missing fields become empty strings or sequences.
fn map_raw_record(raw: RawDrugRecord, query: &str) -> Drug {
    Drug {
        id: Uuid::new_v4().to_string(),
        name: raw.name.unwrap_or_else(|| query.to_string()),
        category: raw.category.unwrap_or_else(|| "Unknown".to_string()),
        indications: raw.indications,
        warnings: raw.warnings,
        mechanism_of_action: raw.mechanism_of_action.join("\n"),
        dosage: raw.dosage.join("\n"),
        contraindications: raw.contraindications,
        source: ResolutionSource::External,
        last_resolved_at: Utc::now(),
    }
}
