//! Pairwise drug interaction analysis.
//!
//! Given a set of resolved drugs the engine enumerates every unordered
//! pair, canonicalizes each pair's key, serves cached verdicts from the
//! store, and sends only the misses to the reasoning provider. One pair's
//! failure never aborts the rest of the batch: the failing pair degrades
//! to an `Unknown` entry and the report always has one entry per pair.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{ContrarxError, Result};
use crate::metrics::get_metrics;
use crate::model::{Drug, InteractionVerdict, PairKey, PairReport, RiskRating};
use crate::reasoning::{pair_prompt, parse_verdict, ChatMessage, ReasoningProvider};
use crate::store::DrugStore;

/// Interaction engine combining the store and the reasoning provider.
pub struct InteractionEngine {
    store: Arc<dyn DrugStore>,
    provider: Arc<dyn ReasoningProvider>,
}

impl InteractionEngine {
    pub fn new(store: Arc<dyn DrugStore>, provider: Arc<dyn ReasoningProvider>) -> Self {
        Self { store, provider }
    }

    /// Analyze every unordered pair among the given drug ids.
    ///
    /// Loads the drugs from the store; unknown ids are an error since the
    /// caller is expected to have resolved them first.
    pub async fn analyze_ids(&self, ids: &[String]) -> Result<Vec<PairReport>> {
        let distinct = distinct_ids(ids);
        if distinct.len() < 2 {
            return Err(ContrarxError::validation(
                "At least two distinct drug ids are required for interaction analysis",
            ));
        }

        let drugs = self.store.drugs_by_ids(&distinct).await?;
        if drugs.len() < distinct.len() {
            let missing: Vec<_> = distinct
                .iter()
                .filter(|id| !drugs.iter().any(|d| &d.id == *id))
                .cloned()
                .collect();
            return Err(ContrarxError::not_found(format!(
                "Unknown drug ids: {}",
                missing.join(", ")
            )));
        }

        self.analyze(&drugs).await
    }

    /// Analyze every unordered pair among the given drugs.
    ///
    /// For `n` distinct drugs the report has exactly `n*(n-1)/2` entries in
    /// `i < j` traversal order; display names follow that order while the
    /// stored key is canonical.
    pub async fn analyze(&self, drugs: &[Drug]) -> Result<Vec<PairReport>> {
        let drugs = distinct_drugs(drugs);
        if drugs.len() < 2 {
            return Err(ContrarxError::validation(
                "At least two distinct drugs are required for interaction analysis",
            ));
        }

        let started = Instant::now();
        let mut reports = Vec::with_capacity(drugs.len() * (drugs.len() - 1) / 2);

        for i in 0..drugs.len() {
            for j in (i + 1)..drugs.len() {
                reports.push(self.resolve_pair(drugs[i], drugs[j]).await?);
            }
        }

        get_metrics()
            .analyze_duration_seconds
            .observe(started.elapsed().as_secs_f64());
        Ok(reports)
    }

    /// Resolve one pair: cached verdict, or evaluate and persist.
    async fn resolve_pair(&self, a: &Drug, b: &Drug) -> Result<PairReport> {
        let pair = PairKey::new(a.id.as_str(), b.id.as_str());
        let metrics = get_metrics();

        if let Some(verdict) = self.store.find_verdict(&pair).await? {
            metrics.verdict_cache_hits_total.inc();
            debug!(first = pair.first(), second = pair.second(), "Verdict served from store");
            return Ok(report_from_verdict(a, b, &verdict));
        }

        metrics.reasoning_calls_total.inc();
        let prompt = pair_prompt(a, b);
        let store = Arc::clone(&self.store);
        let provider = Arc::clone(&self.provider);
        let task_pair = pair.clone();

        // Detached task: an abandoned request still completes the call and
        // persists the verdict, so the work populates the cache either way.
        let task = tokio::spawn(async move {
            let raw = provider.chat(&[ChatMessage::user(prompt)]).await?;
            let payload = parse_verdict(&raw);
            let now = Utc::now();
            let verdict = InteractionVerdict {
                pair: task_pair,
                summary: payload.summary,
                details: payload.details,
                rating: payload.rating,
                created_at: now,
                updated_at: now,
            };
            store.upsert_verdict(&verdict).await?;
            Ok::<InteractionVerdict, ContrarxError>(verdict)
        });

        match task.await {
            Ok(Ok(verdict)) => Ok(report_from_verdict(a, b, &verdict)),
            // A store failure is internal and aborts the batch; anything
            // else degrades this pair only.
            Ok(Err(e @ ContrarxError::Store(_))) => Err(e),
            Ok(Err(e)) => {
                metrics.reasoning_failures_total.inc();
                warn!(
                    first = pair.first(),
                    second = pair.second(),
                    error = %e,
                    "Reasoning call failed, reporting pair as Unknown"
                );
                Ok(unknown_report(&pair, a, b))
            }
            Err(e) => {
                metrics.reasoning_failures_total.inc();
                warn!(
                    first = pair.first(),
                    second = pair.second(),
                    error = %e,
                    "Reasoning task aborted, reporting pair as Unknown"
                );
                Ok(unknown_report(&pair, a, b))
            }
        }
    }
}

/// Degraded report for a pair whose verdict could not be obtained. Nothing
/// is persisted, so a later run retries the pair.
fn unknown_report(pair: &PairKey, a: &Drug, b: &Drug) -> PairReport {
    PairReport {
        drug1_id: pair.first().to_string(),
        drug2_id: pair.second().to_string(),
        drug1_name: a.name.clone(),
        drug2_name: b.name.clone(),
        summary: format!(
            "Interaction analysis for {} and {} is currently unavailable",
            a.name, b.name
        ),
        details: String::new(),
        rating: RiskRating::Unknown,
    }
}

fn report_from_verdict(a: &Drug, b: &Drug, verdict: &InteractionVerdict) -> PairReport {
    PairReport {
        drug1_id: verdict.pair.first().to_string(),
        drug2_id: verdict.pair.second().to_string(),
        drug1_name: a.name.clone(),
        drug2_name: b.name.clone(),
        summary: verdict.summary.clone(),
        details: verdict.details.clone(),
        rating: verdict.rating,
    }
}

fn distinct_ids(ids: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for id in ids {
        if !seen.contains(id) {
            seen.push(id.clone());
        }
    }
    seen
}

fn distinct_drugs(drugs: &[Drug]) -> Vec<&Drug> {
    let mut seen: Vec<&Drug> = Vec::new();
    for drug in drugs {
        if !seen.iter().any(|d| d.id == drug.id) {
            seen.push(drug);
        }
    }
    seen
}
