//! End-to-end resolve-then-analyze scenarios.

use std::sync::Arc;

use tempfile::TempDir;

use contrarx::interactions::InteractionEngine;
use contrarx::model::RiskRating;
use contrarx::resolver::DrugResolver;
use contrarx::store::{DrugStore, SqliteStore};

use crate::support::{FixtureProvider, FixtureSource};

const WARN_VERDICT: &str =
    r#"{"summary": "Increased bleeding risk", "rating": "Warning", "details": "Monitor INR closely"}"#;

struct Harness {
    _dir: TempDir,
    store: Arc<SqliteStore>,
    resolver: DrugResolver,
    engine: InteractionEngine,
    source: Arc<FixtureSource>,
    provider: Arc<FixtureProvider>,
}

fn harness(source: FixtureSource, provider: FixtureProvider) -> Harness {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteStore::open(&dir.path().join("contrarx.db")).unwrap());
    let source = Arc::new(source);
    let provider = Arc::new(provider);
    Harness {
        resolver: DrugResolver::new(store.clone(), source.clone()),
        engine: InteractionEngine::new(store.clone(), provider.clone()),
        _dir: dir,
        store,
        source,
        provider,
    }
}

#[tokio::test]
async fn resolve_then_analyze_then_repeat_makes_no_further_external_calls() {
    let h = harness(
        FixtureSource::new().with_drug("AspirinX").with_drug("WarfarinY"),
        FixtureProvider::new().with_response("AspirinX", "WarfarinY", WARN_VERDICT),
    );

    // Two uncached resolutions: two source calls, two persisted drugs.
    let aspirin = h.resolver.resolve("AspirinX").await.unwrap().drug;
    let warfarin = h.resolver.resolve("WarfarinY").await.unwrap().drug;
    assert_eq!(h.source.calls(), 2);
    assert_eq!(h.store.stats().await.unwrap().drug_count, 2);

    // First analysis: one reasoning call, one persisted verdict.
    let ids = vec![aspirin.id.clone(), warfarin.id.clone()];
    let first = h.engine.analyze_ids(&ids).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].rating, RiskRating::Warning);
    assert_eq!(h.provider.calls(), 1);
    assert_eq!(h.store.stats().await.unwrap().verdict_count, 1);

    // Repeating the exact same call is served entirely from the store.
    let second = h.engine.analyze_ids(&ids).await.unwrap();
    assert_eq!(h.provider.calls(), 1);
    assert_eq!(h.source.calls(), 2);
    assert_eq!(second[0].summary, first[0].summary);
    assert_eq!(second[0].details, first[0].details);
    assert_eq!(second[0].rating, first[0].rating);
}

#[tokio::test]
async fn reversed_id_order_reuses_the_same_verdict() {
    let h = harness(
        FixtureSource::new().with_drug("AspirinX").with_drug("WarfarinY"),
        FixtureProvider::new().with_response("AspirinX", "WarfarinY", WARN_VERDICT),
    );

    let aspirin = h.resolver.resolve("AspirinX").await.unwrap().drug;
    let warfarin = h.resolver.resolve("WarfarinY").await.unwrap().drug;

    h.engine
        .analyze_ids(&[aspirin.id.clone(), warfarin.id.clone()])
        .await
        .unwrap();
    let reversed = h
        .engine
        .analyze_ids(&[warfarin.id.clone(), aspirin.id.clone()])
        .await
        .unwrap();

    assert_eq!(h.provider.calls(), 1);
    assert_eq!(h.store.stats().await.unwrap().verdict_count, 1);
    assert_eq!(reversed[0].summary, "Increased bleeding risk");
}

#[tokio::test]
async fn batch_reports_every_pair_even_when_one_fails() {
    // Three drugs, responses scripted for two of the three pairs.
    let h = harness(
        FixtureSource::new()
            .with_drug("AspirinX")
            .with_drug("WarfarinY")
            .with_drug("Omeprazol"),
        FixtureProvider::new()
            .with_response("AspirinX", "WarfarinY", WARN_VERDICT)
            .with_response(
                "WarfarinY",
                "Omeprazol",
                r#"{"summary": "No interaction expected", "rating": "Safe", "details": ""}"#,
            ),
    );

    let mut ids = Vec::new();
    for name in ["AspirinX", "WarfarinY", "Omeprazol"] {
        ids.push(h.resolver.resolve(name).await.unwrap().drug.id);
    }

    let reports = h.engine.analyze_ids(&ids).await.unwrap();
    assert_eq!(reports.len(), 3);

    // The scripted pairs return real, distinct verdicts.
    assert_eq!(reports[0].rating, RiskRating::Warning);
    assert_eq!(reports[2].rating, RiskRating::Safe);
    // The unscripted pair degrades to Unknown instead of failing the batch.
    assert_eq!(reports[1].rating, RiskRating::Unknown);
    assert!(reports[1].summary.contains("unavailable"));

    // Only successful verdicts were persisted; the failed pair can retry.
    assert_eq!(h.store.stats().await.unwrap().verdict_count, 2);
}

#[tokio::test]
async fn fenced_response_parses_and_caches_normally() {
    let h = harness(
        FixtureSource::new().with_drug("AspirinX").with_drug("WarfarinY"),
        FixtureProvider::new().with_response(
            "AspirinX",
            "WarfarinY",
            "```json\n{\"summary\": \"Bleeding risk\", \"rating\": \"Prohibited\", \"details\": \"Avoid combination\"}\n```",
        ),
    );

    let aspirin = h.resolver.resolve("AspirinX").await.unwrap().drug;
    let warfarin = h.resolver.resolve("WarfarinY").await.unwrap().drug;

    let reports = h
        .engine
        .analyze_ids(&[aspirin.id, warfarin.id])
        .await
        .unwrap();
    assert_eq!(reports[0].rating, RiskRating::Prohibited);
    assert_eq!(reports[0].summary, "Bleeding risk");
    assert_eq!(reports[0].details, "Avoid combination");
    assert_eq!(h.store.stats().await.unwrap().verdict_count, 1);
}
