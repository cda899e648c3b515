//! Shared test doubles and fixtures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use contrarx::error::{ReasoningError, Result, SourceError};
use contrarx::reasoning::{ChatMessage, ReasoningProvider};
use contrarx::source::{DrugSource, RawDrugRecord};

/// Drug source answering from a fixed name -> record table, counting calls.
pub struct FixtureSource {
    calls: AtomicUsize,
    records: Mutex<HashMap<String, RawDrugRecord>>,
    /// When set, every lookup fails with a transient error.
    pub unavailable: std::sync::atomic::AtomicBool,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            records: Mutex::new(HashMap::new()),
            unavailable: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn with_drug(self, name: &str) -> Self {
        self.records.lock().insert(
            name.to_lowercase(),
            RawDrugRecord {
                name: Some(name.to_string()),
                category: Some("HUMAN PRESCRIPTION DRUG".to_string()),
                indications: vec![format!("{name} indication")],
                warnings: vec![format!("{name} warning")],
                mechanism_of_action: vec![format!("{name} mechanism")],
                dosage: vec![format!("{name} dosage")],
                contraindications: vec![format!("{name} contraindication")],
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DrugSource for FixtureSource {
    async fn lookup(&self, name: &str) -> Result<Option<RawDrugRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SourceError::Status {
                status: 503,
                body: "fixture outage".to_string(),
            }
            .into());
        }
        Ok(self.records.lock().get(name).cloned())
    }
}

/// Reasoning provider answering from (name, name) -> raw response entries,
/// counting calls. Pairs with no entry fail with a transient error.
pub struct FixtureProvider {
    calls: AtomicUsize,
    responses: Mutex<Vec<(String, String, String)>>,
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            responses: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(self, a: &str, b: &str, raw: &str) -> Self {
        self.responses
            .lock()
            .push((a.to_string(), b.to_string(), raw.to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReasoningProvider for FixtureProvider {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = &messages[0].content;
        for (a, b, raw) in self.responses.lock().iter() {
            if prompt.contains(a.as_str()) && prompt.contains(b.as_str()) {
                return Ok(raw.clone());
            }
        }
        Err(ReasoningError::Status {
            status: 429,
            body: "fixture quota".to_string(),
        }
        .into())
    }

    fn id(&self) -> &'static str {
        "fixture"
    }
}
