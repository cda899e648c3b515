//! Contrarx: Drug Interaction Analysis Service
//!
//! A Rust service that resolves drug names against the openFDA label API
//! with a cache-aside persistent store, and analyzes pairwise drug
//! interactions through a configurable LLM reasoning backend, caching
//! every verdict so repeated requests never repeat an external call.

pub mod api;
pub mod config;
pub mod error;
pub mod interactions;
pub mod metrics;
pub mod model;
pub mod reasoning;
pub mod resolver;
pub mod source;
pub mod store;

pub use api::{create_rest_router, ApiState, RestApiConfig};
pub use config::{Config, ReasoningBackend};
pub use error::{ContrarxError, Result};
pub use interactions::InteractionEngine;
pub use metrics::{get_metrics, Metrics, MetricsSnapshot};
pub use model::{
    Drug, InteractionVerdict, LookupRecord, PairKey, PairReport, ResolutionSource, RiskRating,
};
pub use reasoning::{create_provider, ChatMessage, ReasoningProvider};
pub use resolver::{DrugResolver, Resolution};
pub use source::{create_source, DrugSource, RawDrugRecord};
pub use store::{DrugStore, SqliteStore, StoreStats};
