//! REST API request handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ContrarxError;
use crate::interactions::InteractionEngine;
use crate::metrics::{get_metrics, MetricsSnapshot};
use crate::model::{Drug, PairReport, RiskRating};
use crate::resolver::DrugResolver;
use crate::store::{DrugStore, StoreStats};

/// Application state shared across handlers.
pub struct ApiState {
    pub resolver: Arc<DrugResolver>,
    pub engine: Arc<InteractionEngine>,
    pub store: Arc<dyn DrugStore>,
}

impl ApiState {
    pub fn new(
        resolver: Arc<DrugResolver>,
        engine: Arc<InteractionEngine>,
        store: Arc<dyn DrugStore>,
    ) -> Self {
        Self {
            resolver,
            engine,
            store,
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Drug search query parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    /// Free-text drug name.
    #[serde(default)]
    pub name: String,
}

/// Autocomplete query parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AutocompleteParams {
    #[serde(default)]
    pub prefix: String,
}

/// Drug payload returned by search.
#[derive(Debug, Clone, Serialize)]
pub struct DrugResponse {
    pub id: String,
    pub name: String,
    pub category: String,
    pub indications: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(rename = "mechanismOfAction")]
    pub mechanism_of_action: String,
    pub dosage: String,
    pub contraindications: Vec<String>,
}

impl From<Drug> for DrugResponse {
    fn from(drug: Drug) -> Self {
        Self {
            id: drug.id,
            name: drug.name,
            category: drug.category,
            indications: drug.indications,
            warnings: drug.warnings,
            mechanism_of_action: drug.mechanism_of_action,
            dosage: drug.dosage,
            contraindications: drug.contraindications,
        }
    }
}

/// Search response.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    #[serde(rename = "hitCache")]
    pub hit_cache: bool,
    pub data: DrugResponse,
}

/// Analyze request body.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(rename = "drugIds")]
    pub drug_ids: Vec<String>,
}

/// One pair entry of an analyze response.
#[derive(Debug, Clone, Serialize)]
pub struct PairResponse {
    pub drug1_name: String,
    pub drug2_name: String,
    pub summary: String,
    pub details: String,
    pub risk_rating: RiskRating,
}

impl From<PairReport> for PairResponse {
    fn from(report: PairReport) -> Self {
        Self {
            drug1_name: report.drug1_name,
            drug2_name: report.drug2_name,
            summary: report.summary,
            details: report.details,
            risk_rating: report.rating,
        }
    }
}

/// Analyze response.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub pairs: Vec<PairResponse>,
}

/// Stats response.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub store: StoreStats,
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
}

/// Error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Map a domain error to an HTTP response.
fn error_response(err: ContrarxError) -> Response {
    let (status, code) = match &err {
        ContrarxError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
        ContrarxError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        ContrarxError::Source(_) => (StatusCode::BAD_GATEWAY, "drug_source_unavailable"),
        ContrarxError::Reasoning(_) => (StatusCode::BAD_GATEWAY, "reasoning_unavailable"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: code.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handler Functions
// ============================================================================

/// GET /api/drugs/search?name=... - Resolve a drug by name.
pub async fn search_handler(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    match state.resolver.resolve(&params.name).await {
        Ok(resolution) => Json(SearchResponse {
            hit_cache: resolution.hit_cache,
            data: resolution.drug.into(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/drugs/autocomplete?prefix=... - Matching drug names.
pub async fn autocomplete_handler(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<AutocompleteParams>,
) -> Response {
    let fragment = params.prefix.trim().to_lowercase();
    if fragment.is_empty() {
        return Json(Vec::<String>::new()).into_response();
    }

    match state.store.matching_names(&fragment, 10).await {
        Ok(names) => Json(names).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/interactions/analyze - Analyze every pair among drug ids.
pub async fn analyze_handler(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Response {
    match state.engine.analyze_ids(&request.drug_ids).await {
        Ok(reports) => Json(AnalyzeResponse {
            pairs: reports.into_iter().map(PairResponse::from).collect(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/stats - Store counts plus service counters.
pub async fn stats_handler(State(state): State<Arc<ApiState>>) -> Response {
    match state.store.stats().await {
        Ok(store) => Json(StatsResponse {
            store,
            metrics: get_metrics().snapshot(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /health - Liveness probe.
pub async fn health_handler() -> &'static str {
    "OK"
}
