//! Core data types: drugs, pair keys, interaction verdicts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a resolved drug record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionSource {
    /// Served from the persistent store without an external call.
    Cached,
    /// Fetched from the external drug source on this resolution.
    External,
}

/// A resolved drug with its canonical attributes.
///
/// The `id` is assigned once, at first successful resolution, and never
/// changes. The `name` is the externally-sourced canonical display name;
/// lookups against the store match on a normalized substring instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drug {
    pub id: String,
    pub name: String,
    pub category: String,
    pub indications: Vec<String>,
    pub warnings: Vec<String>,
    pub mechanism_of_action: String,
    pub dosage: String,
    pub contraindications: Vec<String>,
    pub source: ResolutionSource,
    pub last_resolved_at: DateTime<Utc>,
}

impl Drug {
    /// Render the descriptive attributes as a single text block for the
    /// reasoning prompt.
    pub fn description(&self) -> String {
        fn join_or(items: &[String], fallback: &str) -> String {
            if items.is_empty() {
                fallback.to_string()
            } else {
                items.join("; ")
            }
        }

        format!(
            "Name: {}\nCategory: {}\nIndications: {}\nWarnings: {}\nMechanism of action: {}\nDosage: {}\nContraindications: {}",
            self.name,
            self.category,
            join_or(&self.indications, "Not specified"),
            join_or(&self.warnings, "No major warnings"),
            if self.mechanism_of_action.is_empty() {
                "Not available"
            } else {
                &self.mechanism_of_action
            },
            if self.dosage.is_empty() {
                "Consult with a healthcare provider"
            } else {
                &self.dosage
            },
            join_or(&self.contraindications, "Not specified"),
        )
    }
}

/// Severity rating for a drug pair.
///
/// The four values are a fixed taxonomy; stored rows and API responses use
/// the capitalized spellings. Anything unrecognized parses as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskRating {
    /// Minimal clinical risk.
    Safe,
    /// Moderate risk; medical advice recommended, not immediately
    /// life-threatening.
    Warning,
    /// Severe or potentially life-threatening.
    Prohibited,
    /// No verdict obtainable.
    Unknown,
}

impl RiskRating {
    /// Parse a rating string case-insensitively, defaulting to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "safe" => RiskRating::Safe,
            "warning" => RiskRating::Warning,
            "prohibited" => RiskRating::Prohibited,
            _ => RiskRating::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskRating::Safe => "Safe",
            RiskRating::Warning => "Warning",
            RiskRating::Prohibited => "Prohibited",
            RiskRating::Unknown => "Unknown",
        }
    }

    /// Sort key for severity ordering: Prohibited first, Unknown last.
    pub fn severity_rank(&self) -> u8 {
        match self {
            RiskRating::Prohibited => 0,
            RiskRating::Warning => 1,
            RiskRating::Safe => 2,
            RiskRating::Unknown => 3,
        }
    }
}

/// Canonical, order-independent key for an unordered pair of drug ids.
///
/// The two ids are sorted lexicographically on construction, so `(A, B)`
/// and `(B, A)` produce the same key and resolve to the same stored row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey {
    first: String,
    second: String,
}

impl PairKey {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let a = a.into();
        let b = b.into();
        if a <= b {
            PairKey { first: a, second: b }
        } else {
            PairKey { first: b, second: a }
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }
}

/// The cached outcome of evaluating a drug pair.
///
/// Created on the first successful reasoning call for the pair; a cache hit
/// always short-circuits re-evaluation, so content only changes on an
/// explicit re-evaluation (which bumps `updated_at`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionVerdict {
    pub pair: PairKey,
    pub summary: String,
    pub details: String,
    pub rating: RiskRating,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Audit row written on every successful resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupRecord {
    pub id: String,
    pub drug_id: String,
    pub hit_cache: bool,
    pub elapsed_ms: u64,
    pub logged_at: DateTime<Utc>,
}

impl LookupRecord {
    pub fn new(drug_id: &str, hit_cache: bool, elapsed_ms: u64) -> Self {
        LookupRecord {
            id: uuid::Uuid::new_v4().to_string(),
            drug_id: drug_id.to_string(),
            hit_cache,
            elapsed_ms,
            logged_at: Utc::now(),
        }
    }
}

/// One entry of an interaction report.
///
/// Ids are the canonical pair ordering; the names are the two drugs' display
/// names in the caller's traversal order, which is what the boundary
/// renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairReport {
    pub drug1_id: String,
    pub drug2_id: String,
    pub drug1_name: String,
    pub drug2_name: String,
    pub summary: String,
    pub details: String,
    pub rating: RiskRating,
}
