//! openFDA drug label source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::SourceConfig;
use crate::error::{Result, SourceError};
use crate::source::{DrugSource, RawDrugRecord};

/// Drug source backed by the openFDA drug label endpoint.
pub struct OpenFdaSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

/// openFDA label search response.
#[derive(Debug, Deserialize)]
struct LabelResponse {
    #[serde(default)]
    results: Vec<LabelResult>,
}

#[derive(Debug, Deserialize)]
struct LabelResult {
    #[serde(default)]
    openfda: OpenFdaFields,
    #[serde(default)]
    indications_and_usage: Vec<String>,
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(default)]
    clinical_pharmacology: Vec<String>,
    #[serde(default)]
    dosage_and_administration: Vec<String>,
    #[serde(default)]
    contraindications: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenFdaFields {
    #[serde(default)]
    brand_name: Vec<String>,
    #[serde(default)]
    product_type: Vec<String>,
}

impl OpenFdaSource {
    /// Create a new openFDA source from configuration.
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(SourceError::Http)?;

        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENFDA_API_KEY").ok());

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl DrugSource for OpenFdaSource {
    async fn lookup(&self, name: &str) -> Result<Option<RawDrugRecord>> {
        let search = format!("openfda.brand_name:\"{name}\"");
        let mut query: Vec<(&str, &str)> = vec![("search", search.as_str()), ("limit", "1")];
        if let Some(key) = &self.api_key {
            query.push(("api_key", key.as_str()));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(SourceError::Http)?;

        // openFDA signals "no matches" with a 404 rather than an empty list.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status { status, body }.into());
        }

        let payload: LabelResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        let Some(label) = payload.results.into_iter().next() else {
            return Ok(None);
        };

        tracing::debug!(name, "openFDA label fetched");
        Ok(Some(RawDrugRecord {
            name: label.openfda.brand_name.into_iter().next(),
            category: label.openfda.product_type.into_iter().next(),
            indications: label.indications_and_usage,
            warnings: label.warnings,
            mechanism_of_action: label.clinical_pharmacology,
            dosage: label.dosage_and_administration,
            contraindications: label.contraindications,
        }))
    }
}
