//! External drug source module.
//!
//! The source is the authoritative upstream a cache miss falls back to.
//! Its transport failures are transient by contract: they surface to the
//! caller and are never written to the store as negative results.

mod openfda;

pub use openfda::OpenFdaSource;

use async_trait::async_trait;

use crate::config::SourceConfig;
use crate::error::Result;

/// Raw attributes for a drug as reported by the external source.
///
/// Every field is optional upstream; mapping into a [`crate::model::Drug`]
/// substitutes empty strings and empty sequences, never nulls.
#[derive(Debug, Clone, Default)]
pub struct RawDrugRecord {
    pub name: Option<String>,
    pub category: Option<String>,
    pub indications: Vec<String>,
    pub warnings: Vec<String>,
    pub mechanism_of_action: Vec<String>,
    pub dosage: Vec<String>,
    pub contraindications: Vec<String>,
}

/// Trait for external drug sources.
#[async_trait]
pub trait DrugSource: Send + Sync {
    /// Look up a drug by normalized name. `Ok(None)` means the source has
    /// no record; an `Err` is a transient transport failure.
    async fn lookup(&self, name: &str) -> Result<Option<RawDrugRecord>>;
}

/// Create a drug source from configuration.
pub fn create_source(config: &SourceConfig) -> Result<Box<dyn DrugSource>> {
    Ok(Box::new(OpenFdaSource::from_config(config)?))
}
