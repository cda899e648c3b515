//! Configuration module.

mod settings;

pub use settings::{
    Config, ReasoningBackend, ReasoningConfig, ServerConfig, SourceConfig, StoreConfig,
};
