use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ProximaError, Result};
use crate::key::TERM_FREQUENCY_FAMILY;

/// How candidate documents are aggregated from index records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// One record per document; every occurrence belongs to the document uid.
    #[default]
    Event,
    /// A root record plus `.`-suffixed child records.
    TopLevelDocument,
}

/// Which functions are treated as proximity functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionConfig {
    /// Namespace the proximity functions live in.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Identifier standing in for an omitted field argument.
    #[serde(default = "default_offset_placeholder")]
    pub offset_placeholder: String,
}

fn default_namespace() -> String {
    "content".to_string()
}

fn default_offset_placeholder() -> String {
    "termOffsetMap".to_string()
}

fn default_term_frequency_family() -> String {
    TERM_FREQUENCY_FAMILY.to_string()
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            offset_placeholder: default_offset_placeholder(),
        }
    }
}

/// Configuration for the search space engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub aggregation: AggregationMode,
    /// Column family holding term-frequency entries.
    #[serde(default = "default_term_frequency_family")]
    pub term_frequency_family: String,
    #[serde(default)]
    pub functions: FunctionConfig,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            aggregation: AggregationMode::default(),
            term_frequency_family: default_term_frequency_family(),
            functions: FunctionConfig::default(),
        }
    }

    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Load a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.term_frequency_family.is_empty() {
            return Err(ProximaError::invalid_config("term_frequency_family must not be empty"));
        }
        if self.functions.namespace.is_empty() {
            return Err(ProximaError::invalid_config("functions.namespace must not be empty"));
        }
        Ok(())
    }

    pub fn is_top_level_document(&self) -> bool {
        self.aggregation == AggregationMode::TopLevelDocument
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn aggregation(mut self, mode: AggregationMode) -> Self {
        self.config.aggregation = mode;
        self
    }

    pub fn top_level_document(self) -> Self {
        self.aggregation(AggregationMode::TopLevelDocument)
    }

    pub fn term_frequency_family(mut self, family: impl Into<String>) -> Self {
        self.config.term_frequency_family = family.into();
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.functions.namespace = namespace.into();
        self
    }

    pub fn offset_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.config.functions.offset_placeholder = placeholder.into();
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}
