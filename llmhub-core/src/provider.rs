//! Provider attribution for series and catalog records.

use serde::Serialize;

use crate::config::{ProviderPrefix, SeriesConfig};

/// Reasoning mode advertised by a model name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningType {
    NonReasoning,
    Reasoning,
    Unknown,
}

impl ReasoningType {
    /// Read the mode from name markers like `(Non-reasoning)` or `Thinking`.
    pub fn infer(name: &str) -> Self {
        let lowered = name.to_lowercase();
        if lowered.contains("non-reasoning") || lowered.contains("non reasoning") {
            ReasoningType::NonReasoning
        } else if lowered.contains("reasoning") || lowered.contains("think") {
            ReasoningType::Reasoning
        } else {
            ReasoningType::Unknown
        }
    }
}

impl std::fmt::Display for ReasoningType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReasoningType::NonReasoning => write!(f, "non_reasoning"),
            ReasoningType::Reasoning => write!(f, "reasoning"),
            ReasoningType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Prefix and keyword tables used to attribute series to providers.
#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    prefixes: Vec<ProviderPrefix>,
    regional: Vec<String>,
}

impl Default for ProviderCatalog {
    fn default() -> Self {
        Self::from_config(&SeriesConfig::default())
    }
}

impl ProviderCatalog {
    pub fn from_config(config: &SeriesConfig) -> Self {
        Self {
            prefixes: config
                .provider_prefixes
                .iter()
                .map(|p| ProviderPrefix::new(p.prefix.to_lowercase(), p.provider.clone()))
                .collect(),
            regional: config
                .regional_providers
                .iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Provider of a series, from the first table prefix the name starts with.
    pub fn infer_provider(&self, series_name: &str) -> Option<&str> {
        let lowered = series_name.to_lowercase();
        self.prefixes
            .iter()
            .find(|p| !p.prefix.is_empty() && lowered.starts_with(&p.prefix))
            .map(|p| p.provider.as_str())
    }

    /// Whether a creator name contains one of the regional-provider keywords.
    pub fn is_regional_provider(&self, creator: &str) -> bool {
        let lowered = creator.to_lowercase();
        !lowered.is_empty() && self.regional.iter().any(|k| lowered.contains(k.as_str()))
    }
}
