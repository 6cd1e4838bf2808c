//! Configuration system for LLMhub.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.
//! Configuration is loaded from `~/.config/llmhub/config.toml` and/or `.llmhub/config.toml`
//! in the workspace directory.
//!
//! Every table the engine consults (synonyms, query overrides, provider prefixes) lives
//! here and is handed to the engine components at construction time.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ConfigError;
use crate::ranking::Weights;

/// Top-level configuration for LLMhub.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HubConfig {
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    #[serde(default)]
    pub matching: MatchConfig,
    #[serde(default)]
    pub series: SeriesConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
}

impl HubConfig {
    /// Check the numeric ranges and tables that the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.normalizer.validate()?;
        self.matching.validate()?;
        self.series.validate()
    }
}

/// A literal rewrite applied to already-normalized names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synonym {
    pub from: String,
    pub to: String,
}

impl Synonym {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Name normalizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Ordered synonym rewrites. Both sides use the normalized alphabet `[a-z0-9-/]`
    /// and every rewrite must shorten the text.
    #[serde(default = "default_synonyms")]
    pub synonyms: Vec<Synonym>,
    /// Longest vendor label stripped from `"<vendor>: <model>"` display names.
    #[serde(default = "default_prefix_max_len")]
    pub provider_prefix_max_len: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            synonyms: default_synonyms(),
            provider_prefix_max_len: default_prefix_max_len(),
        }
    }
}

impl NormalizerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider_prefix_max_len == 0 {
            return Err(ConfigError::Invalid {
                message: "normalizer.provider_prefix_max_len must be > 0".into(),
            });
        }
        for synonym in &self.synonyms {
            if !is_normalized_alphabet(&synonym.from) || !is_normalized_alphabet(&synonym.to) {
                return Err(ConfigError::Invalid {
                    message: format!(
                        "normalizer.synonyms entry '{}' -> '{}' must use only [a-z0-9-/]",
                        synonym.from, synonym.to
                    ),
                });
            }
            if synonym.to.is_empty() || synonym.to.len() >= synonym.from.len() {
                return Err(ConfigError::Invalid {
                    message: format!(
                        "normalizer.synonyms entry '{}' -> '{}' must map to a shorter, non-empty key",
                        synonym.from, synonym.to
                    ),
                });
            }
        }
        Ok(())
    }
}

pub(crate) fn is_normalized_alphabet(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '/')
        && !text.starts_with(['-', '/'])
        && !text.ends_with(['-', '/'])
}

fn default_synonyms() -> Vec<Synonym> {
    vec![
        Synonym::new("gpt-4-omni", "gpt4o"),
        Synonym::new("gpt-4o", "gpt4o"),
        Synonym::new("claude-3-opus-20240229", "claude-3-opus"),
        Synonym::new("claude-3-sonnet-20240229", "claude-3-sonnet"),
        Synonym::new("claude-3-haiku-20240307", "claude-3-haiku"),
    ]
}

fn default_prefix_max_len() -> usize {
    40
}

/// Order in which left-side records claim right-side partners.
///
/// Matching is greedy: earlier left records win contested right records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeftOrder {
    /// Input order, lowest index first.
    #[default]
    Input,
    /// Ascending primary key, ties by input index.
    PrimaryKey,
}

impl std::fmt::Display for LeftOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeftOrder::Input => write!(f, "input"),
            LeftOrder::PrimaryKey => write!(f, "primary_key"),
        }
    }
}

impl std::str::FromStr for LeftOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "input" => Ok(LeftOrder::Input),
            "primary_key" => Ok(LeftOrder::PrimaryKey),
            other => Err(ConfigError::Invalid {
                message: format!("unknown left order '{other}' (expected input or primary-key)"),
            }),
        }
    }
}

/// Candidate matcher configuration.
///
/// The two similarity thresholds were hand-tuned and have not been calibrated
/// against a labeled set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Minimum token-set Jaccard similarity of two core keys for the +4 bonus.
    #[serde(default = "default_jaccard_threshold")]
    pub jaccard_threshold: f64,
    /// Minimum character similarity ratio of two core keys for the +3 bonus.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// Scores at or above this are `high` confidence.
    #[serde(default = "default_high_confidence")]
    pub high_confidence: u32,
    /// Scores at or above this are `medium` confidence.
    #[serde(default = "default_medium_confidence")]
    pub medium_confidence: u32,
    /// Left-side iteration order for greedy assignment.
    #[serde(default)]
    pub left_order: LeftOrder,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            jaccard_threshold: default_jaccard_threshold(),
            similarity_threshold: default_similarity_threshold(),
            high_confidence: default_high_confidence(),
            medium_confidence: default_medium_confidence(),
            left_order: LeftOrder::default(),
        }
    }
}

impl MatchConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_unit_interval("matching.jaccard_threshold", self.jaccard_threshold)?;
        check_unit_interval("matching.similarity_threshold", self.similarity_threshold)?;
        if self.medium_confidence > self.high_confidence {
            return Err(ConfigError::Invalid {
                message: format!(
                    "matching.medium_confidence ({}) must not exceed matching.high_confidence ({})",
                    self.medium_confidence, self.high_confidence
                ),
            });
        }
        Ok(())
    }
}

fn default_jaccard_threshold() -> f64 {
    0.8
}

fn default_similarity_threshold() -> f64 {
    0.92
}

fn default_high_confidence() -> u32 {
    10
}

fn default_medium_confidence() -> u32 {
    4
}

/// Maps a lowercase series-name prefix to the provider that publishes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderPrefix {
    pub prefix: String,
    pub provider: String,
}

impl ProviderPrefix {
    pub fn new(prefix: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            provider: provider.into(),
        }
    }
}

/// Series canonicalizer and registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Minimum similarity ratio for a fuzzy registry hit.
    #[serde(default = "default_fuzzy_cutoff")]
    pub fuzzy_cutoff: f64,
    /// Raw queries (case-insensitive) that resolve straight to a slug.
    #[serde(default = "default_query_overrides")]
    pub query_overrides: BTreeMap<String, String>,
    /// Ordered prefix table used to infer a series' provider.
    #[serde(default = "default_provider_prefixes")]
    pub provider_prefixes: Vec<ProviderPrefix>,
    /// Creator-name keywords that mark a regional (mainland China) provider.
    #[serde(default = "default_regional_providers")]
    pub regional_providers: Vec<String>,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            fuzzy_cutoff: default_fuzzy_cutoff(),
            query_overrides: default_query_overrides(),
            provider_prefixes: default_provider_prefixes(),
            regional_providers: default_regional_providers(),
        }
    }
}

impl SeriesConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_unit_interval("series.fuzzy_cutoff", self.fuzzy_cutoff)?;
        if let Some((query, _)) = self
            .query_overrides
            .iter()
            .find(|(query, slug)| query.trim().is_empty() || slug.trim().is_empty())
        {
            return Err(ConfigError::Invalid {
                message: format!("series.query_overrides entry '{query}' is empty"),
            });
        }
        Ok(())
    }
}

fn default_fuzzy_cutoff() -> f64 {
    0.80
}

fn default_query_overrides() -> BTreeMap<String, String> {
    [
        ("glm5", "glm-5"),
        ("glm4.7", "glm-4.7"),
        ("kimi2.5", "kimi-k2.5"),
        ("kimi 2.5", "kimi-k2.5"),
        ("minimax2.5", "minimax-m2.5"),
        ("minimax2.1", "minimax-m2.1"),
        ("mimo v2", "mimo-v2-flash"),
        ("seed 2.0", "doubao-2.0"),
        ("seed2.0", "doubao-2.0"),
        ("step3", "step3-vl"),
    ]
    .into_iter()
    .map(|(q, s)| (q.to_string(), s.to_string()))
    .collect()
}

fn default_provider_prefixes() -> Vec<ProviderPrefix> {
    [
        ("qwen", "alibaba"),
        ("glm", "zhipu"),
        ("kimi", "moonshot"),
        ("minimax", "minimax"),
        ("gemini", "google"),
        ("gemma", "google"),
        ("claude", "anthropic"),
        ("gpt", "openai"),
        ("o1", "openai"),
        ("o3", "openai"),
        ("o4", "openai"),
        ("o5", "openai"),
        ("deepseek", "deepseek"),
        ("llama", "meta"),
        ("mistral", "mistral"),
        ("grok", "xai"),
        ("doubao", "bytedance"),
        ("ernie", "baidu"),
    ]
    .into_iter()
    .map(|(prefix, provider)| ProviderPrefix::new(prefix, provider))
    .collect()
}

fn default_regional_providers() -> Vec<String> {
    [
        "deepseek", "alibaba", "baidu", "bytedance", "zhipu", "moonshot", "minimax", "tencent",
        "01ai", "kimi", "z ai", "xiaomi", "seed", "vidu", "klingai", "pixverse", "stepfun",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Candidate ranking configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Weights used when a ranking payload carries none.
    #[serde(default)]
    pub default_weights: Weights,
}

fn check_unit_interval(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Invalid {
            message: format!("{field} must be in [0, 1], got {value}"),
        });
    }
    Ok(())
}

/// Load configuration from all sources with layered merging.
///
/// Order of precedence (highest to lowest):
/// 1. Explicit overrides (from CLI args)
/// 2. Environment variables (prefixed with `LLMHUB_`)
/// 3. Workspace config (`.llmhub/config.toml`)
/// 4. User config (`~/.config/llmhub/config.toml`)
/// 5. Defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&HubConfig>,
) -> Result<HubConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(HubConfig::default()));

    // User-level config
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "llmhub", "llmhub") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = ws.join(".llmhub").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // Environment variables (LLMHUB_MATCHING__JACCARD_THRESHOLD, LLMHUB_SERIES__FUZZY_CUTOFF, etc.)
    figment = figment.merge(Env::prefixed("LLMHUB_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}
