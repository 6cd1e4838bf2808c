//! Error types for the LLMhub core library.
//!
//! Uses `thiserror` for public API error types. Name-level defects in catalog
//! records are never errors: they degrade to empty keys and unmatched rows.
//! Errors here cover configuration, the ranking utilities, and malformed
//! persisted series tables.

/// Top-level error type for the LLMhub core library.
#[derive(Debug, thiserror::Error)]
pub enum LlmhubError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ranking error: {0}")]
    Ranking(#[from] RankingError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Errors from the weighted candidate ranking utilities.
#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    #[error("Weight total must be > 0, got {total}")]
    InvalidWeightTotal { total: f64 },

    #[error("Weight for dimension '{dimension}' must be a finite non-negative number, got {value}")]
    InvalidWeight { dimension: String, value: f64 },

    #[error(
        "Invalid score for '{candidate}', dimension '{dimension}': {value}. Each score must be in [0, 10]."
    )]
    ScoreOutOfRange {
        candidate: String,
        dimension: String,
        value: f64,
    },

    #[error("Input must include a non-empty candidate list")]
    NoCandidates,

    #[error("Each candidate must include a non-empty name (index {index})")]
    MissingName { index: usize },
}

/// Errors from loading a persisted series table.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Series at position {position} has an empty slug")]
    EmptySlug { position: usize },

    #[error("Duplicate series slug in persisted table: {slug}")]
    DuplicateSlug { slug: String },
}

/// A type alias for results using the top-level `LlmhubError`.
pub type Result<T> = std::result::Result<T, LlmhubError>;
