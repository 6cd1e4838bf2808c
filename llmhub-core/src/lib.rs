//! # LLMhub Core
//!
//! Model identity resolution for LLM catalogs.
//! Normalizes model names from different providers, matches records across
//! catalogs, collapses releases into stable series, and ranks candidates by
//! weighted scores.

pub mod alias;
pub mod config;
pub mod core_key;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod provider;
pub mod ranking;
pub mod record;
pub mod series;

// Re-export commonly used types at the crate root.
pub use alias::{build_aliases, id_variants};
pub use config::{HubConfig, LeftOrder, MatchConfig, NormalizerConfig, SeriesConfig, load_config};
pub use core_key::{core_key, remove_release_noise};
pub use error::{ConfigError, LlmhubError, RankingError, RegistryError, Result};
pub use matcher::{
    AliasIndex, Confidence, MatchOutcome, MatchPair, MatchReason, Matcher, MergedRow,
    ScoreBreakdown,
};
pub use normalize::{Normalizer, normalize, strip_provider_prefix};
pub use provider::{ProviderCatalog, ReasoningType};
pub use ranking::{Candidate, Dimension, Ranking, RankingPayload, Weights, rank_payload};
pub use record::{NormalizedRecord, RawRecord, collapse_duplicates, parse_records};
pub use series::{
    Modality, Resolution, ResolutionKind, SeriesCanonicalizer, SeriesName, SeriesRegistry,
    canonical_series, make_slug, plan_series_sync,
};
