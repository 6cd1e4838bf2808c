//! Series canonicalization: collapsing every release of a model line into one
//! stable family label and slug.
//!
//! A display name goes through a fixed cleaning pipeline (effort modes, date
//! stamps, parameter sizes, trailing qualifiers), then through the ordered
//! family table in [`rules`]. Image, video and speech models additionally pass
//! through the product table in [`media`] and lose trailing marketing words.
//! A name no rule recognizes comes back cleaned but otherwise unchanged.

pub mod media;
pub mod registry;
pub mod rules;
pub mod sync;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::config::SeriesConfig;
use crate::normalize::static_regex;
use crate::provider::ProviderCatalog;

pub use media::trim_tail_noise;
pub use registry::{Resolution, ResolutionKind, SeriesName, SeriesRegistry};
pub use rules::extract_version_token;
pub use sync::{SeriesAssignment, SeriesRecord, SyncPlan, plan_series_sync};

static EFFORT_PARENS: LazyLock<Regex> = LazyLock::new(|| {
    static_regex(
        r"(?i)\s*\((Non-reasoning|Reasoning|Adaptive Reasoning|high|low|medium|minimal|xhigh|ChatGPT|experimental|preview|high effort|low effort)\)",
    )
});
static MONTH_PARENS: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"\s*\([A-Za-z]{3,9}\s*'?\s*\d{2}\)"));
static YEAR_PARENS: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\s*\(\d{4}\)"));
static DUAL_SIZE: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"\s+\d+(\.\d+)?[Bb]\s+[Aa]\d+(\.\d+)?[Bb]"));
static ACTIVE_SIZE: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\s+[Aa]\d+(\.\d+)?[Bb]"));
static TOTAL_SIZE: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\s+\d+(\.\d+)?[Bb]"));
static TRAILING_QUALIFIER: LazyLock<Regex> = LazyLock::new(|| {
    static_regex(r"(?i)\s+(Instruct|Preview|Experimental|Thinking|Exp|Speciale)\s*$")
});
static TRAILING_DATE: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\s+\d{4}\s*$"));
static DASH: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\s*-\s*"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\s+"));

/// The kind of output a model produces. Series of different modalities never share a slug.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Modality {
    #[default]
    Llm,
    TextToImage,
    ImageEditing,
    TextToSpeech,
    TextToVideo,
    ImageToVideo,
    Other(String),
}

impl Modality {
    pub fn as_str(&self) -> &str {
        match self {
            Modality::Llm => "llm",
            Modality::TextToImage => "text_to_image",
            Modality::ImageEditing => "image_editing",
            Modality::TextToSpeech => "text_to_speech",
            Modality::TextToVideo => "text_to_video",
            Modality::ImageToVideo => "image_to_video",
            Modality::Other(name) => name,
        }
    }

    pub fn is_llm(&self) -> bool {
        matches!(self, Modality::Llm)
    }
}

impl From<&str> for Modality {
    fn from(value: &str) -> Self {
        let key = value.trim().to_lowercase().replace('-', "_");
        match key.as_str() {
            "" | "llm" => Modality::Llm,
            "text_to_image" => Modality::TextToImage,
            "image_editing" => Modality::ImageEditing,
            "text_to_speech" => Modality::TextToSpeech,
            "text_to_video" => Modality::TextToVideo,
            "image_to_video" => Modality::ImageToVideo,
            _ => Modality::Other(key),
        }
    }
}

impl From<String> for Modality {
    fn from(value: String) -> Self {
        Modality::from(value.as_str())
    }
}

impl From<Modality> for String {
    fn from(value: Modality) -> Self {
        value.as_str().to_string()
    }
}

impl std::str::FromStr for Modality {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Modality::from(s))
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn collapse_spaces(text: &str) -> String {
    SPACES.replace_all(text, " ").trim().to_string()
}

/// Capitalize the first letter of every alphabetic run and lowercase the rest.
pub(crate) fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Strip effort modes, date stamps, parameter sizes and trailing qualifiers.
fn clean_display_name(name: &str) -> String {
    let s = EFFORT_PARENS.replace_all(name, "");
    let s = MONTH_PARENS.replace_all(&s, "");
    let s = YEAR_PARENS.replace_all(&s, "");
    let s = DUAL_SIZE.replace_all(&s, "");
    let s = ACTIVE_SIZE.replace_all(&s, "");
    let s = TOTAL_SIZE.replace_all(&s, "");
    let s = TRAILING_QUALIFIER.replace(&s, "");
    let s = TRAILING_DATE.replace(&s, "");
    let s = DASH.replace_all(&s, " ");
    collapse_spaces(&s)
}

/// Canonical series label of a model display name.
pub fn canonical_series(display_name: &str, modality: &Modality) -> String {
    let cleaned = clean_display_name(display_name);
    let family = rules::canonicalize_by_family(&cleaned, !modality.is_llm());
    if modality.is_llm() {
        family
    } else {
        trim_tail_noise(&media::canonicalize_media(&family))
    }
}

/// Lowercase, runs outside `[a-z0-9.]` become one `-`, boundary `-` trimmed.
pub fn make_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Slug of a series within its modality: LLM slugs are bare, others are
/// prefixed with `"{modality}--"`.
pub fn series_slug(modality: &Modality, series_name: &str) -> String {
    let base = make_slug(series_name);
    if modality.is_llm() {
        base
    } else {
        format!("{modality}--{base}")
    }
}

/// Lookup key of the series registry: lowercase ASCII letters and digits only.
pub fn normalize_for_match(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Derives series labels and new series entries from model names.
#[derive(Debug, Clone, Default)]
pub struct SeriesCanonicalizer {
    catalog: ProviderCatalog,
}

impl SeriesCanonicalizer {
    pub fn new(catalog: ProviderCatalog) -> Self {
        Self { catalog }
    }

    pub fn from_config(config: &SeriesConfig) -> Self {
        Self::new(ProviderCatalog::from_config(config))
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    pub fn canonical_series(&self, display_name: &str, modality: &Modality) -> String {
        canonical_series(display_name, modality)
    }

    /// A fresh series entry for a model name, or `None` when the name
    /// canonicalizes to nothing usable.
    pub fn series_for(&self, display_name: &str, modality: &Modality) -> Option<SeriesName> {
        let label = self.canonical_series(display_name, modality);
        let slug = series_slug(modality, &label);
        if label.is_empty() || make_slug(&label).is_empty() {
            return None;
        }
        Some(SeriesName {
            provider: self.catalog.infer_provider(&label).map(str::to_string),
            slug,
            display_name: label,
            query_aliases: Vec::new(),
        })
    }
}
