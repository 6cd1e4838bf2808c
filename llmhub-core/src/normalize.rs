//! Name normalizer: turns provider-specific model names into comparable keys.
//!
//! A key uses only `[a-z0-9-/]`: lowercase, whitespace and underscore runs
//! collapsed to `-`, no leading or trailing `-`/`/`. Known multi-token synonyms
//! (`gpt-4-omni`, `gpt-4o` → `gpt4o`) are rewritten so that different upstream
//! spellings of the same model land on one key.

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

use crate::config::{NormalizerConfig, Synonym, is_normalized_alphabet};

static DEFAULT_NORMALIZER: LazyLock<Normalizer> = LazyLock::new(Normalizer::default);

/// Compile a pattern that is part of the source code.
pub(crate) fn static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

/// Deterministic name → key transform, configured with a synonym table.
#[derive(Debug, Clone)]
pub struct Normalizer {
    synonyms: Vec<Synonym>,
    prefix_max_len: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&NormalizerConfig::default())
    }
}

impl Normalizer {
    /// Build a normalizer from configuration.
    ///
    /// Synonyms outside the key alphabet, or that do not shorten the text, are
    /// dropped so that rewriting always reaches a fixed point.
    pub fn new(config: &NormalizerConfig) -> Self {
        let synonyms = config
            .synonyms
            .iter()
            .filter(|s| {
                let usable = is_normalized_alphabet(&s.from)
                    && is_normalized_alphabet(&s.to)
                    && s.to.len() < s.from.len();
                if !usable {
                    warn!(from = %s.from, to = %s.to, "Ignoring unusable synonym");
                }
                usable
            })
            .cloned()
            .collect();
        Self {
            synonyms,
            prefix_max_len: config.provider_prefix_max_len.max(1),
        }
    }

    /// Normalize a name into a key. Never fails; unusable input yields `""`.
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.trim().to_lowercase();

        let mut filtered = String::with_capacity(lowered.len());
        let mut in_separator = false;
        for c in lowered.chars() {
            if c.is_whitespace() || c == '_' {
                if !in_separator {
                    filtered.push('-');
                }
                in_separator = true;
                continue;
            }
            in_separator = false;
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '/' {
                filtered.push(c);
            }
        }

        let rewritten = self.apply_synonyms(trim_key(&filtered));
        trim_key(&rewritten).to_string()
    }

    /// Remove a leading `"<vendor>: "` label, as in `"Anthropic: Claude 3.5 Haiku"`.
    ///
    /// Only the text before the first colon is considered, and only when it is
    /// between 1 and `provider_prefix_max_len` characters long.
    pub fn strip_provider_prefix(&self, text: &str) -> String {
        if let Some(idx) = text.find(':') {
            let prefix_len = text[..idx].chars().count();
            if (1..=self.prefix_max_len).contains(&prefix_len) {
                return text[idx + 1..].trim().to_string();
            }
        }
        text.trim().to_string()
    }

    /// Apply every synonym until the text stops changing.
    pub(crate) fn apply_synonyms(&self, text: &str) -> String {
        let mut current = text.to_string();
        loop {
            let mut next = current.clone();
            for synonym in &self.synonyms {
                if next.contains(&synonym.from) {
                    next = next.replace(&synonym.from, &synonym.to);
                }
            }
            if next == current {
                return next;
            }
            current = next;
        }
    }
}

pub(crate) fn trim_key(text: &str) -> &str {
    text.trim_matches(|c| c == '-' || c == '/')
}

/// Normalize with the default synonym table.
pub fn normalize(text: &str) -> String {
    DEFAULT_NORMALIZER.normalize(text)
}

/// Strip a vendor label with the default 40-character limit.
pub fn strip_provider_prefix(text: &str) -> String {
    DEFAULT_NORMALIZER.strip_provider_prefix(text)
}

/// The process-wide default normalizer.
pub fn default_normalizer() -> &'static Normalizer {
    &DEFAULT_NORMALIZER
}
