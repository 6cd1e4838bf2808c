//! Series registry: the lookup / auto-create state machine over known series.
//!
//! A raw query resolves through, in order: the override table, an exact hit
//! on the lookup index, the best fuzzy hit at or above the cutoff, and finally
//! creation of a new series. Series are never removed or renamed here; the
//! only mutations are inserting series and appending query aliases.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use crate::config::SeriesConfig;
use crate::error::RegistryError;
use crate::matcher::similarity_ratio_of;

use super::{Modality, SeriesCanonicalizer, make_slug, normalize_for_match};

/// A canonical model family. The slug is its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesName {
    pub slug: String,
    pub display_name: String,
    #[serde(default)]
    pub provider: Option<String>,
    /// Raw query strings known to mean this series. Append-only.
    #[serde(default)]
    pub query_aliases: Vec<String>,
}

/// How a query reached its series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    Override,
    Exact,
    Fuzzy,
    Created,
}

impl std::fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionKind::Override => write!(f, "override"),
            ResolutionKind::Exact => write!(f, "exact"),
            ResolutionKind::Fuzzy => write!(f, "fuzzy"),
            ResolutionKind::Created => write!(f, "created"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub slug: String,
    pub kind: ResolutionKind,
}

/// In-memory series table with its lookup index.
///
/// Lookup keys are [`normalize_for_match`] forms of each series' display name,
/// its canonical name, and every query alias with its canonical form. The first
/// series to claim a key keeps it.
#[derive(Debug, Clone)]
pub struct SeriesRegistry {
    series: Vec<SeriesName>,
    by_slug: HashMap<String, usize>,
    lookup: BTreeMap<String, usize>,
    overrides: BTreeMap<String, String>,
    fuzzy_cutoff: f64,
    canonicalizer: SeriesCanonicalizer,
}

impl Default for SeriesRegistry {
    fn default() -> Self {
        Self::new(&SeriesConfig::default())
    }
}

impl SeriesRegistry {
    pub fn new(config: &SeriesConfig) -> Self {
        Self {
            series: Vec::new(),
            by_slug: HashMap::new(),
            lookup: BTreeMap::new(),
            overrides: config
                .query_overrides
                .iter()
                .map(|(query, slug)| (query.trim().to_lowercase(), slug.trim().to_string()))
                .collect(),
            fuzzy_cutoff: config.fuzzy_cutoff,
            canonicalizer: SeriesCanonicalizer::from_config(config),
        }
    }

    /// Load a persisted table. Empty or repeated slugs mean the table is corrupt.
    pub fn from_series(
        config: &SeriesConfig,
        series: Vec<SeriesName>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new(config);
        for (position, entry) in series.into_iter().enumerate() {
            if entry.slug.trim().is_empty() {
                return Err(RegistryError::EmptySlug { position });
            }
            let slug = entry.slug.clone();
            if !registry.insert(entry) {
                return Err(RegistryError::DuplicateSlug { slug });
            }
        }
        debug!(
            series = registry.len(),
            keys = registry.lookup.len(),
            "Loaded series registry"
        );
        Ok(registry)
    }

    /// Load a persisted table from its JSON form, an array of series.
    pub fn from_json(config: &SeriesConfig, json: &str) -> crate::Result<Self> {
        let series: Vec<SeriesName> = serde_json::from_str(json)?;
        Self::from_series(config, series).map_err(Into::into)
    }

    /// JSON form of the table, in insertion order.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(&self.series)?)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn series(&self) -> &[SeriesName] {
        &self.series
    }

    pub fn into_series(self) -> Vec<SeriesName> {
        self.series
    }

    pub fn get(&self, slug: &str) -> Option<&SeriesName> {
        self.by_slug.get(slug).map(|&i| &self.series[i])
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.by_slug.contains_key(slug)
    }

    pub fn canonicalizer(&self) -> &SeriesCanonicalizer {
        &self.canonicalizer
    }

    /// Insert a series unless its slug is already taken. Returns whether it was inserted.
    pub fn insert(&mut self, series: SeriesName) -> bool {
        if self.by_slug.contains_key(&series.slug) {
            debug!(slug = %series.slug, "Series already registered");
            return false;
        }
        let index = self.series.len();
        self.by_slug.insert(series.slug.clone(), index);
        self.index_name(&series.display_name, index);
        for alias in &series.query_aliases {
            self.index_name(alias, index);
        }
        self.series.push(series);
        true
    }

    fn index_name(&mut self, name: &str, index: usize) {
        let canonical = self.canonicalizer.canonical_series(name, &Modality::Llm);
        for form in [name, canonical.as_str()] {
            let key = normalize_for_match(form);
            if !key.is_empty() {
                self.lookup.entry(key).or_insert(index);
            }
        }
    }

    fn add_query_alias(&mut self, index: usize, query: &str) {
        let query = query.trim();
        if query.is_empty() || self.series[index].query_aliases.iter().any(|a| a == query) {
            return;
        }
        self.series[index].query_aliases.push(query.to_string());
        self.index_name(query, index);
    }

    fn resolve_override(&self, query: &str) -> Option<usize> {
        let slug = self.overrides.get(&query.trim().to_lowercase())?;
        match self.by_slug.get(slug) {
            Some(&index) => Some(index),
            None => {
                warn!(query, slug = %slug, "Override slug not in registry, skipping override");
                None
            }
        }
    }

    fn query_key(&self, query: &str) -> String {
        let canonical = self.canonicalizer.canonical_series(query, &Modality::Llm);
        normalize_for_match(if canonical.is_empty() { query } else { &canonical })
    }

    fn best_fuzzy(&self, key: &str) -> Option<usize> {
        let mut best: Option<(f64, usize)> = None;
        for (candidate, &index) in &self.lookup {
            let ratio = similarity_ratio_of(key, candidate);
            if ratio >= self.fuzzy_cutoff && best.is_none_or(|(r, _)| ratio > r) {
                best = Some((ratio, index));
            }
        }
        best.map(|(_, index)| index)
    }

    fn find_index(&self, query: &str) -> Option<(usize, ResolutionKind)> {
        if let Some(index) = self.resolve_override(query) {
            return Some((index, ResolutionKind::Override));
        }
        let key = self.query_key(query);
        if key.is_empty() {
            return None;
        }
        if let Some(&index) = self.lookup.get(&key) {
            return Some((index, ResolutionKind::Exact));
        }
        self.best_fuzzy(&key).map(|index| (index, ResolutionKind::Fuzzy))
    }

    /// Resolve a query against known series without changing the registry.
    pub fn find(&self, query: &str) -> Option<Resolution> {
        self.find_index(query).map(|(index, kind)| Resolution {
            slug: self.series[index].slug.clone(),
            kind,
        })
    }

    /// Resolve a query, creating a series when nothing known matches.
    ///
    /// Exact and fuzzy hits record the query as an alias of the series they
    /// hit, so the same query resolves to the same series for the rest of the
    /// registry's life. Returns `None` only for queries with no usable text.
    pub fn resolve(&mut self, query: &str) -> Option<Resolution> {
        if let Some((index, kind)) = self.find_index(query) {
            if kind != ResolutionKind::Override {
                self.add_query_alias(index, query);
            }
            let slug = self.series[index].slug.clone();
            debug!(query, slug = %slug, kind = %kind, "Resolved series query");
            return Some(Resolution { slug, kind });
        }

        let canonical = self.canonicalizer.canonical_series(query, &Modality::Llm);
        let name = if canonical.is_empty() { query.trim() } else { canonical.as_str() };
        let slug = make_slug(name);
        if slug.is_empty() {
            return None;
        }

        if let Some(&index) = self.by_slug.get(&slug) {
            self.add_query_alias(index, query);
            return Some(Resolution {
                slug,
                kind: ResolutionKind::Exact,
            });
        }

        let series = SeriesName {
            slug: slug.clone(),
            display_name: name.to_string(),
            provider: self
                .canonicalizer
                .catalog()
                .infer_provider(name)
                .map(str::to_string),
            query_aliases: vec![query.trim().to_string()],
        };
        info!(query, slug = %slug, display_name = %series.display_name, "Creating series");
        self.insert(series);
        Some(Resolution {
            slug,
            kind: ResolutionKind::Created,
        })
    }
}
