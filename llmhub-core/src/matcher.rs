//! Candidate matcher: one-to-one assignment of records across two catalogs.
//!
//! The right side is indexed by alias and by core key. Each left record, in the
//! configured order, gathers its overlapping right records, scores them, and
//! claims the best one that no earlier left record has claimed. Assignment is
//! greedy: an earlier left record keeps a contested partner even when a later
//! one would have scored higher.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

use crate::config::{HubConfig, LeftOrder, MatchConfig};
use crate::normalize::Normalizer;
use crate::record::{NormalizedRecord, RawRecord, collapse_duplicates};

const SHARED_ALIAS_WEIGHT: u32 = 1;
const PRIMARY_KEY_BONUS: u32 = 5;
const DISPLAY_NAME_BONUS: u32 = 2;
const CORE_KEY_BONUS: u32 = 8;
const TOKEN_JACCARD_BONUS: u32 = 4;
const SIMILARITY_RATIO_BONUS: u32 = 3;

/// Why a pair was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    CoreKeyExact,
    AliasOverlap,
    Fuzzy,
}

impl std::fmt::Display for MatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchReason::CoreKeyExact => write!(f, "core_key_exact"),
            MatchReason::AliasOverlap => write!(f, "alias_overlap"),
            MatchReason::Fuzzy => write!(f, "fuzzy"),
        }
    }
}

/// Coarse quality bucket of a match score. Unmatched rows are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    None,
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::None => write!(f, "none"),
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// Every term that contributed to a pair score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub total: u32,
    /// Intersection of the two alias sets, ascending.
    pub shared_aliases: Vec<String>,
    pub primary_key_equal: bool,
    pub display_name_equal: bool,
    pub core_key_equal: bool,
    /// Token-set Jaccard of the core keys, computed only when they differ.
    pub token_jaccard: Option<f64>,
    /// Character similarity ratio of the core keys, computed only when they differ.
    pub similarity_ratio: Option<f64>,
}

impl ScoreBreakdown {
    pub fn reason(&self) -> MatchReason {
        if self.core_key_equal {
            MatchReason::CoreKeyExact
        } else if !self.shared_aliases.is_empty() {
            MatchReason::AliasOverlap
        } else {
            MatchReason::Fuzzy
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchPair {
    pub left_index: usize,
    pub right_index: usize,
    pub score: u32,
    /// Smallest shared alias, or `""` when the pair shares none.
    pub shared_alias: String,
    pub reason: MatchReason,
    pub confidence: Confidence,
}

/// Result of one matching run, expressed as indices into the two inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchOutcome {
    /// Pairs in left iteration order.
    pub pairs: Vec<MatchPair>,
    /// Ascending.
    pub unmatched_left: Vec<usize>,
    /// Ascending.
    pub unmatched_right: Vec<usize>,
}

/// One output row: a matched pair or a singleton from either side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRow {
    pub merge_key: String,
    pub left: Option<NormalizedRecord>,
    pub right: Option<NormalizedRecord>,
    pub has_left: bool,
    pub has_right: bool,
    pub match_score: u32,
    pub match_reason: Option<MatchReason>,
    pub match_confidence: Confidence,
}

/// Inverted index over one record set.
#[derive(Debug, Default)]
pub struct AliasIndex {
    by_alias: HashMap<String, BTreeSet<usize>>,
    by_core_key: HashMap<String, BTreeSet<usize>>,
}

impl AliasIndex {
    pub fn build(records: &[NormalizedRecord]) -> Self {
        let mut index = Self::default();
        for (i, record) in records.iter().enumerate() {
            for alias in record.aliases() {
                index.by_alias.entry(alias.clone()).or_default().insert(i);
            }
            if !record.core_key().is_empty() {
                index
                    .by_core_key
                    .entry(record.core_key().to_string())
                    .or_default()
                    .insert(i);
            }
        }
        index
    }

    /// Indexed records overlapping `record` by alias or by core key, ascending.
    pub fn candidates(&self, record: &NormalizedRecord) -> BTreeSet<usize> {
        let mut found = BTreeSet::new();
        for alias in record.aliases() {
            if let Some(hits) = self.by_alias.get(alias) {
                found.extend(hits);
            }
        }
        if !record.core_key().is_empty() {
            if let Some(hits) = self.by_core_key.get(record.core_key()) {
                found.extend(hits);
            }
        }
        found
    }

    /// Quick single-record lookup: the primary key first, then each alias in order.
    ///
    /// Returns the first record registered under the first key that hits.
    pub fn lookup(&self, record: &NormalizedRecord) -> Option<usize> {
        std::iter::once(record.primary_key())
            .chain(record.aliases().iter().map(String::as_str))
            .filter(|key| !key.is_empty())
            .find_map(|key| self.by_alias.get(key).and_then(|hits| hits.first().copied()))
    }
}

/// Scores and assigns records between two catalogs.
#[derive(Debug, Clone)]
pub struct Matcher {
    config: MatchConfig,
    normalizer: Normalizer,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(MatchConfig::default(), Normalizer::default())
    }
}

impl Matcher {
    pub fn new(config: MatchConfig, normalizer: Normalizer) -> Self {
        Self { config, normalizer }
    }

    pub fn from_config(config: &HubConfig) -> Self {
        Self::new(config.matching.clone(), Normalizer::new(&config.normalizer))
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Collapse duplicates and derive keys for one side.
    pub fn prepare(&self, records: Vec<RawRecord>) -> Vec<NormalizedRecord> {
        collapse_duplicates(records, &self.normalizer)
            .into_iter()
            .map(|raw| NormalizedRecord::from_raw(raw, &self.normalizer))
            .collect()
    }

    /// Score a candidate pair. Higher is better; scores are only compared, never thresholded
    /// except for the confidence bucket.
    pub fn score(&self, left: &NormalizedRecord, right: &NormalizedRecord) -> ScoreBreakdown {
        let shared_aliases: Vec<String> =
            left.aliases().intersection(right.aliases()).cloned().collect();
        let mut total = SHARED_ALIAS_WEIGHT * shared_aliases.len() as u32;

        let primary_key_equal =
            !left.primary_key().is_empty() && left.primary_key() == right.primary_key();
        if primary_key_equal {
            total += PRIMARY_KEY_BONUS;
        }

        let left_name = self.normalizer.normalize(&left.raw().display_name);
        let right_name = self
            .normalizer
            .normalize(&self.normalizer.strip_provider_prefix(&right.raw().display_name));
        let display_name_equal = !left_name.is_empty() && left_name == right_name;
        if display_name_equal {
            total += DISPLAY_NAME_BONUS;
        }

        let (left_core, right_core) = (left.core_key(), right.core_key());
        let both_cores = !left_core.is_empty() && !right_core.is_empty();
        let core_key_equal = both_cores && left_core == right_core;
        let mut token_jaccard = None;
        let mut similarity_ratio = None;
        if core_key_equal {
            total += CORE_KEY_BONUS;
        } else if both_cores {
            let jaccard = token_jaccard_similarity(left_core, right_core);
            if jaccard >= self.config.jaccard_threshold {
                total += TOKEN_JACCARD_BONUS;
            }
            let ratio = similarity_ratio_of(left_core, right_core);
            if ratio >= self.config.similarity_threshold {
                total += SIMILARITY_RATIO_BONUS;
            }
            token_jaccard = Some(jaccard);
            similarity_ratio = Some(ratio);
        }

        ScoreBreakdown {
            total,
            shared_aliases,
            primary_key_equal,
            display_name_equal,
            core_key_equal,
            token_jaccard,
            similarity_ratio,
        }
    }

    pub fn confidence(&self, score: u32) -> Confidence {
        if score >= self.config.high_confidence {
            Confidence::High
        } else if score >= self.config.medium_confidence {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    fn left_order(&self, left: &[NormalizedRecord]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..left.len()).collect();
        if self.config.left_order == LeftOrder::PrimaryKey {
            order.sort_by(|&a, &b| {
                left[a]
                    .primary_key()
                    .cmp(left[b].primary_key())
                    .then(a.cmp(&b))
            });
        }
        order
    }

    /// Greedily assign each left record its best unclaimed right record.
    pub fn match_records(
        &self,
        left: &[NormalizedRecord],
        right: &[NormalizedRecord],
    ) -> MatchOutcome {
        let index = AliasIndex::build(right);
        let mut consumed = vec![false; right.len()];
        let mut left_matched = vec![false; left.len()];
        let mut pairs = Vec::new();

        for left_index in self.left_order(left) {
            let record = &left[left_index];
            let mut best: Option<(usize, ScoreBreakdown)> = None;
            for right_index in index.candidates(record) {
                if consumed[right_index] {
                    continue;
                }
                let breakdown = self.score(record, &right[right_index]);
                if best.as_ref().is_none_or(|(_, b)| breakdown.total > b.total) {
                    best = Some((right_index, breakdown));
                }
            }

            let Some((right_index, breakdown)) = best else {
                continue;
            };
            consumed[right_index] = true;
            left_matched[left_index] = true;
            let pair = MatchPair {
                left_index,
                right_index,
                score: breakdown.total,
                shared_alias: breakdown.shared_aliases.first().cloned().unwrap_or_default(),
                reason: breakdown.reason(),
                confidence: self.confidence(breakdown.total),
            };
            debug!(
                left = %record.primary_key(),
                right = %right[right_index].primary_key(),
                score = pair.score,
                reason = %pair.reason,
                "Matched records"
            );
            pairs.push(pair);
        }

        let unmatched_left: Vec<usize> = (0..left.len()).filter(|&i| !left_matched[i]).collect();
        let unmatched_right: Vec<usize> = (0..right.len()).filter(|&i| !consumed[i]).collect();
        info!(
            left = left.len(),
            right = right.len(),
            matched = pairs.len(),
            unmatched_left = unmatched_left.len(),
            unmatched_right = unmatched_right.len(),
            "Matching run complete"
        );

        MatchOutcome {
            pairs,
            unmatched_left,
            unmatched_right,
        }
    }

    /// Match two prepared sides and produce output rows: pairs, then left
    /// singletons, then right singletons.
    pub fn merge(
        &self,
        left: Vec<NormalizedRecord>,
        right: Vec<NormalizedRecord>,
    ) -> Vec<MergedRow> {
        let outcome = self.match_records(&left, &right);
        let mut left: Vec<Option<NormalizedRecord>> = left.into_iter().map(Some).collect();
        let mut right: Vec<Option<NormalizedRecord>> = right.into_iter().map(Some).collect();
        let mut rows = Vec::with_capacity(
            outcome.pairs.len() + outcome.unmatched_left.len() + outcome.unmatched_right.len(),
        );

        for pair in &outcome.pairs {
            let l = left[pair.left_index].take();
            let r = right[pair.right_index].take();
            let merge_key = if pair.shared_alias.is_empty() {
                first_non_empty_key(l.as_ref(), r.as_ref())
            } else {
                pair.shared_alias.clone()
            };
            rows.push(MergedRow {
                merge_key,
                has_left: l.is_some(),
                has_right: r.is_some(),
                left: l,
                right: r,
                match_score: pair.score,
                match_reason: Some(pair.reason),
                match_confidence: pair.confidence,
            });
        }
        for &i in &outcome.unmatched_left {
            rows.push(singleton(left[i].take(), None));
        }
        for &i in &outcome.unmatched_right {
            rows.push(singleton(None, right[i].take()));
        }
        rows
    }

    /// Full pipeline from raw catalogs to merged rows.
    pub fn merge_raw(&self, left: Vec<RawRecord>, right: Vec<RawRecord>) -> Vec<MergedRow> {
        let left = self.prepare(left);
        let right = self.prepare(right);
        self.merge(left, right)
    }
}

fn first_non_empty_key(
    left: Option<&NormalizedRecord>,
    right: Option<&NormalizedRecord>,
) -> String {
    [left, right]
        .into_iter()
        .flatten()
        .map(NormalizedRecord::primary_key)
        .find(|key| !key.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn singleton(left: Option<NormalizedRecord>, right: Option<NormalizedRecord>) -> MergedRow {
    MergedRow {
        merge_key: first_non_empty_key(left.as_ref(), right.as_ref()),
        has_left: left.is_some(),
        has_right: right.is_some(),
        left,
        right,
        match_score: 0,
        match_reason: None,
        match_confidence: Confidence::None,
    }
}

fn key_tokens(key: &str) -> BTreeSet<&str> {
    key.split(['-', '_', '/']).filter(|t| !t.is_empty()).collect()
}

/// Jaccard similarity of the `-`/`_`/`/`-delimited token sets of two keys.
pub fn token_jaccard_similarity(a: &str, b: &str) -> f64 {
    let (ta, tb) = (key_tokens(a), key_tokens(b));
    let union = ta.union(&tb).count();
    if union == 0 {
        return 0.0;
    }
    ta.intersection(&tb).count() as f64 / union as f64
}

/// Character-level similarity ratio `2 * matches / (len(a) + len(b))`.
pub fn similarity_ratio_of(a: &str, b: &str) -> f64 {
    f64::from(similar::TextDiff::from_chars(a, b).ratio())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(id: &str, slug: &str, name: &str) -> NormalizedRecord {
        NormalizedRecord::from_raw(
            RawRecord::new("test", id, name).with_slug(slug),
            &Normalizer::default(),
        )
    }

    #[test]
    fn test_score_gpt4o_example() {
        let matcher = Matcher::default();
        let left = record("", "gpt-4o-2024-08-06", "GPT-4o");
        let right = record("openai/gpt-4o", "", "OpenAI: GPT-4o");
        let breakdown = matcher.score(&left, &right);
        assert_eq!(breakdown.shared_aliases, vec!["gpt4o".to_string()]);
        assert!(!breakdown.primary_key_equal);
        assert!(breakdown.display_name_equal);
        assert!(breakdown.core_key_equal);
        assert_eq!(breakdown.total, 11);
        assert_eq!(breakdown.reason(), MatchReason::CoreKeyExact);
        assert_eq!(matcher.confidence(breakdown.total), Confidence::High);
    }

    #[test]
    fn test_score_token_jaccard_bonus() {
        let matcher = Matcher::default();
        let left = record("", "", "70B Llama");
        let right = record("", "", "Llama 70B");
        let breakdown = matcher.score(&left, &right);
        assert!(breakdown.shared_aliases.is_empty());
        assert_eq!(breakdown.token_jaccard, Some(1.0));
        assert_eq!(breakdown.total, 4);
        assert_eq!(breakdown.reason(), MatchReason::Fuzzy);
        assert_eq!(matcher.confidence(breakdown.total), Confidence::Medium);
    }

    #[test]
    fn test_score_similarity_ratio_bonus() {
        let matcher = Matcher::default();
        let left = record("", "", "Claude 3.5 Sonnet");
        let right = record("", "", "Claude 3.5 Sonnett");
        let breakdown = matcher.score(&left, &right);
        assert!(breakdown.token_jaccard.is_some_and(|j| j < 0.8));
        assert!(breakdown.similarity_ratio.is_some_and(|r| r >= 0.92));
        assert_eq!(breakdown.total, 3);
        assert_eq!(matcher.confidence(breakdown.total), Confidence::Low);
    }

    #[test]
    fn test_score_empty_keys_earn_nothing() {
        let matcher = Matcher::default();
        let empty = record("", "", "");
        let breakdown = matcher.score(&empty, &empty.clone());
        assert_eq!(breakdown.total, 0);
        assert_eq!(breakdown.token_jaccard, None);
    }

    #[test]
    fn test_token_jaccard_similarity() {
        assert_eq!(token_jaccard_similarity("a-b", "b_a"), 1.0);
        assert_eq!(token_jaccard_similarity("a-b", "a-c"), 1.0 / 3.0);
        assert_eq!(token_jaccard_similarity("", ""), 0.0);
    }

    #[test]
    fn test_earlier_left_claims_contested_right() {
        let matcher = Matcher::default();
        let left = vec![
            record("", "", "Mistral Large"),
            record("", "mistral-large", "Mistral Large 2411"),
        ];
        let right = vec![record("mistralai/mistral-large", "", "Mistral: Mistral Large")];
        let outcome = matcher.match_records(&left, &right);
        assert_eq!(outcome.pairs.len(), 1);
        assert_eq!(outcome.pairs[0].left_index, 0);
        assert_eq!(outcome.unmatched_left, vec![1]);
        assert!(outcome.unmatched_right.is_empty());
    }

    #[test]
    fn test_primary_key_order_changes_winner() {
        let config = MatchConfig {
            left_order: LeftOrder::PrimaryKey,
            ..MatchConfig::default()
        };
        let matcher = Matcher::new(config, Normalizer::default());
        let left = vec![
            record("", "mistral-large-latest", "Mistral Large"),
            record("", "mistral-large", "Mistral Large 2411"),
        ];
        let right = vec![record("mistralai/mistral-large", "", "Mistral Large")];
        let outcome = matcher.match_records(&left, &right);
        assert_eq!(outcome.pairs[0].left_index, 1);
        assert_eq!(outcome.unmatched_left, vec![0]);
    }

    #[test]
    fn test_equal_scores_pick_lowest_right_index() {
        let matcher = Matcher::default();
        let left = vec![record("", "", "Model X 3.1")];
        let right = vec![record("a", "", "Model X 3.1"), record("b", "", "Model X 3.1")];
        let outcome = matcher.match_records(&left, &right);
        assert_eq!(outcome.pairs[0].right_index, 0);
        assert_eq!(outcome.unmatched_right, vec![1]);
    }

    #[test]
    fn test_merge_row_order_and_singletons() {
        let matcher = Matcher::default();
        let left = vec![
            record("", "only-left", "Only Left"),
            record("", "gpt-4o", "GPT-4o"),
        ];
        let right = vec![
            record("x/only-right", "", "Only Right"),
            record("openai/gpt-4o", "", "OpenAI: GPT-4o"),
        ];
        let rows = matcher.merge(left, right);
        assert_eq!(rows.len(), 3);

        assert!(rows[0].has_left && rows[0].has_right);
        assert_eq!(rows[0].merge_key, "gpt4o");
        assert_eq!(rows[0].match_confidence, Confidence::High);

        assert!(rows[1].has_left && !rows[1].has_right);
        assert_eq!(rows[1].merge_key, "only-left");
        assert_eq!(rows[1].match_score, 0);
        assert_eq!(rows[1].match_reason, None);
        assert_eq!(rows[1].match_confidence, Confidence::None);

        assert!(!rows[2].has_left && rows[2].has_right);
        assert_eq!(rows[2].merge_key, "only-right");
    }

    #[test]
    fn test_merge_raw_collapses_duplicates() {
        let matcher = Matcher::default();
        let left = vec![
            RawRecord::new("aa", "", "GPT-4o").with_slug("gpt-4o"),
            RawRecord::new("aa", "", "GPT 4o").with_slug("GPT-4o"),
        ];
        let right = vec![RawRecord::new("or", "openai/gpt-4o", "OpenAI: GPT-4o")];
        let rows = matcher.merge_raw(left, right);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].has_left && rows[0].has_right);
    }

    #[test]
    fn test_alias_index_lookup_first_registration_wins() {
        let right = vec![
            record("openai/gpt-4o", "", "GPT-4o"),
            record("azure/gpt-4o", "", "GPT-4o"),
        ];
        let index = AliasIndex::build(&right);
        assert_eq!(index.lookup(&record("", "gpt-4o", "")), Some(0));
        assert_eq!(index.lookup(&record("", "", "Unknown Model")), None);
    }

    #[test]
    fn test_confidence_display() {
        assert_eq!(Confidence::High.to_string(), "high");
        assert_eq!(MatchReason::AliasOverlap.to_string(), "alias_overlap");
        assert_eq!(
            serde_json::to_value(MatchReason::CoreKeyExact).unwrap(),
            "core_key_exact"
        );
    }
}
