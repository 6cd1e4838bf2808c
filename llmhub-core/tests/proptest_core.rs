//! Property-based tests for core components using proptest.

use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

use llmhub_core::config::SeriesConfig;
use llmhub_core::normalize::Normalizer;
use llmhub_core::series::{Modality, SeriesRegistry, canonical_series, make_slug};
use llmhub_core::{Matcher, RawRecord, core_key, normalize};

const SUFFIXES: &[&str] = &["", " (Preview)", " 2507", "-latest", " (Jan '24)"];
const ANNOTATIONS: &[&str] = &[" (Jan '24)", " (2024-08-06)", " (Preview)", " (beta)"];

const MODEL_NAMES: &[&str] = &[
    "GPT-4o",
    "gpt-4o-mini",
    "OpenAI: GPT-4o",
    "Claude 3.5 Sonnet",
    "claude-3-5-sonnet-20240620",
    "Llama 3.1 70B Instruct",
    "Qwen3 Max",
    "o3-mini (high)",
    "Gemini 2.0 Flash",
    "DeepSeek V3",
    "Mistral Large",
    "",
];

fn model_name() -> impl Strategy<Value = String> {
    (
        prop::sample::select(MODEL_NAMES),
        prop::sample::select(SUFFIXES),
    )
        .prop_map(|(name, suffix)| format!("{name}{suffix}"))
}

fn records(source: &'static str, max: usize) -> impl Strategy<Value = Vec<RawRecord>> {
    prop::collection::vec(model_name(), 0..max).prop_map(move |names| {
        names
            .into_iter()
            .enumerate()
            .map(|(i, name)| RawRecord::new(source, format!("{source}-{i}"), name))
            .collect()
    })
}

// --- Normalization properties ---

proptest! {
    #[test]
    fn normalize_is_idempotent(input in "\\PC{0,40}") {
        let once = normalize(&input);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalize_of_model_names_is_idempotent(input in "[A-Za-z0-9 ._:/()-]{0,40}") {
        let once = normalize(&input);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalize_output_alphabet(input in "\\PC{0,40}") {
        let key = normalize(&input);
        prop_assert!(key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '/'));
        prop_assert!(!key.starts_with(['-', '/']));
        prop_assert!(!key.ends_with(['-', '/']));
    }

    #[test]
    fn core_key_ignores_parenthetical_annotations(
        name in "[A-Za-z][A-Za-z0-9 .-]{0,20}",
        annotation in prop::sample::select(ANNOTATIONS),
    ) {
        let annotated = format!("{name}{annotation}");
        prop_assert_eq!(core_key(&annotated), core_key(&name));
    }
}

// --- Matching properties ---

proptest! {
    #[test]
    fn no_right_record_is_assigned_twice(
        left in records("left", 12),
        right in records("right", 12),
    ) {
        let matcher = Matcher::new(Default::default(), Normalizer::default());
        let left = matcher.prepare(left);
        let right = matcher.prepare(right);
        let outcome = matcher.match_records(&left, &right);

        let rights: BTreeSet<usize> = outcome.pairs.iter().map(|p| p.right_index).collect();
        let lefts: BTreeSet<usize> = outcome.pairs.iter().map(|p| p.left_index).collect();
        prop_assert_eq!(rights.len(), outcome.pairs.len());
        prop_assert_eq!(lefts.len(), outcome.pairs.len());
        prop_assert_eq!(outcome.pairs.len() + outcome.unmatched_left.len(), left.len());
        prop_assert_eq!(outcome.pairs.len() + outcome.unmatched_right.len(), right.len());
    }

    #[test]
    fn merged_rows_cover_every_record(
        left in records("left", 10),
        right in records("right", 10),
    ) {
        let matcher = Matcher::new(Default::default(), Normalizer::default());
        let left_len = matcher.prepare(left.clone()).len();
        let right_len = matcher.prepare(right.clone()).len();
        let rows = matcher.merge_raw(left, right);

        prop_assert_eq!(rows.iter().filter(|r| r.has_left).count(), left_len);
        prop_assert_eq!(rows.iter().filter(|r| r.has_right).count(), right_len);
        prop_assert!(rows.iter().all(|r| r.has_left || r.has_right));
    }

    #[test]
    fn matching_is_deterministic(
        left in records("left", 8),
        right in records("right", 8),
    ) {
        let matcher = Matcher::new(Default::default(), Normalizer::default());
        let left = matcher.prepare(left);
        let right = matcher.prepare(right);
        prop_assert_eq!(
            matcher.match_records(&left, &right),
            matcher.match_records(&left, &right)
        );
    }
}

// --- Series properties ---

proptest! {
    #[test]
    fn slug_alphabet_and_purity(name in "\\PC{0,40}") {
        let slug = make_slug(&name);
        prop_assert_eq!(make_slug(&name), slug.clone());
        prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-'));
        prop_assert!(!slug.starts_with('-'));
        prop_assert!(!slug.ends_with('-'));
        prop_assert!(!slug.contains("--"));
    }

    #[test]
    fn canonical_series_is_pure(name in "[A-Za-z0-9 .()-]{0,30}") {
        prop_assert_eq!(
            canonical_series(&name, &Modality::Llm),
            canonical_series(&name, &Modality::Llm)
        );
    }

    #[test]
    fn series_resolution_is_monotonic(
        queries in prop::collection::vec(
            "[A-Za-z]{2,8}( [0-9](\\.[0-9])?)?( (Pro|Mini|Instruct|Preview))?",
            1..12,
        ),
    ) {
        let config = SeriesConfig {
            query_overrides: Default::default(),
            ..SeriesConfig::default()
        };
        let mut registry = SeriesRegistry::new(&config);
        let mut first: HashMap<String, String> = HashMap::new();

        for query in &queries {
            if let Some(resolution) = registry.resolve(query) {
                let slug = first.entry(query.clone()).or_insert_with(|| resolution.slug.clone());
                prop_assert_eq!(&resolution.slug, &*slug);
            }
        }
        for (query, slug) in &first {
            let again = registry.resolve(query);
            prop_assert_eq!(again.map(|r| r.slug), Some(slug.clone()));
        }
    }
}
